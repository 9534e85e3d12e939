//! Labeled feature matrix for classifier training.
//!
//! One row per sentence of every known language, carrying the language's
//! ground-truth typology. Rows are only ever added from a `LanguageProfile`,
//! so an unlabeled corpus cannot end up in the matrix.

use crate::corpus::ParallelSample;
use crate::error::{ensure_same_len, PipelineError, Result};
use crate::features::{self, FeatureVector, FEATURE_NAMES, NUM_FEATURES};
use crate::scoring::CorpusScores;
use crate::typology::{LanguageProfile, Typology, NUM_CLASSES};
use csv::StringRecord;
use std::fs;
use std::path::Path;
use tracing::info;

const META_COLUMNS: [&str; 6] = ["lang", "pair", "typology", "src", "ref", "mt"];

/// One sentence of a known language with its label and features.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRow {
    pub lang: String,
    pub pair: String,
    pub typology: Typology,
    pub sample: ParallelSample,
    pub features: FeatureVector,
}

/// Training rows built from the profile table only; unlabeled corpora never
/// enter it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledFeatureMatrix {
    rows: Vec<LabeledRow>,
}

impl LabeledFeatureMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[LabeledRow] {
        &self.rows
    }

    /// Append every sentence of one known language.
    pub fn push_language(
        &mut self,
        profile: &LanguageProfile,
        samples: &[ParallelSample],
        sentence_scores: &[f64],
        corpus: &CorpusScores,
    ) -> Result<()> {
        ensure_same_len("sentence scores", samples.len(), sentence_scores.len())?;

        let vectors = features::extract_all(samples, sentence_scores, corpus);
        for (sample, features) in samples.iter().zip(vectors) {
            self.rows.push(LabeledRow {
                lang: profile.code.to_string(),
                pair: profile.pair.to_string(),
                typology: profile.typology,
                sample: sample.clone(),
                features,
            });
        }
        Ok(())
    }

    /// Feature vectors in row order.
    pub fn features(&self) -> Vec<FeatureVector> {
        self.rows.iter().map(|r| r.features).collect()
    }

    /// Labels in row order.
    pub fn labels(&self) -> Vec<Typology> {
        self.rows.iter().map(|r| r.typology).collect()
    }

    /// Row count per class, in canonical order.
    /// Row count per class, in canonical class order.
    pub fn class_counts(&self) -> [usize; NUM_CLASSES] {
        let mut counts = [0; NUM_CLASSES];
        for row in &self.rows {
            counts[row.typology.index()] += 1;
        }
        counts
    }

    /// Write the matrix as CSV: metadata columns followed by the features.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(META_COLUMNS.iter().chain(FEATURE_NAMES.iter()))?;

        for row in &self.rows {
            let mut record = vec![
                row.lang.clone(),
                row.pair.clone(),
                row.typology.to_string(),
                row.sample.source.clone(),
                row.sample.reference.clone(),
                row.sample.hypothesis.clone(),
            ];
            record.extend(row.features.values.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;

        info!("Saved {} labeled rows to {:?}", self.rows.len(), path);
        Ok(())
    }

    /// Read a matrix previously written by [`write_csv`](Self::write_csv).
    ///
    /// Columns are located by name, so extra columns are ignored, but every
    /// feature column must be present.
    pub fn read_csv(path: &Path) -> Result<LabeledFeatureMatrix> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();

        let column = |name: &str| {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                PipelineError::FeatureSchemaMismatch(format!("missing column '{}' in {:?}", name, path))
            })
        };

        let meta: Vec<usize> = META_COLUMNS.iter().map(|c| column(*c)).collect::<Result<_>>()?;
        let feature_columns: Vec<usize> = FEATURE_NAMES.iter().map(|c| column(*c)).collect::<Result<_>>()?;

        let mut matrix = LabeledFeatureMatrix::new();
        for record in reader.records() {
            let record = record?;
            matrix.rows.push(parse_row(&record, &meta, &feature_columns)?);
        }
        Ok(matrix)
    }
}

fn parse_row(record: &StringRecord, meta: &[usize], feature_columns: &[usize]) -> Result<LabeledRow> {
    let field = |index: usize| record.get(index).unwrap_or("").to_string();

    let mut values = [0.0; NUM_FEATURES];
    for (slot, &index) in values.iter_mut().zip(feature_columns) {
        let raw = field(index);
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| PipelineError::InvalidInput(format!("non-numeric feature value '{}'", raw)))?;
    }

    Ok(LabeledRow {
        lang: field(meta[0]),
        pair: field(meta[1]),
        typology: field(meta[2]).parse()?,
        sample: ParallelSample::new(field(meta[3]), field(meta[4]), field(meta[5])),
        features: FeatureVector { values },
    })
}
