//! Corpus types and CSV loaders.
//!
//! Two on-disk inputs feed the pipeline: parallel corpora for known languages
//! (columns `src`, `ref`) and mystery corpora for an unlabeled language
//! (columns `en`, `unk`). Rows with an empty side are dropped on load.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One aligned (source, reference, hypothesis) triple.
///
/// `source` is English, `reference` is the target-language text and
/// `hypothesis` is the machine translation of `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelSample {
    #[serde(rename = "src")]
    pub source: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "mt")]
    pub hypothesis: String,
}

impl ParallelSample {
    pub fn new(
        source: impl Into<String>,
        reference: impl Into<String>,
        hypothesis: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            reference: reference.into(),
            hypothesis: hypothesis.into(),
        }
    }
}

/// Column-wise views over a batch of samples, in the order the scorers expect.
pub fn columns(samples: &[ParallelSample]) -> (Vec<String>, Vec<String>, Vec<String>) {
    let sources = samples.iter().map(|s| s.source.clone()).collect();
    let references = samples.iter().map(|s| s.reference.clone()).collect();
    let hypotheses = samples.iter().map(|s| s.hypothesis.clone()).collect();
    (sources, hypotheses, references)
}

/// English sources with their human reference translations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelCorpus {
    pub sources: Vec<String>,
    pub references: Vec<String>,
}

impl ParallelCorpus {
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Keep at most `max_samples` leading pairs.
    pub fn truncate(&mut self, max_samples: usize) {
        self.sources.truncate(max_samples);
        self.references.truncate(max_samples);
    }
}

/// A bilingual corpus whose non-English side is in an unknown language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MysteryCorpus {
    /// Short identifier used as the cache split (e.g., the file stem)
    pub name: String,
    pub english: Vec<String>,
    pub unknown: Vec<String>,
}

impl MysteryCorpus {
    pub fn len(&self) -> usize {
        self.english.len()
    }

    pub fn is_empty(&self) -> bool {
        self.english.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ParallelRow {
    src: Option<String>,
    #[serde(rename = "ref")]
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MysteryRow {
    en: Option<String>,
    unk: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Load a parallel corpus CSV with `src` and `ref` columns.
pub fn load_parallel_corpus(path: &Path) -> Result<ParallelCorpus> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut corpus = ParallelCorpus::default();
    let mut dropped = 0usize;

    for row in reader.deserialize::<ParallelRow>() {
        let row = row?;
        match (non_empty(row.src), non_empty(row.reference)) {
            (Some(src), Some(reference)) => {
                corpus.sources.push(src);
                corpus.references.push(reference);
            }
            _ => dropped += 1,
        }
    }

    debug!(
        "Loaded {} parallel pairs from {:?} ({} dropped)",
        corpus.len(),
        path,
        dropped
    );
    Ok(corpus)
}

/// Load a mystery corpus CSV with `en` and `unk` columns.
///
/// The corpus name is the file stem.
pub fn load_mystery_corpus(path: &Path) -> Result<MysteryCorpus> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| PipelineError::InvalidInput(format!("bad corpus path {:?}", path)))?
        .to_string();

    let mut reader = csv::Reader::from_path(path)?;
    let mut corpus = MysteryCorpus {
        name,
        ..Default::default()
    };

    for row in reader.deserialize::<MysteryRow>() {
        let row = row?;
        if let (Some(en), Some(unk)) = (non_empty(row.en), non_empty(row.unk)) {
            corpus.english.push(en);
            corpus.unknown.push(unk);
        }
    }

    if corpus.is_empty() {
        return Err(PipelineError::EmptyCorpus);
    }
    Ok(corpus)
}
