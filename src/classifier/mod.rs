//! Typology classifier: standardisation + multinomial logistic regression.
//!
//! `fit` learns from a [`LabeledFeatureMatrix`]; the resulting
//! [`TrainedClassifier`] is saved as JSON and is read-only afterwards. The
//! artifact records the feature names and class order it was trained with and
//! refuses to load if either differs from this build.

mod logistic;
mod report;
mod scaler;
mod split;

pub use logistic::{argmax, FitOptions, LogisticRegression};
pub use report::{ClassMetrics, ClassificationReport};
pub use scaler::StandardScaler;
pub use split::{stratified_split, Split};

use crate::dataset::LabeledFeatureMatrix;
use crate::error::{ensure_same_len, PipelineError, Result};
use crate::features::{FeatureVector, FEATURE_NAMES};
use crate::typology::{Typology, NUM_CLASSES};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Classifier output for one sentence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentencePrediction {
    pub label: Typology,
    /// Canonical class order, sums to 1
    pub probabilities: [f64; NUM_CLASSES],
}

impl SentencePrediction {
    /// Build a prediction whose label is the argmax of `probabilities`.
    pub fn from_probabilities(probabilities: [f64; NUM_CLASSES]) -> SentencePrediction {
        let label = Typology::CANONICAL[argmax(&probabilities)];
        SentencePrediction {
            label,
            probabilities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedClassifier {
    pub feature_names: Vec<String>,
    pub classes: Vec<Typology>,
    pub scaler: StandardScaler,
    pub model: LogisticRegression,
    pub trained_at: DateTime<Utc>,
    pub n_train: usize,
}

impl TrainedClassifier {
    /// Fit on every row given.
    pub fn fit(features: &[FeatureVector], labels: &[Typology], options: FitOptions) -> Result<TrainedClassifier> {
        ensure_same_len("labels", features.len(), labels.len())?;
        let scaler = StandardScaler::fit(features)?;

        let x: Vec<_> = features.iter().map(|f| scaler.transform(f)).collect();
        let y: Vec<usize> = labels.iter().map(|l| l.index()).collect();
        let model = LogisticRegression::fit(&x, &y, options);

        Ok(TrainedClassifier {
            feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            classes: Typology::CANONICAL.to_vec(),
            scaler,
            model,
            trained_at: Utc::now(),
            n_train: features.len(),
        })
    }

    pub fn predict(&self, features: &FeatureVector) -> SentencePrediction {
        let scaled = self.scaler.transform(features);
        SentencePrediction::from_probabilities(self.model.predict_proba(&scaled))
    }

    pub fn predict_all(&self, features: &[FeatureVector]) -> Vec<SentencePrediction> {
        features.iter().map(|f| self.predict(f)).collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Saved classifier to {:?}", path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<TrainedClassifier> {
        let contents = fs::read_to_string(path)
            .map_err(|e| PipelineError::ModelLoad(format!("{:?}: {}", path, e)))?;
        let classifier: TrainedClassifier = serde_json::from_str(&contents)
            .map_err(|e| PipelineError::ModelLoad(format!("{:?}: {}", path, e)))?;
        classifier.validate()?;
        Ok(classifier)
    }

    /// Reject artifacts trained on a different feature layout or class order.
    pub fn validate(&self) -> Result<()> {
        if self.feature_names.len() != FEATURE_NAMES.len()
            || self.feature_names.iter().zip(FEATURE_NAMES.iter()).any(|(a, b)| a != b)
        {
            return Err(PipelineError::FeatureSchemaMismatch(format!(
                "artifact features {:?} do not match {:?}",
                self.feature_names, FEATURE_NAMES
            )));
        }
        if self.classes != Typology::CANONICAL {
            return Err(PipelineError::FeatureSchemaMismatch(format!(
                "artifact classes {:?} do not match {:?}",
                self.classes,
                Typology::CANONICAL
            )));
        }
        Ok(())
    }
}

/// Knobs for a train-and-evaluate run.
#[derive(Debug, Clone, Copy)]
pub struct TrainOptions {
    pub test_size: f64,
    pub seed: u64,
    pub fit: FitOptions,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            test_size: 0.1,
            seed: 42,
            fit: FitOptions::default(),
        }
    }
}

pub struct TrainingRun {
    pub classifier: TrainedClassifier,
    pub report: ClassificationReport,
    pub n_train: usize,
    pub n_test: usize,
}

/// Stratified split, fit on the training part, evaluate on the held-out part.
pub fn fit(matrix: &LabeledFeatureMatrix, options: TrainOptions) -> Result<TrainingRun> {
    if matrix.is_empty() {
        return Err(PipelineError::EmptyTrainingSet);
    }

    let features = matrix.features();
    let labels = matrix.labels();
    let split = stratified_split(&labels, options.test_size, options.seed);

    let pick = |indices: &[usize]| -> (Vec<FeatureVector>, Vec<Typology>) {
        indices.iter().map(|&i| (features[i], labels[i])).unzip()
    };
    let (train_x, train_y) = pick(&split.train);
    let (test_x, test_y) = pick(&split.test);

    info!(
        "Training on {} rows, evaluating on {} (class counts {:?})",
        train_x.len(),
        test_x.len(),
        matrix.class_counts()
    );

    let classifier = TrainedClassifier::fit(&train_x, &train_y, options.fit)?;
    let predicted: Vec<Typology> = classifier.predict_all(&test_x).iter().map(|p| p.label).collect();
    let report = ClassificationReport::evaluate(&test_y, &predicted);

    Ok(TrainingRun {
        n_train: train_x.len(),
        n_test: test_x.len(),
        classifier,
        report,
    })
}
