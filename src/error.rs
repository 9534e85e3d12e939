//! Error taxonomy for the inference and training pipeline.
//!
//! Every failure a corpus run can hit is a variant here. Nothing in the
//! library retries; errors propagate to the top-level corpus call and the
//! caller decides whether to skip the corpus.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Language identification kept zero samples after the confidence filter.
    #[error("no language prediction reached confidence {min_confidence} ({total} samples checked)")]
    NoConfidentPrediction { min_confidence: f64, total: usize },

    /// The quality model returned a different number of segment scores than submitted.
    #[error("scorer returned {actual} sentence scores for {expected} sentences")]
    ScoreLengthMismatch { expected: usize, actual: usize },

    /// No translation model backs the requested pair.
    #[error("unsupported language pair: '{0}'")]
    UnsupportedLanguagePair(String),

    #[error("translation for {pair} timed out after {after:?}")]
    TranslationTimeout { pair: String, after: Duration },

    #[error("quality scoring timed out after {after:?}")]
    ScoringTimeout { after: Duration },

    /// The translation model returned a batch of a different size than submitted.
    #[error("translation model returned {actual} hypotheses for {expected} sources")]
    TranslationLengthMismatch { expected: usize, actual: usize },

    /// Parallel inputs handed to a component disagree in length.
    #[error("{what}: expected {expected} items, got {actual}")]
    InputLengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A classifier artifact was trained on a different feature layout.
    #[error("classifier feature schema mismatch: {0}")]
    FeatureSchemaMismatch(String),

    #[error("unknown typology label: '{0}'")]
    UnknownTypology(String),

    #[error("corpus contains no usable sentence pairs")]
    EmptyCorpus,

    #[error("training matrix is empty")]
    EmptyTrainingSet,

    /// A model service answered with a non-success status.
    #[error("{service} service error ({status}): {body}")]
    ModelService {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("malformed cache file {path:?}: {reason}")]
    CacheFormat { path: PathBuf, reason: String },

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// Check that two parallel inputs have the same length.
pub(crate) fn ensure_same_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(PipelineError::InputLengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
