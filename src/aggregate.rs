//! Corpus-level fusion of per-sentence predictions.
//!
//! Two strategies run side by side and are both reported: majority vote over
//! the argmax labels, and argmax of the mean probability vector. They may
//! disagree; that is a legitimate outcome and is not reconciled here.

use crate::classifier::{argmax, SentencePrediction};
use crate::error::{PipelineError, Result};
use crate::typology::{Typology, NUM_CLASSES};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedResult {
    pub majority_label: Typology,
    /// Votes per class, canonical order
    pub votes: [usize; NUM_CLASSES],
    pub probability_label: Typology,
    /// Mean probability of `probability_label`
    pub confidence: f64,
    /// Mean probability per class, canonical order
    pub mean_probabilities: [f64; NUM_CLASSES],
}

impl AggregatedResult {
    pub fn majority_votes(&self) -> usize {
        self.votes[self.majority_label.index()]
    }

    /// Whether the two strategies picked the same label.
    pub fn strategies_agree(&self) -> bool {
        self.majority_label == self.probability_label
    }
}

/// Fuse the predictions of one corpus. Ties in either strategy go to the
/// earliest class in canonical order.
pub fn aggregate(predictions: &[SentencePrediction]) -> Result<AggregatedResult> {
    if predictions.is_empty() {
        return Err(PipelineError::EmptyCorpus);
    }

    let mut votes = [0usize; NUM_CLASSES];
    let mut sums = [0.0; NUM_CLASSES];
    for prediction in predictions {
        votes[prediction.label.index()] += 1;
        for (sum, p) in sums.iter_mut().zip(prediction.probabilities.iter()) {
            *sum += p;
        }
    }

    let mut majority = 0;
    for k in 1..NUM_CLASSES {
        if votes[k] > votes[majority] {
            majority = k;
        }
    }

    let n = predictions.len() as f64;
    let mean_probabilities = sums.map(|s| s / n);
    let best = argmax(&mean_probabilities);

    Ok(AggregatedResult {
        majority_label: Typology::CANONICAL[majority],
        votes,
        probability_label: Typology::CANONICAL[best],
        confidence: mean_probabilities[best],
        mean_probabilities,
    })
}
