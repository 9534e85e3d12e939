//! Per-sentence feature extraction.
//!
//! Maps one (source, reference, hypothesis) triple plus its quality scores to
//! a fixed 18-dimension vector. The corpus-level scores are copied into every
//! sentence of the same corpus.

use crate::corpus::ParallelSample;
use crate::scoring::CorpusScores;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const NUM_FEATURES: usize = 18;

/// Feature names in vector order. A trained classifier is only valid for
/// vectors laid out in exactly this order.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "src_len_tokens",
    "ref_len_tokens",
    "mt_len_tokens",
    "src_len_chars",
    "ref_len_chars",
    "mt_len_chars",
    "len_ratio_mt_src",
    "len_ratio_ref_src",
    "src_chars_per_token",
    "ref_chars_per_token",
    "mt_chars_per_token",
    "src_ttr",
    "ref_ttr",
    "mt_ttr",
    "comet_sentence",
    "bleu_corpus",
    "chrf_corpus",
    "comet_corpus",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: [f64; NUM_FEATURES],
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Look up a single feature by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }

    pub fn from_slice(values: &[f64]) -> Option<FeatureVector> {
        let values: [f64; NUM_FEATURES] = values.try_into().ok()?;
        Some(FeatureVector { values })
    }
}

/// Surface statistics of a single text.
struct TextStats {
    tokens: usize,
    chars: usize,
    ttr: f64,
}

impl TextStats {
    fn of(text: &str) -> Self {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let unique: HashSet<&str> = tokens.iter().copied().collect();
        Self {
            tokens: tokens.len(),
            chars: text.chars().count(),
            ttr: ratio(unique.len(), tokens.len()),
        }
    }

    fn chars_per_token(&self) -> f64 {
        ratio(self.chars, self.tokens)
    }
}

/// `numerator / denominator`, or 0.0 when the denominator is zero.
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Build the feature vector for one sentence.
pub fn extract(sample: &ParallelSample, sentence_score: f64, corpus: &CorpusScores) -> FeatureVector {
    let src = TextStats::of(&sample.source);
    let reference = TextStats::of(&sample.reference);
    let mt = TextStats::of(&sample.hypothesis);

    FeatureVector {
        values: [
            src.tokens as f64,
            reference.tokens as f64,
            mt.tokens as f64,
            src.chars as f64,
            reference.chars as f64,
            mt.chars as f64,
            ratio(mt.tokens, src.tokens),
            ratio(reference.tokens, src.tokens),
            src.chars_per_token(),
            reference.chars_per_token(),
            mt.chars_per_token(),
            src.ttr,
            reference.ttr,
            mt.ttr,
            sentence_score,
            corpus.bleu,
            corpus.chrf,
            corpus.comet,
        ],
    }
}

/// Extract features for every sentence of a corpus.
///
/// `sentence_scores` must be aligned with `samples`; extra scores on either
/// side are ignored by the zip, so callers validate lengths first.
pub fn extract_all(
    samples: &[ParallelSample],
    sentence_scores: &[f64],
    corpus: &CorpusScores,
) -> Vec<FeatureVector> {
    samples
        .iter()
        .zip(sentence_scores)
        .map(|(sample, score)| extract(sample, *score, corpus))
        .collect()
}
