//! Corpus-level chrF.
//!
//! Character n-grams of order 1..=6 with whitespace removed, statistics
//! summed over the corpus, precision and recall averaged over the orders
//! present in both sides, then combined as F-beta with beta = 2.

use std::collections::HashMap;

const CHAR_ORDER: usize = 6;
const BETA: f64 = 2.0;

fn char_ngrams(chars: &[char], n: usize) -> HashMap<&[char], usize> {
    let mut counts = HashMap::new();
    if chars.len() >= n {
        for window in chars.windows(n) {
            *counts.entry(window).or_insert(0) += 1;
        }
    }
    counts
}

/// Per-order (hypothesis n-grams, reference n-grams, matches).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChrfStats {
    pub orders: [(usize, usize, usize); CHAR_ORDER],
}

impl ChrfStats {
    pub fn add_segment(&mut self, hypothesis: &str, reference: &str) {
        let hyp: Vec<char> = hypothesis.chars().filter(|c| !c.is_whitespace()).collect();
        let reference: Vec<char> = reference.chars().filter(|c| !c.is_whitespace()).collect();

        for n in 1..=CHAR_ORDER {
            let hyp_counts = char_ngrams(&hyp, n);
            let ref_counts = char_ngrams(&reference, n);
            let matches: usize = hyp_counts
                .iter()
                .map(|(gram, count)| (*count).min(ref_counts.get(gram).copied().unwrap_or(0)))
                .sum();

            let entry = &mut self.orders[n - 1];
            entry.0 += hyp_counts.values().sum::<usize>();
            entry.1 += ref_counts.values().sum::<usize>();
            entry.2 += matches;
        }
    }

    pub fn score(&self) -> f64 {
        let mut avg_precision = 0.0;
        let mut avg_recall = 0.0;
        let mut effective_order = 0usize;

        for &(n_hyp, n_ref, n_match) in &self.orders {
            if n_hyp > 0 && n_ref > 0 {
                avg_precision += n_match as f64 / n_hyp as f64;
                avg_recall += n_match as f64 / n_ref as f64;
                effective_order += 1;
            }
        }

        if effective_order == 0 {
            return 0.0;
        }
        avg_precision /= effective_order as f64;
        avg_recall /= effective_order as f64;

        if avg_precision + avg_recall == 0.0 {
            return 0.0;
        }
        let factor = BETA * BETA;
        100.0 * (1.0 + factor) * avg_precision * avg_recall / (factor * avg_precision + avg_recall)
    }
}

/// Corpus chrF of `hypotheses` against one reference each.
pub fn corpus_chrf<S: AsRef<str>>(hypotheses: &[S], references: &[S]) -> f64 {
    let mut stats = ChrfStats::default();
    for (hypothesis, reference) in hypotheses.iter().zip(references) {
        stats.add_segment(hypothesis.as_ref(), reference.as_ref());
    }
    stats.score()
}
