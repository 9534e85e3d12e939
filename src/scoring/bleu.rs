//! Corpus-level BLEU.
//!
//! 13a tokenisation, n-grams up to 4, brevity penalty over the whole corpus
//! and `exp` smoothing for orders with no matches. Scores are on a 0-100 scale.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

const MAX_ORDER: usize = 4;

struct Tokenizer13a {
    rules: Vec<(Regex, &'static str)>,
}

fn tokenizer() -> &'static Tokenizer13a {
    static TOKENIZER: OnceLock<Tokenizer13a> = OnceLock::new();
    TOKENIZER.get_or_init(|| {
        let rules = [
            // Punctuation and symbols
            (r"([\x7B-\x7E\x5B-\x60\x20-\x26\x28-\x2B\x3A-\x40/])", " ${1} "),
            // Period and comma unless preceded by a digit
            (r"([^0-9])([\.,])", "${1} ${2} "),
            // Period and comma unless followed by a digit
            (r"([\.,])([^0-9])", " ${1} ${2}"),
            // Dash preceded by a digit
            (r"([0-9])(-)", "${1} ${2} "),
        ];
        Tokenizer13a {
            rules: rules
                .into_iter()
                .map(|(pattern, replacement)| {
                    (
                        Regex::new(pattern).expect("13a tokenizer patterns are valid"),
                        replacement,
                    )
                })
                .collect(),
        }
    })
}

/// Split a segment into 13a tokens.
pub fn tokenize_13a(line: &str) -> Vec<String> {
    let mut text = line
        .replace("<skipped>", "")
        .replace("-\n", "")
        .replace('\n', " ");
    if text.contains('&') {
        text = text
            .replace("&quot;", "\"")
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">");
    }

    let mut text = format!(" {} ", text);
    for (regex, replacement) in &tokenizer().rules {
        text = regex.replace_all(&text, *replacement).into_owned();
    }
    text.split_whitespace().map(str::to_string).collect()
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if tokens.len() >= n {
        for window in tokens.windows(n) {
            *counts.entry(window).or_insert(0) += 1;
        }
    }
    counts
}

/// Sufficient statistics accumulated over a corpus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BleuStats {
    pub correct: [usize; MAX_ORDER],
    pub total: [usize; MAX_ORDER],
    pub hyp_len: usize,
    pub ref_len: usize,
}

impl BleuStats {
    pub fn add_segment(&mut self, hypothesis: &str, reference: &str) {
        let hyp = tokenize_13a(hypothesis);
        let reference = tokenize_13a(reference);
        self.hyp_len += hyp.len();
        self.ref_len += reference.len();

        for n in 1..=MAX_ORDER {
            let hyp_counts = ngram_counts(&hyp, n);
            let ref_counts = ngram_counts(&reference, n);
            let matches: usize = hyp_counts
                .iter()
                .map(|(gram, count)| (*count).min(ref_counts.get(gram).copied().unwrap_or(0)))
                .sum();
            self.correct[n - 1] += matches;
            self.total[n - 1] += hyp.len().saturating_sub(n - 1);
        }
    }

    pub fn score(&self) -> f64 {
        if self.correct.iter().all(|c| *c == 0) {
            return 0.0;
        }

        let mut precisions = [0.0f64; MAX_ORDER];
        let mut smooth = 1.0;

        for n in 0..MAX_ORDER {
            if self.total[n] == 0 {
                break;
            }
            if self.correct[n] == 0 {
                smooth *= 2.0;
                precisions[n] = 100.0 / (smooth * self.total[n] as f64);
            } else {
                precisions[n] = 100.0 * self.correct[n] as f64 / self.total[n] as f64;
            }
        }

        if precisions.iter().any(|p| *p <= 0.0) {
            return 0.0;
        }

        let brevity_penalty = if self.hyp_len >= self.ref_len {
            1.0
        } else {
            (1.0 - self.ref_len as f64 / self.hyp_len as f64).exp()
        };

        let log_mean = precisions.iter().map(|p| p.ln()).sum::<f64>() / MAX_ORDER as f64;
        brevity_penalty * log_mean.exp()
    }
}

/// Corpus BLEU of `hypotheses` against one reference each.
pub fn corpus_bleu<S: AsRef<str>>(hypotheses: &[S], references: &[S]) -> f64 {
    let mut stats = BleuStats::default();
    for (hypothesis, reference) in hypotheses.iter().zip(references) {
        stats.add_segment(hypothesis.as_ref(), reference.as_ref());
    }
    stats.score()
}
