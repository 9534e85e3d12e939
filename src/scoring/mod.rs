//! Translation quality scoring.
//!
//! Three corpus-level metrics (BLEU, chrF, COMET) plus one COMET score per
//! sentence. BLEU and chrF are computed in-process and are fully
//! deterministic; COMET is delegated to a [`CometModel`].

mod bleu;
mod chrf;
mod comet;

pub use bleu::{corpus_bleu, tokenize_13a, BleuStats};
pub use chrf::{corpus_chrf, ChrfStats};
pub use comet::{CometModel, CometOutput, HttpCometModel};

use crate::corpus::ParallelSample;
use crate::error::{ensure_same_len, PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Corpus-level quality of one translated batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorpusScores {
    pub bleu: f64,
    pub chrf: f64,
    pub comet: f64,
}

/// Corpus scores together with the aligned per-sentence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchScores {
    pub corpus: CorpusScores,
    pub sentences: Vec<f64>,
}

pub struct QualityScorer<C> {
    comet: C,
    batch_size: usize,
    timeout: Duration,
}

impl<C: CometModel> QualityScorer<C> {
    pub fn new(comet: C, batch_size: usize, timeout: Duration) -> Self {
        Self {
            comet,
            batch_size: batch_size.max(1),
            timeout,
        }
    }

    /// Corpus BLEU, chrF and COMET over the whole batch.
    ///
    /// COMET is a source-aware metric, so sources are required alongside
    /// hypotheses and references.
    pub async fn corpus_score(
        &self,
        sources: &[String],
        hypotheses: &[String],
        references: &[String],
    ) -> Result<CorpusScores> {
        let samples = zip_samples(sources, hypotheses, references)?;
        let output = self.predict(&samples).await?;
        Ok(CorpusScores {
            bleu: corpus_bleu(hypotheses, references),
            chrf: corpus_chrf(hypotheses, references),
            comet: output.system_score,
        })
    }

    /// One COMET score per sentence, aligned index-for-index with the input.
    pub async fn sentence_scores(
        &self,
        sources: &[String],
        hypotheses: &[String],
        references: &[String],
    ) -> Result<Vec<f64>> {
        let samples = zip_samples(sources, hypotheses, references)?;
        let output = self.predict(&samples).await?;
        check_sentence_count(samples.len(), output.scores)
    }

    /// Corpus and sentence scores from a single COMET pass.
    pub async fn score_samples(&self, samples: &[ParallelSample]) -> Result<BatchScores> {
        let output = self.predict(samples).await?;
        let hypotheses: Vec<&str> = samples.iter().map(|s| s.hypothesis.as_str()).collect();
        let references: Vec<&str> = samples.iter().map(|s| s.reference.as_str()).collect();

        let corpus = CorpusScores {
            bleu: corpus_bleu(&hypotheses, &references),
            chrf: corpus_chrf(&hypotheses, &references),
            comet: output.system_score,
        };
        let sentences = check_sentence_count(samples.len(), output.scores)?;

        debug!(
            "Scored {} sentences: BLEU={:.2} chrF={:.2} COMET={:.4}",
            samples.len(),
            corpus.bleu,
            corpus.chrf,
            corpus.comet
        );
        Ok(BatchScores { corpus, sentences })
    }

    async fn predict(&self, samples: &[ParallelSample]) -> Result<CometOutput> {
        match tokio::time::timeout(self.timeout, self.comet.predict(samples, self.batch_size)).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::ScoringTimeout {
                after: self.timeout,
            }),
        }
    }
}

fn zip_samples(
    sources: &[String],
    hypotheses: &[String],
    references: &[String],
) -> Result<Vec<ParallelSample>> {
    ensure_same_len("hypotheses", sources.len(), hypotheses.len())?;
    ensure_same_len("references", sources.len(), references.len())?;

    Ok(sources
        .iter()
        .zip(hypotheses)
        .zip(references)
        .map(|((source, hypothesis), reference)| {
            ParallelSample::new(source.clone(), reference.clone(), hypothesis.clone())
        })
        .collect())
}

fn check_sentence_count(expected: usize, scores: Vec<f64>) -> Result<Vec<f64>> {
    if scores.len() != expected {
        return Err(PipelineError::ScoreLengthMismatch {
            expected,
            actual: scores.len(),
        });
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores each segment by its hypothesis length; the system score is the mean.
    #[derive(Default)]
    struct LengthComet {
        calls: AtomicUsize,
    }

    impl CometModel for LengthComet {
        async fn predict(&self, samples: &[ParallelSample], _batch_size: usize) -> Result<CometOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let scores: Vec<f64> = samples
                .iter()
                .map(|s| s.hypothesis.chars().count() as f64 / 100.0)
                .collect();
            let system_score = if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            };
            Ok(CometOutput {
                scores,
                system_score,
            })
        }
    }

    /// Returns one score fewer than requested.
    struct ShortComet;

    impl CometModel for ShortComet {
        async fn predict(&self, samples: &[ParallelSample], _batch_size: usize) -> Result<CometOutput> {
            Ok(CometOutput {
                scores: vec![0.5; samples.len().saturating_sub(1)],
                system_score: 0.5,
            })
        }
    }

    struct HangingComet;

    impl CometModel for HangingComet {
        async fn predict(&self, _samples: &[ParallelSample], _batch_size: usize) -> Result<CometOutput> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(CometOutput {
                scores: Vec::new(),
                system_score: 0.0,
            })
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn scorer<C: CometModel>(comet: C) -> QualityScorer<C> {
        QualityScorer::new(comet, 16, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_corpus_score_is_reproducible() {
        let scorer = scorer(LengthComet::default());
        let sources = strings(&["The weather is nice today", "Hello world"]);
        let hypotheses = strings(&["Bugün hava güzel", "Merhaba dünya"]);
        let references = strings(&["Bugün hava çok güzel", "Merhaba dünya"]);

        let first = scorer
            .corpus_score(&sources, &hypotheses, &references)
            .await
            .expect("Should score");
        let second = scorer
            .corpus_score(&sources, &hypotheses, &references)
            .await
            .expect("Should score");

        assert_eq!(first.bleu.to_bits(), second.bleu.to_bits());
        assert_eq!(first.chrf.to_bits(), second.chrf.to_bits());
        assert_eq!(first.comet.to_bits(), second.comet.to_bits());
    }

    #[tokio::test]
    async fn test_sentence_scores_are_aligned() {
        let scorer = scorer(LengthComet::default());
        let scores = scorer
            .sentence_scores(
                &strings(&["a", "b", "c"]),
                &strings(&["x", "xxxxx", "xx"]),
                &strings(&["r", "r", "r"]),
            )
            .await
            .expect("Should score");

        assert_eq!(scores, vec![0.01, 0.05, 0.02]);
    }

    #[tokio::test]
    async fn test_sentence_score_count_mismatch_is_error() {
        let scorer = scorer(ShortComet);
        let result = scorer
            .sentence_scores(&strings(&["a", "b"]), &strings(&["x", "y"]), &strings(&["r", "s"]))
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::ScoreLengthMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_input_length_mismatch_is_rejected_before_scoring() {
        let comet = LengthComet::default();
        let scorer = scorer(comet);
        let result = scorer
            .corpus_score(&strings(&["a", "b"]), &strings(&["x"]), &strings(&["r", "s"]))
            .await;

        assert!(matches!(result, Err(PipelineError::InputLengthMismatch { .. })));
        assert_eq!(scorer.comet.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_score_samples_uses_one_comet_pass() {
        let scorer = scorer(LengthComet::default());
        let samples = vec![
            ParallelSample::new("Hello world", "Merhaba dünya", "Merhaba dünya"),
            ParallelSample::new("Good night", "İyi geceler", "İyi geceler"),
        ];

        let scores = scorer.score_samples(&samples).await.expect("Should score");

        assert_eq!(scorer.comet.calls.load(Ordering::SeqCst), 1);
        assert_eq!(scores.sentences.len(), 2);
        assert!((scores.corpus.chrf - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_hanging_model_times_out() {
        let scorer = QualityScorer::new(HangingComet, 8, Duration::from_millis(50));
        let result = scorer
            .sentence_scores(&strings(&["a"]), &strings(&["b"]), &strings(&["c"]))
            .await;

        assert!(matches!(result, Err(PipelineError::ScoringTimeout { .. })));
    }
}
