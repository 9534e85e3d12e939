//! Confidence-gated language identification.
//!
//! The detector itself is a black box returning `(code, confidence)` per text.
//! `identify` keeps only samples whose confidence reaches the threshold and
//! reports the modal code among them.

use crate::error::{PipelineError, Result};
use serde::Serialize;
use tracing::{debug, info};
use lingua::{Language, LanguageDetectorBuilder};

/// A single detector prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// ISO 639-1 code where one exists, otherwise the detector's own code
    pub code: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

/// Any component that predicts the language of a text.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Detection;
}

/// N-gram detector backed by the `lingua` crate.
///
/// Confidence values are relative to the candidate languages the detector
/// was built with and sum to 1 across them.
pub struct LinguaDetector {
    detector: lingua::LanguageDetector,
}

impl LinguaDetector {
    /// Build a detector over every language lingua ships models for.
    pub fn new() -> Self {
        info!("Initializing lingua language detector (all languages)");
        Self {
            detector: LanguageDetectorBuilder::from_all_languages().build(),
        }
    }

    /// Build a detector restricted to the given ISO 639-1 codes.
    ///
    /// Codes lingua has no model for are skipped. Fails unless at least two
    /// candidate languages remain.
    ///
    /// # Arguments
    /// * `codes` - Two-letter codes, e.g. the profile table plus `en`
    ///
    /// # Returns
    /// * `Result<LinguaDetector>` - The detector, or `InvalidInput`
    pub fn for_codes<S: AsRef<str>>(codes: &[S]) -> Result<Self> {
        let mut languages: Vec<Language> = Language::all()
            .into_iter()
            .filter(|language| {
                let code = language.iso_code_639_1().to_string();
                codes.iter().any(|c| c.as_ref() == code)
            })
            .collect();
        languages.sort_by_key(|language| language.iso_code_639_1().to_string());

        if languages.len() < 2 {
            return Err(PipelineError::InvalidInput(format!(
                "language detector needs at least two supported languages, got {}",
                languages.len()
            )));
        }

        info!("Initializing lingua language detector ({} languages)", languages.len());
        Ok(Self {
            detector: LanguageDetectorBuilder::from_languages(&languages).build(),
        })
    }
}

impl Default for LinguaDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector for LinguaDetector {
    fn detect(&self, text: &str) -> Detection {
        let cleaned = text.replace('\n', " ");
        let best = self
            .detector
            .compute_language_confidence_values(cleaned.trim())
            .into_iter()
            .next();

        match best {
            Some((language, confidence)) if confidence > 0.0 => Detection {
                code: language.iso_code_639_1().to_string(),
                confidence,
            },
            _ => Detection {
                code: "und".to_string(),
                confidence: 0.0,
            },
        }
    }
}

/// Outcome of confidence-gated identification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LidSummary {
    /// Modal code among samples that cleared the threshold
    pub majority_code: String,
    /// Number of samples that cleared the threshold
    pub count_above_threshold: usize,
    /// Mean confidence of the samples that cleared the threshold
    pub mean_confidence: f64,
    /// Surviving sample count per code, in first-encountered order
    pub histogram: Vec<(String, usize)>,
}

impl LidSummary {
    /// Votes recorded for the majority code.
    pub fn majority_votes(&self) -> usize {
        self.histogram
            .iter()
            .find(|(code, _)| *code == self.majority_code)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Identify the dominant language of `texts`.
///
/// A sample survives when its confidence is at least `min_confidence`. The
/// majority code is the most frequent surviving code; ties go to the code
/// encountered first.
pub fn identify<D, S>(detector: &D, texts: &[S], min_confidence: f64) -> Result<LidSummary>
where
    D: LanguageDetector + ?Sized,
    S: AsRef<str>,
{
    let mut histogram: Vec<(String, usize)> = Vec::new();
    let mut confidence_sum = 0.0;
    let mut survivors = 0usize;

    for text in texts {
        let detection = detector.detect(text.as_ref());
        if detection.confidence < min_confidence {
            continue;
        }

        survivors += 1;
        confidence_sum += detection.confidence;
        match histogram.iter_mut().find(|(code, _)| *code == detection.code) {
            Some((_, count)) => *count += 1,
            None => histogram.push((detection.code, 1)),
        }
    }

    // Strictly-greater comparison keeps the first-encountered code on ties
    let mut best: Option<&(String, usize)> = None;
    for entry in &histogram {
        if best.map_or(true, |b| entry.1 > b.1) {
            best = Some(entry);
        }
    }

    let majority_code = match best {
        Some((code, _)) => code.clone(),
        None => {
            return Err(PipelineError::NoConfidentPrediction {
                min_confidence,
                total: texts.len(),
            })
        }
    };

    debug!(
        "LID kept {}/{} samples at threshold {}: {:?}",
        survivors,
        texts.len(),
        min_confidence,
        histogram
    );

    Ok(LidSummary {
        majority_code,
        count_above_threshold: survivors,
        mean_confidence: confidence_sum / survivors as f64,
        histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typology::ProfileRegistry;
    use proptest::prelude::*;
    use std::collections::HashMap;

    /// Detector answering from a fixed table; unknown texts get zero confidence.
    struct TableDetector {
        table: HashMap<String, (String, f64)>,
    }

    impl TableDetector {
        fn new(entries: &[(&str, &str, f64)]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(t, c, p)| (t.to_string(), (c.to_string(), *p)))
                    .collect(),
            }
        }
    }

    impl LanguageDetector for TableDetector {
        fn detect(&self, text: &str) -> Detection {
            let (code, confidence) = self
                .table
                .get(text)
                .cloned()
                .unwrap_or_else(|| ("und".to_string(), 0.0));
            Detection { code, confidence }
        }
    }

    // ==================== identify Tests ====================

    #[test]
    fn test_identify_turkish_scenario() {
        let detector = TableDetector::new(&[
            ("Merhaba dünya", "tr", 0.97),
            ("Bugün hava güzel", "tr", 0.95),
        ]);

        let summary = identify(&detector, &["Merhaba dünya", "Bugün hava güzel"], 0.9)
            .expect("Should identify");

        assert_eq!(summary.majority_code, "tr");
        assert_eq!(summary.count_above_threshold, 2);
        assert!((summary.mean_confidence - 0.96).abs() < 1e-9);
        assert_eq!(summary.histogram, vec![("tr".to_string(), 2)]);
    }

    #[test]
    fn test_identify_filters_low_confidence_samples() {
        let detector = TableDetector::new(&[
            ("a", "fi", 0.95),
            ("b", "et", 0.40),
            ("c", "et", 0.50),
            ("d", "fi", 0.80),
        ]);

        let summary = identify(&detector, &["a", "b", "c", "d"], 0.7).expect("Should identify");

        assert_eq!(summary.majority_code, "fi");
        assert_eq!(summary.count_above_threshold, 2);
        assert!(summary.histogram.iter().all(|(code, _)| code == "fi"));
    }

    #[test]
    fn test_identify_threshold_is_inclusive() {
        let detector = TableDetector::new(&[("a", "vi", 0.7)]);
        let summary = identify(&detector, &["a"], 0.7).expect("Should identify");
        assert_eq!(summary.majority_code, "vi");
    }

    #[test]
    fn test_identify_tie_goes_to_first_encountered() {
        let detector = TableDetector::new(&[
            ("a", "ms", 0.9),
            ("b", "id", 0.9),
            ("c", "id", 0.9),
            ("d", "ms", 0.9),
        ]);

        let summary = identify(&detector, &["a", "b", "c", "d"], 0.5).expect("Should identify");
        assert_eq!(summary.majority_code, "ms");
        assert_eq!(summary.majority_votes(), 2);
    }

    #[test]
    fn test_identify_no_confident_prediction() {
        let detector = TableDetector::new(&[("a", "tr", 0.3)]);
        let result = identify(&detector, &["a", "unknown"], 0.7);

        match result {
            Err(PipelineError::NoConfidentPrediction {
                min_confidence,
                total,
            }) => {
                assert_eq!(min_confidence, 0.7);
                assert_eq!(total, 2);
            }
            other => panic!("Expected NoConfidentPrediction, got {:?}", other),
        }
    }

    #[test]
    fn test_identify_empty_input_is_error() {
        let detector = TableDetector::new(&[]);
        let texts: Vec<String> = Vec::new();
        assert!(identify(&detector, &texts, 0.0).is_err());
    }

    // ==================== lingua Tests ====================

    fn profile_detector() -> LinguaDetector {
        let mut codes: Vec<&str> = ProfileRegistry::get().list_all().iter().map(|p| p.code).collect();
        codes.push("en");
        LinguaDetector::for_codes(&codes).expect("Should build detector")
    }

    #[test]
    fn test_lingua_turkish_scenario() {
        let detector = profile_detector();

        let summary = identify(&detector, &["Merhaba dünya", "Bugün hava güzel"], 0.9)
            .expect("Should identify short Turkish sentences");

        assert_eq!(summary.majority_code, "tr");
        assert_eq!(summary.count_above_threshold, 2);
    }

    #[test]
    fn test_lingua_detects_short_sentences_at_default_threshold() {
        let detector = profile_detector();
        let texts = [
            "Merhaba dünya",
            "Bugün hava güzel",
            "Yarın okula gideceğim",
            "Kitabı masanın üstüne koydum",
        ];

        let summary = identify(&detector, &texts, 0.7).expect("Should identify");

        assert_eq!(summary.majority_code, "tr");
        assert!(summary.majority_votes() >= 2);
    }

    #[test]
    fn test_lingua_detects_spanish_text() {
        let detector = profile_detector();
        let detection = detector.detect(
            "El rápido zorro marrón salta sobre el perro perezoso mientras los niños juegan en el parque.",
        );
        assert_eq!(detection.code, "es");
        assert!(detection.confidence > 0.0 && detection.confidence <= 1.0);
    }

    #[test]
    fn test_lingua_empty_text_has_zero_confidence() {
        let detector = profile_detector();
        let detection = detector.detect("   ");
        assert_eq!(detection.code, "und");
        assert_eq!(detection.confidence, 0.0);
    }

    #[test]
    fn test_for_codes_skips_unsupported_codes() {
        assert!(LinguaDetector::for_codes(&["tr", "xx"]).is_err());
        assert!(LinguaDetector::for_codes(&["tr", "en", "xx"]).is_ok());
    }

    // ==================== Properties ====================

    proptest! {
        #[test]
        fn prop_majority_code_never_leaks_below_threshold(
            samples in proptest::collection::vec((0usize..4, 0.0f64..=1.0), 1..40),
            threshold in 0.0f64..=1.0,
        ) {
            let codes = ["tr", "fi", "zh", "es"];
            let entries: Vec<(String, String, f64)> = samples
                .iter()
                .enumerate()
                .map(|(i, (c, p))| (format!("text-{}", i), codes[*c].to_string(), *p))
                .collect();
            let detector = TableDetector {
                table: entries
                    .iter()
                    .map(|(t, c, p)| (t.clone(), (c.clone(), *p)))
                    .collect(),
            };
            let texts: Vec<String> = entries.iter().map(|(t, _, _)| t.clone()).collect();

            match identify(&detector, &texts, threshold) {
                Ok(summary) => {
                    let confident: Vec<&(String, String, f64)> =
                        entries.iter().filter(|(_, _, p)| *p >= threshold).collect();
                    prop_assert_eq!(summary.count_above_threshold, confident.len());
                    prop_assert!(confident.iter().any(|(_, c, _)| *c == summary.majority_code));
                    prop_assert!(summary.mean_confidence >= threshold - 1e-12);
                }
                Err(_) => {
                    prop_assert!(entries.iter().all(|(_, _, p)| *p < threshold));
                }
            }
        }
    }
}
