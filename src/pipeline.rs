//! End-to-end pipeline context.
//!
//! `Pipeline` owns one lazily-loaded handle per external model. Each handle
//! is initialised at most once through a `tokio::sync::OnceCell`, so
//! concurrent first calls are safe and later calls reuse the same model.
//! Model construction is delegated to a [`ModelProvider`], which lets tests
//! run the whole pipeline against in-memory mocks.

use crate::aggregate::{aggregate, AggregatedResult};
use crate::cache::{CacheKey, TranslationCache};
use crate::classifier::TrainedClassifier;
use crate::config::Config;
use crate::corpus::{self, MysteryCorpus, ParallelSample};
use crate::dataset::LabeledFeatureMatrix;
use crate::error::{PipelineError, Result};
use crate::features;
use crate::lid::{self, LanguageDetector, LidSummary, LinguaDetector};
use crate::metrics::MetricsReport;
use crate::scoring::{CometModel, CorpusScores, HttpCometModel, QualityScorer};
use crate::translation::{HttpTranslationModel, TranslationGateway, TranslationModel};
use crate::typology::{LanguageProfile, ProfileRegistry, ResourceTier, Typology};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Constructs the three external models on first use.
pub trait ModelProvider: Send + Sync {
    type Detector: LanguageDetector;
    type Translator: TranslationModel;
    type Comet: CometModel;

    fn load_detector(&self) -> Result<Self::Detector>;
    fn load_translator(&self) -> Result<Self::Translator>;
    fn load_comet(&self) -> Result<Self::Comet>;
}

/// lingua for identification, HTTP model services for translation and COMET.
pub struct HttpModels {
    client: reqwest::Client,
    config: Config,
}

impl HttpModels {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }
}

impl ModelProvider for HttpModels {
    type Detector = LinguaDetector;
    type Translator = HttpTranslationModel;
    type Comet = HttpCometModel;

    fn load_detector(&self) -> Result<LinguaDetector> {
        if self.config.lid_all_languages {
            return Ok(LinguaDetector::new());
        }
        let mut codes: Vec<&str> = ProfileRegistry::get().list_all().iter().map(|p| p.code).collect();
        codes.push("en");
        LinguaDetector::for_codes(&codes)
    }

    fn load_translator(&self) -> Result<HttpTranslationModel> {
        info!("Using translation service at {}", self.config.translation_api_url);
        Ok(HttpTranslationModel::new(
            self.client.clone(),
            self.config.translation_api_url.clone(),
            self.config.model_api_key.clone(),
            self.config.use_gpu,
        ))
    }

    fn load_comet(&self) -> Result<HttpCometModel> {
        info!("Using COMET service at {}", self.config.comet_api_url);
        Ok(HttpCometModel::new(
            self.client.clone(),
            self.config.comet_api_url.clone(),
            self.config.model_api_key.clone(),
            self.config.use_gpu,
        ))
    }
}

/// MT quality of one known language, one row of the results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRow {
    pub language: String,
    pub pair: String,
    pub typology: Typology,
    pub resource_level: ResourceTier,
    #[serde(rename = "BLEU")]
    pub bleu: f64,
    #[serde(rename = "chrF")]
    pub chrf: f64,
    #[serde(rename = "COMET")]
    pub comet: f64,
    pub n_samples: usize,
}

/// Everything one mystery-corpus run produced.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceReport {
    pub corpus: String,
    pub lid: LidSummary,
    pub pair: String,
    pub n_sentences: usize,
    pub corpus_scores: CorpusScores,
    pub result: AggregatedResult,
    pub generated_at: DateTime<Utc>,
}

pub struct Pipeline<P: ModelProvider> {
    provider: P,
    config: Config,
    detector: OnceCell<P::Detector>,
    gateway: OnceCell<TranslationGateway<P::Translator>>,
    scorer: OnceCell<QualityScorer<P::Comet>>,
}

impl<P: ModelProvider> Pipeline<P> {
    pub fn new(provider: P, config: Config) -> Self {
        Self {
            provider,
            config,
            detector: OnceCell::new(),
            gateway: OnceCell::new(),
            scorer: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn detector(&self) -> Result<&P::Detector> {
        self.detector
            .get_or_try_init(|| async { self.provider.load_detector() })
            .await
    }

    async fn gateway(&self) -> Result<&TranslationGateway<P::Translator>> {
        self.gateway
            .get_or_try_init(|| async {
                let model = self.provider.load_translator()?;
                Ok(TranslationGateway::new(
                    model,
                    TranslationCache::new(&self.config.cache_dir),
                    self.config.translate_batch_size,
                    self.config.translate_timeout,
                ))
            })
            .await
    }

    async fn scorer(&self) -> Result<&QualityScorer<P::Comet>> {
        self.scorer
            .get_or_try_init(|| async {
                let comet = self.provider.load_comet()?;
                Ok(QualityScorer::new(
                    comet,
                    self.config.score_batch_size,
                    self.config.score_timeout,
                ))
            })
            .await
    }

    /// Gateway counters, if the translator has been loaded.
    pub fn gateway_metrics(&self) -> Option<MetricsReport> {
        self.gateway.get().map(|g| g.metrics().report())
    }

    /// Confidence-gated identification with the configured threshold.
    pub async fn identify_language<S: AsRef<str>>(&self, texts: &[S]) -> Result<LidSummary> {
        let detector = self.detector().await?;
        lid::identify(detector, texts, self.config.lid_min_confidence)
    }

    fn training_key(&self, profile: &LanguageProfile) -> CacheKey {
        CacheKey::new(profile.pair, self.config.split.clone(), self.config.max_samples)
    }

    /// Path of the local parallel corpus for a known language.
    pub fn corpus_path(&self, profile: &LanguageProfile) -> PathBuf {
        self.config
            .corpora_dir
            .join(format!("{}_{}.csv", profile.pair, self.config.split))
    }

    /// Translate (or restore) and score one known language.
    pub async fn evaluate_language(&self, profile: &LanguageProfile) -> Result<EvaluationRow> {
        let key = self.training_key(profile);
        let gateway = self.gateway().await?;

        // A cached batch makes the corpus file unnecessary
        let samples = match gateway.cache().load(&key)? {
            Some(samples) => {
                gateway.metrics().record_cache_hit();
                samples
            }
            None => {
                let mut corpus = corpus::load_parallel_corpus(&self.corpus_path(profile))?;
                corpus.truncate(self.config.max_samples);
                gateway
                    .get_or_translate(&key, &corpus.sources, &corpus.references)
                    .await?
            }
        };
        if samples.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }

        let (sources, hypotheses, references) = corpus::columns(&samples);
        let scores = self
            .scorer()
            .await?
            .corpus_score(&sources, &hypotheses, &references)
            .await?;

        info!(
            "{} ({}): BLEU={:.2} chrF={:.2} COMET={:.4} over {} sentences",
            profile.code,
            profile.pair,
            scores.bleu,
            scores.chrf,
            scores.comet,
            samples.len()
        );

        Ok(EvaluationRow {
            language: profile.code.to_string(),
            pair: profile.pair.to_string(),
            typology: profile.typology,
            resource_level: profile.resource_tier,
            bleu: scores.bleu,
            chrf: scores.chrf,
            comet: scores.comet,
            n_samples: samples.len(),
        })
    }

    /// Evaluate every registered language, skipping the ones that fail.
    pub async fn evaluate_all(&self) -> Vec<EvaluationRow> {
        let mut rows = Vec::new();
        for profile in ProfileRegistry::get().list_all() {
            match self.evaluate_language(profile).await {
                Ok(row) => rows.push(row),
                Err(e) => warn!("Skipping {} ({}): {}", profile.code, profile.pair, e),
            }
        }
        rows
    }

    /// Build the labeled feature matrix from the cached training batches.
    ///
    /// Languages whose cache file is missing or unreadable, or whose scoring
    /// fails, are skipped.
    pub async fn build_training_matrix(&self) -> Result<LabeledFeatureMatrix> {
        let cache = TranslationCache::new(&self.config.cache_dir);
        let scorer = self.scorer().await?;
        let mut matrix = LabeledFeatureMatrix::new();

        for profile in ProfileRegistry::get().list_all() {
            let key = self.training_key(profile);
            let samples = match cache.load(&key) {
                Ok(Some(samples)) if !samples.is_empty() => samples,
                Ok(_) => {
                    warn!("No cached translations at {:?}, skipping {}", cache.path_for(&key), profile.code);
                    continue;
                }
                Err(e) => {
                    warn!("Unreadable cache for {}, skipping: {}", profile.code, e);
                    continue;
                }
            };

            let scores = match scorer.score_samples(&samples).await {
                Ok(scores) => scores,
                Err(e) => {
                    warn!("Scoring failed for {}, skipping: {}", profile.code, e);
                    continue;
                }
            };

            matrix.push_language(profile, &samples, &scores.sentences, &scores.corpus)?;
            info!("Added {} rows for {} ({})", samples.len(), profile.code, profile.typology);
        }

        if matrix.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }
        Ok(matrix)
    }

    /// Infer the typology of an unlabeled corpus.
    pub async fn infer_corpus(
        &self,
        corpus: &MysteryCorpus,
        classifier: &TrainedClassifier,
    ) -> Result<InferenceReport> {
        if corpus.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }

        let lid = self.identify_language(&corpus.unknown).await?;
        let pair = ProfileRegistry::get().pair_for(&lid.majority_code);
        info!(
            "Detected '{}' ({}/{} confident samples), translating with {}",
            lid.majority_code,
            lid.count_above_threshold,
            corpus.len(),
            pair
        );

        let key = CacheKey::new(pair.clone(), format!("mystery-{}", corpus.name), corpus.len());
        let samples = self
            .gateway()
            .await?
            .get_or_translate(&key, &corpus.english, &corpus.unknown)
            .await?;

        let (corpus_scores, result) = self.classify_samples(&samples, classifier).await?;
        Ok(InferenceReport {
            corpus: corpus.name.clone(),
            lid,
            pair,
            n_sentences: samples.len(),
            corpus_scores,
            result,
            generated_at: Utc::now(),
        })
    }

    /// Score, featurise, classify and aggregate one translated batch.
    pub async fn classify_samples(
        &self,
        samples: &[ParallelSample],
        classifier: &TrainedClassifier,
    ) -> Result<(CorpusScores, AggregatedResult)> {
        let scores = self.scorer().await?.score_samples(samples).await?;
        let vectors = features::extract_all(samples, &scores.sentences, &scores.corpus);
        let predictions = classifier.predict_all(&vectors);
        let result = aggregate(&predictions)?;

        info!(
            "Majority vote: {} ({} votes); probability average: {} (p={:.3})",
            result.majority_label,
            result.majority_votes(),
            result.probability_label,
            result.confidence
        );
        Ok((scores.corpus, result))
    }
}
