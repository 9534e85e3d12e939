use crate::cache::{CacheKey, TranslationCache};
use crate::corpus::ParallelSample;
use crate::error::{ensure_same_len, PipelineError, Result};
use crate::metrics::GatewayMetrics;
use crate::typology::ProfileRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Canonical source language of every corpus
pub const SOURCE_LANGUAGE: &str = "en";

/// Direction-normalised language pair: English into `target`.
///
/// Pair ids are written either way round in the profile table (`en-tr`,
/// `de-en`); translation always runs from English.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    /// Pair id as written in configuration and cache file names
    pub id: String,
    pub target: String,
}

impl LanguagePair {
    pub fn parse(id: &str) -> Result<LanguagePair> {
        let (left, right) = id
            .split_once('-')
            .ok_or_else(|| PipelineError::UnsupportedLanguagePair(id.to_string()))?;

        let target = match (left, right) {
            (SOURCE_LANGUAGE, other) | (other, SOURCE_LANGUAGE)
                if !other.is_empty() && other != SOURCE_LANGUAGE =>
            {
                other
            }
            _ => return Err(PipelineError::UnsupportedLanguagePair(id.to_string())),
        };

        Ok(LanguagePair {
            id: id.to_string(),
            target: target.to_string(),
        })
    }

    /// Model lookup key, always `en-{target}`.
    pub fn model_key(&self) -> String {
        format!("{}-{}", SOURCE_LANGUAGE, self.target)
    }
}

/// Machine translation black box.
///
/// Must return exactly one hypothesis per input, in input order, and fail with
/// `UnsupportedLanguagePair` when no model backs the pair.
pub trait TranslationModel: Send + Sync {
    fn translate(
        &self,
        pair: &LanguagePair,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<String>>> + Send;
}

// ==================== HTTP model service ====================

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    model: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
    texts: &'a [String],
    max_length: u32,
    device: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<String>,
}

/// Default model for every registered pair plus the held-out mystery pairs.
pub fn default_model_table() -> HashMap<String, String> {
    let mut targets: Vec<&str> = ProfileRegistry::get()
        .list_all()
        .iter()
        .map(|p| p.code)
        .collect();
    targets.extend(["kk", "ha", "cs"]);

    targets
        .into_iter()
        .map(|code| {
            let key = format!("{}-{}", SOURCE_LANGUAGE, code);
            let model = format!("Helsinki-NLP/opus-mt-{}", key);
            (key, model)
        })
        .collect()
}

/// Client for a seq2seq model server exposing `POST {api_url}` batch translation.
pub struct HttpTranslationModel {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    device: String,
    models: HashMap<String, String>,
}

impl HttpTranslationModel {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: Option<String>,
        use_gpu: bool,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key,
            device: if use_gpu { "cuda" } else { "cpu" }.to_string(),
            models: default_model_table(),
        }
    }

    /// Replace the pair-to-model table.
    pub fn with_models(mut self, models: HashMap<String, String>) -> Self {
        self.models = models;
        self
    }

    pub fn model_for(&self, pair: &LanguagePair) -> Result<&str> {
        self.models
            .get(&pair.model_key())
            .map(String::as_str)
            .ok_or_else(|| PipelineError::UnsupportedLanguagePair(pair.id.clone()))
    }
}

impl TranslationModel for HttpTranslationModel {
    async fn translate(&self, pair: &LanguagePair, texts: &[String]) -> Result<Vec<String>> {
        let model = self.model_for(pair)?;
        let request = TranslateRequest {
            model,
            source_lang: SOURCE_LANGUAGE,
            target_lang: &pair.target,
            texts,
            max_length: 128,
            device: &self.device,
        };

        let mut builder = self.client.post(&self.api_url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let response = builder.send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PipelineError::UnsupportedLanguagePair(pair.id.clone()));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(PipelineError::ModelService {
                service: "translation",
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranslateResponse = response.json().await?;
        Ok(parsed.translations)
    }
}

// ==================== Cached gateway ====================

/// Translation with a durable per-batch cache in front of the model.
pub struct TranslationGateway<M> {
    model: M,
    cache: TranslationCache,
    batch_size: usize,
    timeout: Duration,
    metrics: GatewayMetrics,
}

impl<M: TranslationModel> TranslationGateway<M> {
    pub fn new(model: M, cache: TranslationCache, batch_size: usize, timeout: Duration) -> Self {
        Self {
            model,
            cache,
            batch_size: batch_size.max(1),
            timeout,
            metrics: GatewayMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Return the cached batch for `key`, or translate `sources`, cache the
    /// complete batch and return it.
    ///
    /// An existing cache file is authoritative: its rows are returned as-is
    /// even if `sources` differ. Nothing is cached when translation fails.
    pub async fn get_or_translate(
        &self,
        key: &CacheKey,
        sources: &[String],
        references: &[String],
    ) -> Result<Vec<ParallelSample>> {
        ensure_same_len("references", sources.len(), references.len())?;

        if let Some(samples) = self.cache.load(key)? {
            self.metrics.record_cache_hit();
            if samples.len() != sources.len() {
                debug!(
                    "Cache for {} holds {} rows, caller passed {}; using cache",
                    key.file_name(),
                    samples.len(),
                    sources.len()
                );
            }
            return Ok(samples);
        }

        self.metrics.record_cache_miss();
        info!("Cache miss for {}; translating {} sentences", key.file_name(), sources.len());

        let pair = LanguagePair::parse(&key.pair)?;
        let hypotheses = self.translate_all(&pair, sources).await?;

        let samples: Vec<ParallelSample> = sources
            .iter()
            .zip(references)
            .zip(hypotheses)
            .map(|((source, reference), hypothesis)| {
                ParallelSample::new(source.clone(), reference.clone(), hypothesis)
            })
            .collect();

        self.cache.store(key, &samples).await?;
        self.metrics.record_cache_write();
        Ok(samples)
    }

    /// Translate a full batch in fixed-size sub-batches, one call in flight at a time.
    pub async fn translate_all(&self, pair: &LanguagePair, sources: &[String]) -> Result<Vec<String>> {
        self.metrics.record_translation();
        let mut hypotheses = Vec::with_capacity(sources.len());

        for (i, chunk) in sources.chunks(self.batch_size).enumerate() {
            self.metrics.record_model_call();
            debug!("Translating {} batch {} ({} sentences)", pair.id, i + 1, chunk.len());

            let output = match tokio::time::timeout(self.timeout, self.model.translate(pair, chunk)).await {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    self.metrics.record_model_failure();
                    warn!("Translation batch {} for {} failed: {}", i + 1, pair.id, e);
                    return Err(e);
                }
                Err(_) => {
                    self.metrics.record_model_failure();
                    return Err(PipelineError::TranslationTimeout {
                        pair: pair.id.clone(),
                        after: self.timeout,
                    });
                }
            };

            if output.len() != chunk.len() {
                self.metrics.record_model_failure();
                return Err(PipelineError::TranslationLengthMismatch {
                    expected: chunk.len(),
                    actual: output.len(),
                });
            }
            hypotheses.extend(output);
        }

        Ok(hypotheses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    /// Uppercases its input and counts calls.
    #[derive(Default)]
    struct UppercaseModel {
        calls: AtomicUsize,
    }

    impl TranslationModel for UppercaseModel {
        async fn translate(&self, _pair: &LanguagePair, texts: &[String]) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| t.to_uppercase()).collect())
        }
    }

    struct DroppingModel;

    impl TranslationModel for DroppingModel {
        async fn translate(&self, _pair: &LanguagePair, texts: &[String]) -> Result<Vec<String>> {
            Ok(texts.iter().skip(1).cloned().collect())
        }
    }

    struct SlowModel;

    impl TranslationModel for SlowModel {
        async fn translate(&self, _pair: &LanguagePair, texts: &[String]) -> Result<Vec<String>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(texts.to_vec())
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn gateway<M: TranslationModel>(model: M, dir: &TempDir, batch_size: usize) -> TranslationGateway<M> {
        TranslationGateway::new(
            model,
            TranslationCache::new(dir.path()),
            batch_size,
            Duration::from_secs(5),
        )
    }

    // ==================== LanguagePair Tests ====================

    #[test]
    fn test_language_pair_english_first() {
        let pair = LanguagePair::parse("en-tr").expect("Should parse");
        assert_eq!(pair.target, "tr");
        assert_eq!(pair.model_key(), "en-tr");
    }

    #[test]
    fn test_language_pair_english_second() {
        let pair = LanguagePair::parse("de-en").expect("Should parse");
        assert_eq!(pair.id, "de-en");
        assert_eq!(pair.target, "de");
        assert_eq!(pair.model_key(), "en-de");
    }

    #[test]
    fn test_language_pair_invalid() {
        assert!(LanguagePair::parse("fr-de").is_err());
        assert!(LanguagePair::parse("en").is_err());
        assert!(LanguagePair::parse("en-en").is_err());
        assert!(LanguagePair::parse("en-").is_err());
    }

    #[test]
    fn test_default_model_table_covers_registry() {
        let table = default_model_table();
        for profile in ProfileRegistry::get().list_all() {
            let pair = LanguagePair::parse(profile.pair).expect("registry pairs parse");
            assert!(table.contains_key(&pair.model_key()), "{}", profile.pair);
        }
        assert_eq!(table.get("en-kk").map(String::as_str), Some("Helsinki-NLP/opus-mt-en-kk"));
    }

    // ==================== Gateway Tests ====================

    #[tokio::test]
    async fn test_cache_miss_translates_once_and_writes_once() {
        let dir = TempDir::new().expect("temp dir");
        let gateway = gateway(UppercaseModel::default(), &dir, 16);
        let key = CacheKey::new("en-tr", "train", 3);

        let samples = gateway
            .get_or_translate(&key, &strings(&["a", "b", "c"]), &strings(&["x", "y", "z"]))
            .await
            .expect("Should translate");

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1], ParallelSample::new("b", "y", "B"));
        assert_eq!(gateway.metrics().translations(), 1);
        assert_eq!(gateway.metrics().model_calls(), 1);
        assert_eq!(gateway.metrics().cache_writes(), 1);
        assert!(gateway.cache().path_for(&key).exists());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_model() {
        let dir = TempDir::new().expect("temp dir");
        let gateway = gateway(UppercaseModel::default(), &dir, 16);
        let key = CacheKey::new("en-fi", "train", 2);
        let sources = strings(&["hello", "bye"]);
        let references = strings(&["hei", "moi"]);

        let first = gateway
            .get_or_translate(&key, &sources, &references)
            .await
            .expect("Should translate");
        let second = gateway
            .get_or_translate(&key, &sources, &references)
            .await
            .expect("Should hit cache");

        assert_eq!(first, second);
        assert_eq!(gateway.model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.metrics().cache_hits(), 1);
        assert_eq!(gateway.metrics().cache_misses(), 1);
        assert_eq!(gateway.metrics().cache_writes(), 1);
    }

    #[tokio::test]
    async fn test_sub_batches_preserve_order() {
        let dir = TempDir::new().expect("temp dir");
        let gateway = gateway(UppercaseModel::default(), &dir, 2);
        let pair = LanguagePair::parse("en-es").expect("parse");

        let output = gateway
            .translate_all(&pair, &strings(&["a", "b", "c", "d", "e"]))
            .await
            .expect("Should translate");

        assert_eq!(output, strings(&["A", "B", "C", "D", "E"]));
        assert_eq!(gateway.metrics().model_calls(), 3);
        assert_eq!(gateway.metrics().translations(), 1);
    }

    #[tokio::test]
    async fn test_length_mismatch_is_not_cached() {
        let dir = TempDir::new().expect("temp dir");
        let gateway = gateway(DroppingModel, &dir, 16);
        let key = CacheKey::new("en-ru", "train", 2);

        let result = gateway
            .get_or_translate(&key, &strings(&["a", "b"]), &strings(&["x", "y"]))
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::TranslationLengthMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert!(!gateway.cache().path_for(&key).exists());
        assert_eq!(gateway.metrics().cache_writes(), 0);
    }

    #[tokio::test]
    async fn test_timeout_surfaces_translation_timeout() {
        let dir = TempDir::new().expect("temp dir");
        let gateway = TranslationGateway::new(
            SlowModel,
            TranslationCache::new(dir.path()),
            8,
            Duration::from_millis(50),
        );
        let key = CacheKey::new("en-vi", "train", 1);

        let result = gateway
            .get_or_translate(&key, &strings(&["a"]), &strings(&["x"]))
            .await;

        assert!(matches!(result, Err(PipelineError::TranslationTimeout { .. })));
        assert!(!gateway.cache().path_for(&key).exists());
        assert_eq!(gateway.metrics().model_failures(), 1);
    }

    #[tokio::test]
    async fn test_reference_length_mismatch_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let gateway = gateway(UppercaseModel::default(), &dir, 16);

        let result = gateway
            .get_or_translate(
                &CacheKey::new("en-tr", "train", 2),
                &strings(&["a", "b"]),
                &strings(&["x"]),
            )
            .await;

        assert!(matches!(result, Err(PipelineError::InputLengthMismatch { .. })));
        assert_eq!(gateway.model.calls.load(Ordering::SeqCst), 0);
    }

    // ==================== HTTP Model Tests ====================

    fn http_model(url: &str) -> HttpTranslationModel {
        HttpTranslationModel::new(
            reqwest::Client::new(),
            format!("{}/translate", url),
            Some("test-key".to_string()),
            false,
        )
    }

    #[tokio::test]
    async fn test_http_translate_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "Helsinki-NLP/opus-mt-en-tr",
                "target_lang": "tr",
                "texts": ["Hello", "Good morning"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translations": ["Merhaba", "Günaydın"]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let model = http_model(&mock_server.uri());
        let pair = LanguagePair::parse("en-tr").expect("parse");
        let output = model
            .translate(&pair, &strings(&["Hello", "Good morning"]))
            .await
            .expect("Should succeed");

        assert_eq!(output, strings(&["Merhaba", "Günaydın"]));
    }

    #[tokio::test]
    async fn test_http_unknown_pair_never_calls_service() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let model = http_model(&mock_server.uri()).with_models(HashMap::new());
        let pair = LanguagePair::parse("en-tr").expect("parse");
        let result = model.translate(&pair, &strings(&["Hello"])).await;

        assert!(matches!(result, Err(PipelineError::UnsupportedLanguagePair(p)) if p == "en-tr"));
    }

    #[tokio::test]
    async fn test_http_not_found_is_unsupported_pair() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such model"))
            .mount(&mock_server)
            .await;

        let model = http_model(&mock_server.uri());
        let pair = LanguagePair::parse("en-kk").expect("parse");
        let result = model.translate(&pair, &strings(&["Hello"])).await;

        assert!(matches!(result, Err(PipelineError::UnsupportedLanguagePair(_))));
    }

    #[tokio::test]
    async fn test_http_server_error_has_status_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("CUDA out of memory"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let model = http_model(&mock_server.uri());
        let pair = LanguagePair::parse("en-fi").expect("parse");
        let err = model
            .translate(&pair, &strings(&["Hello"]))
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("500"), "{}", msg);
        assert!(msg.contains("CUDA out of memory"), "{}", msg);
    }
}
