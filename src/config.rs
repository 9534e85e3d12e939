use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Language identification
    pub lid_min_confidence: f64,
    /// Detect over every lingua language instead of the profile table plus English
    pub lid_all_languages: bool,

    // Model services
    pub translation_api_url: String,
    pub comet_api_url: String,
    pub model_api_key: Option<String>,
    pub use_gpu: bool,

    // Paths
    pub cache_dir: PathBuf,
    pub corpora_dir: PathBuf,
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub results_path: PathBuf,

    // Batching
    pub max_samples: usize,
    pub split: String,
    pub translate_batch_size: usize,
    pub score_batch_size: usize,
    pub translate_timeout: Duration,
    pub score_timeout: Duration,

    // Training
    pub test_size: f64,
    pub seed: u64,
    pub max_iter: usize,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lid_min_confidence: 0.7,
            lid_all_languages: false,

            translation_api_url: "http://localhost:8080/translate".to_string(),
            comet_api_url: "http://localhost:8081/score".to_string(),
            model_api_key: None,
            use_gpu: false,

            cache_dir: PathBuf::from("cache"),
            corpora_dir: PathBuf::from("data/corpora"),
            dataset_path: PathBuf::from("data/typology_training_data.csv"),
            model_path: PathBuf::from("models/typology_clf.json"),
            results_path: PathBuf::from("mt_typology_results.csv"),

            max_samples: 500,
            split: "train".to_string(),
            translate_batch_size: 16,
            score_batch_size: 16,
            translate_timeout: Duration::from_secs(300),
            score_timeout: Duration::from_secs(300),

            test_size: 0.1,
            seed: 42,
            max_iter: 1000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let lid_min_confidence: f64 = env_or("LID_MIN_CONFIDENCE", defaults.lid_min_confidence);
        if !(0.0..=1.0).contains(&lid_min_confidence) {
            anyhow::bail!("LID_MIN_CONFIDENCE must be in [0, 1], got {}", lid_min_confidence);
        }

        let test_size: f64 = env_or("TEST_SIZE", defaults.test_size);
        if !(0.0..1.0).contains(&test_size) {
            anyhow::bail!("TEST_SIZE must be in [0, 1), got {}", test_size);
        }

        Ok(Self {
            lid_min_confidence,
            lid_all_languages: env_or("LID_ALL_LANGUAGES", defaults.lid_all_languages),

            translation_api_url: env_string("TRANSLATION_API_URL", &defaults.translation_api_url),
            comet_api_url: env_string("COMET_API_URL", &defaults.comet_api_url),
            model_api_key: std::env::var("MODEL_API_KEY").ok().filter(|k| !k.is_empty()),
            use_gpu: env_or("USE_GPU", defaults.use_gpu),

            cache_dir: env_path("CACHE_DIR", defaults.cache_dir),
            corpora_dir: env_path("CORPORA_DIR", defaults.corpora_dir),
            dataset_path: env_path("DATASET_PATH", defaults.dataset_path),
            model_path: env_path("MODEL_PATH", defaults.model_path),
            results_path: env_path("RESULTS_PATH", defaults.results_path),

            max_samples: env_or("MAX_SAMPLES", defaults.max_samples),
            split: env_string("SPLIT", &defaults.split),
            translate_batch_size: env_or("TRANSLATE_BATCH_SIZE", defaults.translate_batch_size),
            score_batch_size: env_or("SCORE_BATCH_SIZE", defaults.score_batch_size),
            translate_timeout: Duration::from_secs(env_or(
                "TRANSLATE_TIMEOUT_SECS",
                defaults.translate_timeout.as_secs(),
            )),
            score_timeout: Duration::from_secs(env_or("SCORE_TIMEOUT_SECS", defaults.score_timeout.as_secs())),

            test_size,
            seed: env_or("SEED", defaults.seed),
            max_iter: env_or("MAX_ITER", defaults.max_iter),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.lid_min_confidence, 0.7);
        assert!(!config.lid_all_languages);
        assert_eq!(config.max_samples, 500);
        assert_eq!(config.split, "train");
        assert_eq!(config.seed, 42);
        assert_eq!(config.model_path, PathBuf::from("models/typology_clf.json"));
    }
}
