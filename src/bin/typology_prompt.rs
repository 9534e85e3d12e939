//! Print a typology-guess prompt for a generative model.
//!
//! Usage:
//!   cargo run --bin prompt -- <pair> [k] [seed]
//!
//! Uses the cached batch `{CACHE_DIR}/{pair}_n{MAX_SAMPLES}_{SPLIT}.csv` and
//! native BLEU/chrF. COMET is taken from the COMET service.

use anyhow::{Context, Result};
use typology_probe::cache::{CacheKey, TranslationCache};
use typology_probe::config::Config;
use typology_probe::corpus::columns;
use typology_probe::prompt::make_typology_prompt;
use typology_probe::scoring::{HttpCometModel, QualityScorer};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("typology_probe=warn".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let pair = args.get(1).context("Usage: prompt <pair> [k] [seed]")?;
    let k: usize = args.get(2).map(|v| v.parse()).transpose()?.unwrap_or(5);
    let seed: u64 = args.get(3).map(|v| v.parse()).transpose()?.unwrap_or(0);

    let config = Config::from_env()?;
    let cache = TranslationCache::new(&config.cache_dir);
    let key = CacheKey::new(pair.as_str(), config.split.as_str(), config.max_samples);
    let samples = cache
        .load(&key)?
        .with_context(|| format!("No cached translations at {}", cache.path_for(&key).display()))?;

    let comet = HttpCometModel::new(
        reqwest::Client::new(),
        config.comet_api_url.clone(),
        config.model_api_key.clone(),
        config.use_gpu,
    );
    let scorer = QualityScorer::new(comet, config.score_batch_size, config.score_timeout);

    let (sources, hypotheses, references) = columns(&samples);
    let scores = scorer.corpus_score(&sources, &hypotheses, &references).await?;

    println!("{}", make_typology_prompt(&sources, &hypotheses, &scores, k, seed)?);
    Ok(())
}
