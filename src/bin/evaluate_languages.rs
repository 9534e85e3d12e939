//! Per-language MT quality table.
//!
//! Usage:
//!   cargo run --bin evaluate              # All registered languages
//!   cargo run --bin evaluate -- tr zh es  # Only the given codes
//!
//! Reads `{CORPORA_DIR}/{pair}_{SPLIT}.csv` (columns `src`, `ref`), translates
//! through the cache and writes one row per language to RESULTS_PATH.

use anyhow::{Context, Result};
use tracing::{info, warn};
use typology_probe::config::Config;
use typology_probe::pipeline::{HttpModels, Pipeline};
use typology_probe::typology::ProfileRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("typology_probe=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let codes: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::from_env()?;
    let results_path = config.results_path.clone();
    let pipeline = Pipeline::new(HttpModels::new(&config), config);

    let rows = if codes.is_empty() {
        pipeline.evaluate_all().await
    } else {
        let registry = ProfileRegistry::get();
        let mut rows = Vec::new();
        for code in &codes {
            let profile = registry
                .get_by_code(code)
                .with_context(|| format!("Unknown language code: {}", code))?;
            match pipeline.evaluate_language(profile).await {
                Ok(row) => rows.push(row),
                Err(e) => warn!("Skipping {}: {}", code, e),
            }
        }
        rows
    };

    if rows.is_empty() {
        anyhow::bail!("No language could be evaluated");
    }

    let mut writer = csv::Writer::from_path(&results_path)
        .with_context(|| format!("Failed to create {}", results_path.display()))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", rows.len(), results_path.display());
    for row in &rows {
        println!(
            "{:<4} {:<7} {:<14} BLEU={:>6.2} chrF={:>6.2} COMET={:>7.4} n={}",
            row.language, row.pair, row.typology, row.bleu, row.chrf, row.comet, row.n_samples
        );
    }
    Ok(())
}
