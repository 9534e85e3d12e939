//! Build the labeled feature matrix from cached translations.
//!
//! Usage:
//!   cargo run --bin build-dataset
//!
//! Reads `{CACHE_DIR}/{pair}_n{MAX_SAMPLES}_{SPLIT}.csv` for every registered
//! language (missing files are skipped) and writes DATASET_PATH.

use anyhow::{Context, Result};
use tracing::info;
use typology_probe::config::Config;
use typology_probe::pipeline::{HttpModels, Pipeline};
use typology_probe::typology::Typology;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("typology_probe=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let dataset_path = config.dataset_path.clone();
    let pipeline = Pipeline::new(HttpModels::new(&config), config);

    let matrix = pipeline
        .build_training_matrix()
        .await
        .context("Failed to build training matrix")?;
    matrix.write_csv(&dataset_path)?;

    info!("Saved dataset with {} rows to {}", matrix.len(), dataset_path.display());
    for (class, count) in Typology::CANONICAL.iter().zip(matrix.class_counts()) {
        println!("  {}: {}", class, count);
    }
    Ok(())
}
