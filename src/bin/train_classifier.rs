//! Fit the typology classifier.
//!
//! Usage:
//!   cargo run --bin train
//!
//! Reads DATASET_PATH, holds out TEST_SIZE of each class (seed SEED), prints
//! the held-out report and saves the classifier to MODEL_PATH.

use anyhow::{Context, Result};
use tracing::info;
use typology_probe::classifier::{self, FitOptions, TrainOptions};
use typology_probe::config::Config;
use typology_probe::dataset::LabeledFeatureMatrix;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("typology_probe=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    info!("Loading dataset from {}", config.dataset_path.display());
    let matrix = LabeledFeatureMatrix::read_csv(&config.dataset_path)
        .with_context(|| format!("Failed to read {}", config.dataset_path.display()))?;

    let options = TrainOptions {
        test_size: config.test_size,
        seed: config.seed,
        fit: FitOptions {
            max_iter: config.max_iter,
            ..FitOptions::default()
        },
    };
    let run = classifier::fit(&matrix, options)?;

    println!("Trained on {} rows, evaluated on {}", run.n_train, run.n_test);
    println!("{}", run.report);

    run.classifier.save(&config.model_path)?;
    info!("Saved classifier to {}", config.model_path.display());
    Ok(())
}
