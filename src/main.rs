//! Infer the morphological typology of an unlabeled language.
//!
//! Usage:
//!   cargo run -- <mystery.csv>                      # Print the verdict
//!   cargo run -- <mystery.csv> --out report.json    # Also save the full report
//!
//! The corpus CSV needs columns `en` (English) and `unk` (unknown language).
//! The classifier is read from MODEL_PATH (defaults to models/typology_clf.json).

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use typology_probe::classifier::TrainedClassifier;
use typology_probe::config::Config;
use typology_probe::corpus::load_mystery_corpus;
use typology_probe::pipeline::{HttpModels, Pipeline};
use typology_probe::typology::Typology;

struct Args {
    corpus: PathBuf,
    out: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut corpus = None;
    let mut out = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => out = Some(PathBuf::from(args.next().context("--out needs a path")?)),
            _ if corpus.is_none() => corpus = Some(PathBuf::from(arg)),
            other => anyhow::bail!("Unexpected argument: {}", other),
        }
    }

    Ok(Args {
        corpus: corpus.context("Usage: typology-probe <mystery.csv> [--out report.json]")?,
        out,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("typology_probe=info".parse()?),
        )
        .init();

    let args = parse_args()?;
    let config = Config::from_env()?;

    info!("Loading mystery corpus from {}", args.corpus.display());
    let corpus = load_mystery_corpus(&args.corpus)
        .with_context(|| format!("Failed to load corpus {}", args.corpus.display()))?;
    info!("Loaded {} sentence pairs", corpus.len());

    let classifier = TrainedClassifier::load(&config.model_path)
        .with_context(|| format!("Failed to load classifier {}", config.model_path.display()))?;

    let pipeline = Pipeline::new(HttpModels::new(&config), config);
    let report = pipeline.infer_corpus(&corpus, &classifier).await?;

    println!("Detected language:   {} ({})", report.lid.majority_code, report.pair);
    println!(
        "Corpus scores:       BLEU={:.2} chrF={:.2} COMET={:.4}",
        report.corpus_scores.bleu, report.corpus_scores.chrf, report.corpus_scores.comet
    );
    println!(
        "Majority vote:       {} ({}/{} sentences)",
        report.result.majority_label,
        report.result.majority_votes(),
        report.n_sentences
    );
    println!(
        "Probability average: {} (p={:.3})",
        report.result.probability_label, report.result.confidence
    );
    println!("Class-wise average probabilities:");
    for (class, p) in Typology::CANONICAL.iter().zip(report.result.mean_probabilities.iter()) {
        println!("  {}: {:.3}", class, p);
    }

    if let Some(metrics) = pipeline.gateway_metrics() {
        info!(
            "Gateway: {} cache hits, {} misses, {} model calls",
            metrics.cache_hits, metrics.cache_misses, metrics.model_calls
        );
    }

    if let Some(out) = args.out {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(&out, json).with_context(|| format!("Failed to write {}", out.display()))?;
        info!("Saved report to {}", out.display());
    }

    Ok(())
}
