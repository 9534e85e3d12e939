//! File-backed cache of translated batches.
//!
//! One CSV file per (pair, split, sample-count) key with exactly the columns
//! `src`, `ref`, `mt`. A missing file is a miss, not an error. Files are
//! written once, through a temporary file in the same directory that is
//! renamed into place, so readers never observe a partial batch.

use crate::corpus::ParallelSample;
use crate::error::{PipelineError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

const COLUMNS: [&str; 3] = ["src", "ref", "mt"];

/// Identifies one cached batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub pair: String,
    pub split: String,
    pub sample_count: usize,
}

impl CacheKey {
    pub fn new(pair: impl Into<String>, split: impl Into<String>, sample_count: usize) -> Self {
        Self {
            pair: pair.into(),
            split: split.into(),
            sample_count,
        }
    }

    /// File name, e.g. `en-tr_n500_train.csv`.
    pub fn file_name(&self) -> String {
        format!("{}_n{}_{}.csv", self.pair, self.sample_count, self.split)
    }
}

pub struct TranslationCache {
    dir: PathBuf,
    /// Serialises writers within the process
    write_lock: Mutex<()>,
}

impl TranslationCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Read a cached batch. `Ok(None)` means the key has never been written.
    pub fn load(&self, key: &CacheKey) -> Result<Option<Vec<ParallelSample>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let headers = reader.headers()?.clone();
        if headers.len() != COLUMNS.len() || !COLUMNS.iter().all(|c| headers.iter().any(|h| h == *c)) {
            return Err(PipelineError::CacheFormat {
                path,
                reason: format!("expected columns {:?}, found {:?}", COLUMNS, headers),
            });
        }

        let mut samples = Vec::new();
        for row in reader.deserialize::<ParallelSample>() {
            samples.push(row.map_err(|e| PipelineError::CacheFormat {
                path: path.clone(),
                reason: e.to_string(),
            })?);
        }

        debug!("Cache hit for {:?}: {} rows", path, samples.len());
        Ok(Some(samples))
    }

    /// Write a complete batch for `key` in one atomic step.
    pub async fn store(&self, key: &CacheKey, samples: &[ParallelSample]) -> Result<PathBuf> {
        let _guard = self.write_lock.lock().await;

        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        let temp_file = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = csv::Writer::from_writer(temp_file.as_file());
            for sample in samples {
                writer.serialize(sample)?;
            }
            if samples.is_empty() {
                writer.write_record(COLUMNS)?;
            }
            writer.flush()?;
        }
        temp_file.as_file().sync_all()?;
        temp_file
            .persist(&path)
            .map_err(|e| PipelineError::Io(e.error))?;

        debug!("Cached {} rows at {:?}", samples.len(), path);
        Ok(path)
    }
}
