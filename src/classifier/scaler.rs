//! Per-dimension standardisation.

use crate::error::{PipelineError, Result};
use crate::features::{FeatureVector, NUM_FEATURES};
use serde::{Deserialize, Serialize};

/// Zero-mean, unit-variance scaling learned from training rows only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: [f64; NUM_FEATURES],
    /// Population standard deviation; constant columns get 1.0
    pub scale: [f64; NUM_FEATURES],
}

impl StandardScaler {
    pub fn fit(rows: &[FeatureVector]) -> Result<StandardScaler> {
        if rows.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }
        let n = rows.len() as f64;

        let mut mean = [0.0; NUM_FEATURES];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row.values.iter()) {
                *m += v;
            }
        }
        for m in mean.iter_mut() {
            *m /= n;
        }

        let mut scale = [0.0; NUM_FEATURES];
        for row in rows {
            for ((s, v), m) in scale.iter_mut().zip(row.values.iter()).zip(mean.iter()) {
                *s += (v - m).powi(2);
            }
        }
        for s in scale.iter_mut() {
            let std = (*s / n).sqrt();
            *s = if std > f64::EPSILON { std } else { 1.0 };
        }

        Ok(StandardScaler { mean, scale })
    }

    pub fn transform(&self, vector: &FeatureVector) -> [f64; NUM_FEATURES] {
        let mut out = [0.0; NUM_FEATURES];
        for i in 0..NUM_FEATURES {
            out[i] = (vector.values[i] - self.mean[i]) / self.scale[i];
        }
        out
    }
}
