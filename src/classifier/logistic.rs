//! Multinomial logistic regression.
//!
//! Softmax over one linear score per class, fitted by full-batch gradient
//! descent on the mean cross-entropy with an L2 penalty on the weights
//! (intercepts are not penalised). Inputs are expected to be standardised.

use crate::features::NUM_FEATURES;
use crate::typology::NUM_CLASSES;
use serde::{Deserialize, Serialize};
use tracing::debug;

const LEARNING_RATE: f64 = 0.1;
const TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// One weight row per class, canonical class order
    pub weights: [[f64; NUM_FEATURES]; NUM_CLASSES],
    pub intercepts: [f64; NUM_CLASSES],
}

/// Training knobs.
#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    pub max_iter: usize,
    /// Inverse regularisation strength
    pub c: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            c: 1.0,
        }
    }
}

impl LogisticRegression {
    /// Fit on standardised rows with class indices in `0..NUM_CLASSES`.
    pub fn fit(x: &[[f64; NUM_FEATURES]], y: &[usize], options: FitOptions) -> LogisticRegression {
        let mut model = LogisticRegression {
            weights: [[0.0; NUM_FEATURES]; NUM_CLASSES],
            intercepts: [0.0; NUM_CLASSES],
        };
        if x.is_empty() {
            return model;
        }

        let n = x.len() as f64;
        // C * sum(loss) + 0.5 * |W|^2, divided through by n
        let l2 = 1.0 / (options.c * n);

        for iteration in 0..options.max_iter {
            let mut grad_w = [[0.0; NUM_FEATURES]; NUM_CLASSES];
            let mut grad_b = [0.0; NUM_CLASSES];

            for (row, &label) in x.iter().zip(y) {
                let probs = model.predict_proba(row);
                for k in 0..NUM_CLASSES {
                    let residual = probs[k] - if k == label { 1.0 } else { 0.0 };
                    grad_b[k] += residual;
                    for j in 0..NUM_FEATURES {
                        grad_w[k][j] += residual * row[j];
                    }
                }
            }

            let mut largest_step: f64 = 0.0;
            for k in 0..NUM_CLASSES {
                for j in 0..NUM_FEATURES {
                    let g = grad_w[k][j] / n + l2 * model.weights[k][j];
                    model.weights[k][j] -= LEARNING_RATE * g;
                    largest_step = largest_step.max(g.abs());
                }
                let g = grad_b[k] / n;
                model.intercepts[k] -= LEARNING_RATE * g;
                largest_step = largest_step.max(g.abs());
            }

            if largest_step < TOLERANCE {
                debug!("Converged after {} iterations", iteration + 1);
                break;
            }
        }

        model
    }

    pub fn predict_proba(&self, row: &[f64; NUM_FEATURES]) -> [f64; NUM_CLASSES] {
        let mut logits = self.intercepts;
        for (logit, weights) in logits.iter_mut().zip(self.weights.iter()) {
            *logit += weights.iter().zip(row.iter()).map(|(w, v)| w * v).sum::<f64>();
        }
        softmax(&logits)
    }
}

fn softmax(logits: &[f64; NUM_CLASSES]) -> [f64; NUM_CLASSES] {
    let max_logit = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut out = [0.0; NUM_CLASSES];
    let mut sum = 0.0;
    for (o, l) in out.iter_mut().zip(logits.iter()) {
        *o = (l - max_logit).exp();
        sum += *o;
    }
    for o in out.iter_mut() {
        *o /= sum;
    }
    out
}

/// Index of the largest value; ties go to the lowest index.
pub fn argmax(values: &[f64; NUM_CLASSES]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
