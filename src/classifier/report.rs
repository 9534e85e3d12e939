//! Held-out evaluation: per-class precision/recall/F1 and a confusion matrix.

use crate::typology::{Typology, NUM_CLASSES};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: Typology,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// Canonical class order
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
    /// Rows are true labels, columns predicted labels
    pub confusion: [[usize; NUM_CLASSES]; NUM_CLASSES],
    pub total: usize,
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

impl ClassificationReport {
    /// Compare true and predicted labels pairwise.
    pub fn evaluate(truth: &[Typology], predicted: &[Typology]) -> ClassificationReport {
        let mut confusion = [[0usize; NUM_CLASSES]; NUM_CLASSES];
        for (t, p) in truth.iter().zip(predicted) {
            confusion[t.index()][p.index()] += 1;
        }

        let total: usize = confusion.iter().flatten().sum();
        let correct: usize = (0..NUM_CLASSES).map(|k| confusion[k][k]).sum();

        let classes: Vec<ClassMetrics> = Typology::CANONICAL
            .iter()
            .map(|&label| {
                let k = label.index();
                let tp = confusion[k][k] as f64;
                let predicted_k: usize = confusion.iter().map(|row| row[k]).sum();
                let support: usize = confusion[k].iter().sum();

                let precision = safe_div(tp, predicted_k as f64);
                let recall = safe_div(tp, support as f64);
                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1: safe_div(2.0 * precision * recall, precision + recall),
                    support,
                }
            })
            .collect();

        // Averaged over labels that occur in the truth or the predictions
        let present: Vec<&ClassMetrics> = classes
            .iter()
            .filter(|c| c.support > 0 || confusion.iter().any(|row| row[c.label.index()] > 0))
            .collect();
        let macro_avg =
            |f: fn(&ClassMetrics) -> f64| safe_div(present.iter().map(|c| f(c)).sum(), present.len() as f64);

        ClassificationReport {
            accuracy: safe_div(correct as f64, total as f64),
            macro_precision: macro_avg(|c| c.precision),
            macro_recall: macro_avg(|c| c.recall),
            macro_f1: macro_avg(|c| c.f1),
            classes,
            confusion,
            total,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>15} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>15} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                c.label.as_str(),
                c.precision,
                c.recall,
                c.f1,
                c.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>15} {:>10} {:>10} {:>10.2} {:>10}", "accuracy", "", "", self.accuracy, self.total)?;
        writeln!(
            f,
            "{:>15} {:>10.2} {:>10.2} {:>10.2} {:>10}",
            "macro avg", self.macro_precision, self.macro_recall, self.macro_f1, self.total
        )?;
        writeln!(f)?;
        writeln!(f, "Confusion matrix (rows = true, cols = predicted):")?;
        for (label, row) in Typology::CANONICAL.iter().zip(self.confusion.iter()) {
            writeln!(f, "{:>15} {:?}", label.as_str(), row)?;
        }
        Ok(())
    }
}
