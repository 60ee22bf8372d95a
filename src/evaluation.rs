//! Model scoring against a held-out test set.

use crate::error::{Result, StrokeMlError};
use crate::training::Classifier;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// 2x2 confusion matrix for a binary classifier. Immutable once computed;
/// cells are reachable only through accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    true_negatives: usize,
    false_positives: usize,
    false_negatives: usize,
    true_positives: usize,
}

impl ConfusionMatrix {
    /// Tally predictions against labels. Labels above 0.5 count as the
    /// positive class.
    pub fn from_predictions(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(StrokeMlError::Validation(format!(
                "labels ({}) and predictions ({}) differ in length",
                y_true.len(),
                y_pred.len()
            )));
        }

        let mut m = Self {
            true_negatives: 0,
            false_positives: 0,
            false_negatives: 0,
            true_positives: 0,
        };

        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            match (*t > 0.5, *p > 0.5) {
                (false, false) => m.true_negatives += 1,
                (false, true) => m.false_positives += 1,
                (true, false) => m.false_negatives += 1,
                (true, true) => m.true_positives += 1,
            }
        }

        Ok(m)
    }

    pub fn true_negatives(&self) -> usize {
        self.true_negatives
    }

    pub fn false_positives(&self) -> usize {
        self.false_positives
    }

    pub fn false_negatives(&self) -> usize {
        self.false_negatives
    }

    pub fn true_positives(&self) -> usize {
        self.true_positives
    }

    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    /// (TP + TN) / total, in [0, 1].
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_positives + self.true_negatives) as f64 / total as f64
    }

    /// TP / (TP + FP); 0.0 when nothing was predicted positive.
    pub fn precision(&self) -> f64 {
        let denom = self.true_positives + self.false_positives;
        if denom == 0 {
            return 0.0;
        }
        self.true_positives as f64 / denom as f64
    }

    /// TP / (TP + FN); 0.0 when no positives exist.
    pub fn recall(&self) -> f64 {
        let denom = self.true_positives + self.false_negatives;
        if denom == 0 {
            return 0.0;
        }
        self.true_positives as f64 / denom as f64
    }

    /// Harmonic mean of precision and recall; 0.0 when both are 0.
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            return 0.0;
        }
        2.0 * p * r / (p + r)
    }
}

/// Score a fitted model on a test set. The test data is read, never
/// modified.
pub fn evaluate(
    model: &dyn Classifier,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<ConfusionMatrix> {
    let y_pred = model.predict(x_test)?;
    ConfusionMatrix::from_predictions(y_test, &y_pred)
}
