//! Gaussian naive Bayes classifier.
//!
//! Per-class, per-feature normal densities combined under an independence
//! assumption. Variance smoothing keeps constant features (e.g. an
//! indicator column that is all-zero within one class) from collapsing the
//! density.

use crate::error::{Result, StrokeMlError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;

use super::{check_fit_input, distinct_classes, Classifier};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Per-class feature means.
    means: HashMap<i64, Vec<f64>>,
    /// Per-class feature variances (smoothed).
    variances: HashMap<i64, Vec<f64>>,
    /// Class prior probabilities.
    priors: HashMap<i64, f64>,
    classes: Vec<i64>,
    /// Relative variance floor, scaled by the largest feature variance.
    var_smoothing: f64,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self {
            means: HashMap::new(),
            variances: HashMap::new(),
            priors: HashMap::new(),
            classes: Vec::new(),
            var_smoothing: 1e-9,
        }
    }

    pub fn with_var_smoothing(mut self, smoothing: f64) -> Self {
        self.var_smoothing = smoothing;
        self
    }

    pub fn class_priors(&self) -> &HashMap<i64, f64> {
        &self.priors
    }

    /// Log posterior (unnormalized-then-normalized) per class, one row per
    /// input row, columns ordered like the sorted class list.
    pub fn predict_log_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.classes.is_empty() {
            return Err(StrokeMlError::ModelNotFitted);
        }
        let n_features = self.means[&self.classes[0]].len();
        if x.ncols() != n_features {
            return Err(StrokeMlError::Validation(format!(
                "expected {} features, got {}",
                n_features,
                x.ncols()
            )));
        }

        let n_samples = x.nrows();
        let n_classes = self.classes.len();
        let mut log_probs = Array2::zeros((n_samples, n_classes));

        for (i, row) in x.rows().into_iter().enumerate() {
            for (j, &class) in self.classes.iter().enumerate() {
                let log_prior = self.priors[&class].ln();
                let log_likelihood = self.log_likelihood(row, class);
                log_probs[[i, j]] = log_prior + log_likelihood;
            }
        }

        // log-sum-exp normalization
        for mut row in log_probs.rows_mut() {
            let max_val = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let log_sum: f64 = row.iter().map(|&v| (v - max_val).exp()).sum::<f64>().ln();
            for val in row.iter_mut() {
                *val = *val - max_val - log_sum;
            }
        }

        Ok(log_probs)
    }

    /// Posterior probabilities per class.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(self.predict_log_proba(x)?.mapv(|v| v.exp()))
    }

    fn log_likelihood(&self, x: ndarray::ArrayView1<f64>, class: i64) -> f64 {
        let means = &self.means[&class];
        let vars = &self.variances[&class];

        x.iter()
            .zip(means.iter())
            .zip(vars.iter())
            .map(|((&xi, &mean), &var)| {
                -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln())
            })
            .sum()
    }
}

impl Classifier for GaussianNaiveBayes {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        self.classes = distinct_classes(y)?;

        let n_samples = x.nrows();
        let n_features = x.ncols();

        let mut class_counts: HashMap<i64, usize> = HashMap::new();
        for &label in y.iter() {
            *class_counts.entry(label.round() as i64).or_insert(0) += 1;
        }

        self.priors.clear();
        for (&class, &count) in &class_counts {
            self.priors.insert(class, count as f64 / n_samples as f64);
        }

        // smoothing floor relative to the spread of the whole training set
        let global_max_var = {
            let mut max_var: f64 = 0.0;
            for col in x.columns() {
                let mean = col.sum() / n_samples as f64;
                let var = col.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n_samples as f64;
                max_var = max_var.max(var);
            }
            max_var
        };
        let epsilon = (self.var_smoothing * global_max_var).max(self.var_smoothing);

        self.means.clear();
        self.variances.clear();
        for &class in &self.classes {
            let class_indices: Vec<usize> = y
                .iter()
                .enumerate()
                .filter(|(_, &yi)| yi.round() as i64 == class)
                .map(|(i, _)| i)
                .collect();
            let n_class = class_indices.len();

            // Welford's single-pass mean/variance per feature
            let mut feature_means = vec![0.0; n_features];
            let mut feature_m2 = vec![0.0; n_features];
            let mut count = 0usize;
            for &idx in &class_indices {
                count += 1;
                let row = x.row(idx);
                for (j, &val) in row.iter().enumerate() {
                    let delta = val - feature_means[j];
                    feature_means[j] += delta / count as f64;
                    let delta2 = val - feature_means[j];
                    feature_m2[j] += delta * delta2;
                }
            }
            let feature_vars: Vec<f64> = feature_m2
                .iter()
                .map(|&m2| (m2 / n_class as f64) + epsilon)
                .collect();

            self.means.insert(class, feature_means);
            self.variances.insert(class, feature_vars);
        }

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let log_probs = self.predict_log_proba(x)?;

        Ok(log_probs
            .rows()
            .into_iter()
            .map(|row| {
                let max_idx = row
                    .iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| {
                        a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                self.classes[max_idx] as f64
            })
            .collect())
    }
}
