//! Margin-based binary classifier.
//!
//! A support-vector machine trained with SMO (Sequential Minimal
//! Optimization). The regularization constant C is fixed configuration,
//! not searched; the kernel defaults to linear. Working-pair selection is
//! seeded so training is reproducible.

use crate::error::{Result, StrokeMlError};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_fit_input, distinct_classes, Classifier};

/// Kernel function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// Linear kernel: K(x, y) = x · y
    Linear,
    /// Radial basis function: K(x, y) = exp(-γ ||x - y||²)
    Rbf { gamma: f64 },
}

impl Default for KernelType {
    fn default() -> Self {
        KernelType::Linear
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmConfig {
    /// Regularization constant C.
    pub c: f64,
    pub kernel: KernelType,
    /// KKT violation tolerance for the stopping criterion.
    pub tol: f64,
    /// Cap on optimization sweeps.
    pub max_iter: usize,
    /// Seed for working-pair selection.
    pub seed: u64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelType::Linear,
            tol: 1e-3,
            max_iter: 1000,
            seed: 42,
        }
    }
}

/// Binary support-vector classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmClassifier {
    config: SvmConfig,
    support_vectors: Option<Array2<f64>>,
    alphas: Option<Array1<f64>>,
    support_labels: Option<Array1<f64>>,
    bias: f64,
    /// The two class labels; classes[0] maps to -1, classes[1] to +1.
    classes: Vec<i64>,
}

impl SvmClassifier {
    pub fn new(config: SvmConfig) -> Self {
        Self {
            config,
            support_vectors: None,
            alphas: None,
            support_labels: None,
            bias: 0.0,
            classes: Vec::new(),
        }
    }

    /// Number of support vectors in the fitted model.
    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.as_ref().map_or(0, |sv| sv.nrows())
    }

    /// SMO over the internal {-1, +1} labels.
    fn smo_train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(Array1<f64>, f64, Vec<usize>)> {
        let n = x.nrows();

        let mut alphas: Array1<f64> = Array1::zeros(n);
        let mut bias = 0.0;

        let kernel_matrix = self.compute_kernel_matrix(x);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);

        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while passes < max_passes && total_iter < self.config.max_iter {
            let mut num_changed = 0;

            if n <= 1 {
                break;
            }

            for i in 0..n {
                let e_i = decision_cached(&kernel_matrix, &alphas, y, bias, i) - y[i];

                // KKT violation check
                if (y[i] * e_i < -self.config.tol && alphas[i] < self.config.c)
                    || (y[i] * e_i > self.config.tol && alphas[i] > 0.0)
                {
                    // pick the partner index randomly (n > 1 guaranteed above)
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j = decision_cached(&kernel_matrix, &alphas, y, bias, j) - y[j];

                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y[i] != y[j] {
                        (
                            (alphas[j] - alphas[i]).max(0.0),
                            (self.config.c + alphas[j] - alphas[i]).min(self.config.c),
                        )
                    } else {
                        (
                            (alphas[i] + alphas[j] - self.config.c).max(0.0),
                            (alphas[i] + alphas[j]).min(self.config.c),
                        )
                    };

                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let eta =
                        2.0 * kernel_matrix[[i, j]] - kernel_matrix[[i, i]] - kernel_matrix[[j, j]];
                    if eta >= 0.0 {
                        continue;
                    }

                    alphas[j] = (alphas[j] - y[j] * (e_i - e_j) / eta).max(l).min(h);
                    if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }

                    alphas[i] += y[i] * y[j] * (alpha_j_old - alphas[j]);

                    let b1 = bias
                        - e_i
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, i]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[i, j]];
                    let b2 = bias
                        - e_j
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, j]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[j, j]];

                    bias = if alphas[i] > 0.0 && alphas[i] < self.config.c {
                        b1
                    } else if alphas[j] > 0.0 && alphas[j] < self.config.c {
                        b2
                    } else {
                        (b1 + b2) / 2.0
                    };

                    num_changed += 1;
                }
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        let support_indices: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-8)
            .map(|(i, _)| i)
            .collect();

        Ok((alphas, bias, support_indices))
    }

    /// Kernel matrix, rows computed in parallel for larger inputs.
    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let kernel = self.config.kernel;

        if n < 100 {
            let mut k = Array2::zeros((n, n));
            for i in 0..n {
                for j in i..n {
                    let val = kernel_value(kernel, x.row(i), x.row(j));
                    k[[i, j]] = val;
                    k[[j, i]] = val;
                }
            }
            return k;
        }

        let rows: Vec<Vec<(usize, f64)>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (i..n)
                    .map(|j| (j, kernel_value(kernel, x.row(i), x.row(j))))
                    .collect()
            })
            .collect();

        let mut k = Array2::zeros((n, n));
        for (i, row_vals) in rows.into_iter().enumerate() {
            for (j, val) in row_vals {
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        k
    }

    /// Decision function of the fitted model for one row.
    fn decision_function(&self, row: ndarray::ArrayView1<f64>) -> Result<f64> {
        let sv = self
            .support_vectors
            .as_ref()
            .ok_or(StrokeMlError::ModelNotFitted)?;
        let alphas = self.alphas.as_ref().ok_or(StrokeMlError::ModelNotFitted)?;
        let labels = self
            .support_labels
            .as_ref()
            .ok_or(StrokeMlError::ModelNotFitted)?;

        let mut sum = self.bias;
        for (i, sv_row) in sv.rows().into_iter().enumerate() {
            sum += alphas[i] * labels[i] * kernel_value(self.config.kernel, row, sv_row);
        }
        Ok(sum)
    }
}

impl Classifier for SvmClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let classes = distinct_classes(y)?;
        if classes.len() != 2 {
            return Err(StrokeMlError::Validation(format!(
                "binary classifier got {} classes",
                classes.len()
            )));
        }
        self.classes = classes;

        // map labels onto {-1, +1} for the optimizer
        let y_signed: Array1<f64> = y.mapv(|v| {
            if v.round() as i64 == self.classes[1] {
                1.0
            } else {
                -1.0
            }
        });

        let (alphas, bias, support_indices) = self.smo_train(x, &y_signed)?;

        let sv_count = support_indices.len();
        let mut support_vectors = Array2::zeros((sv_count, x.ncols()));
        let mut support_labels = Array1::zeros(sv_count);
        let mut support_alphas = Array1::zeros(sv_count);

        for (i, &idx) in support_indices.iter().enumerate() {
            support_vectors.row_mut(i).assign(&x.row(idx));
            support_labels[i] = y_signed[idx];
            support_alphas[i] = alphas[idx];
        }

        debug!(
            support_vectors = sv_count,
            bias, "fitted margin classifier"
        );

        self.support_vectors = Some(support_vectors);
        self.support_labels = Some(support_labels);
        self.alphas = Some(support_alphas);
        self.bias = bias;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let sv = self
            .support_vectors
            .as_ref()
            .ok_or(StrokeMlError::ModelNotFitted)?;
        if x.ncols() != sv.ncols() {
            return Err(StrokeMlError::Validation(format!(
                "expected {} features, got {}",
                sv.ncols(),
                x.ncols()
            )));
        }

        let mut predictions = Vec::with_capacity(x.nrows());
        for row in x.rows() {
            let d = self.decision_function(row)?;
            let label = if d >= 0.0 {
                self.classes[1]
            } else {
                self.classes[0]
            };
            predictions.push(label as f64);
        }
        Ok(Array1::from_vec(predictions))
    }
}

fn kernel_value(
    kernel: KernelType,
    a: ndarray::ArrayView1<f64>,
    b: ndarray::ArrayView1<f64>,
) -> f64 {
    match kernel {
        KernelType::Linear => a.dot(&b),
        KernelType::Rbf { gamma } => {
            let diff = &a - &b;
            (-gamma * diff.dot(&diff)).exp()
        }
    }
}

fn decision_cached(
    k: &Array2<f64>,
    alphas: &Array1<f64>,
    y: &Array1<f64>,
    bias: f64,
    idx: usize,
) -> f64 {
    let mut sum = bias;
    for i in 0..alphas.len() {
        if alphas[i] > 0.0 {
            sum += alphas[i] * y[i] * k[[i, idx]];
        }
    }
    sum
}
