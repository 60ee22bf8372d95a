//! Nearest-neighbor classifier.
//!
//! Classification is a majority vote among the k nearest training rows.
//! Ties in distance or votes resolve by heap/iteration order; with
//! continuous features exact ties are rare enough not to matter.

use crate::error::{Result, StrokeMlError};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use tracing::debug;

use super::cross_validation::{fold_accuracy, select_rows, KFold};
use super::{check_fit_input, distinct_classes, Classifier};

/// Distance metric over the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Euclidean distance (L2)
    Euclidean,
    /// Manhattan distance (L1)
    Manhattan,
}

impl Default for DistanceMetric {
    fn default() -> Self {
        Self::Euclidean
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnConfig {
    /// Number of neighbors consulted per prediction.
    pub n_neighbors: usize,
    pub metric: DistanceMetric,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            metric: DistanceMetric::Euclidean,
        }
    }
}

/// K-nearest-neighbor classifier. Fitting stores the training data;
/// all work happens at prediction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnClassifier {
    config: KnnConfig,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl KnnClassifier {
    pub fn new(config: KnnConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: None,
        }
    }

    /// Create with default config and the given k.
    pub fn with_k(k: usize) -> Self {
        Self::new(KnnConfig {
            n_neighbors: k,
            ..Default::default()
        })
    }
}

impl Classifier for KnnClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        if self.config.n_neighbors == 0 {
            return Err(StrokeMlError::Validation(
                "n_neighbors must be at least 1".to_string(),
            ));
        }
        distinct_classes(y)?;
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    /// Predict labels, parallelized over the rows of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let x_train = self.x_train.as_ref().ok_or(StrokeMlError::ModelNotFitted)?;
        let y_train = self.y_train.as_ref().ok_or(StrokeMlError::ModelNotFitted)?;
        if x.ncols() != x_train.ncols() {
            return Err(StrokeMlError::Validation(format!(
                "expected {} features, got {}",
                x_train.ncols(),
                x.ncols()
            )));
        }

        let k = self.config.n_neighbors;
        let metric = self.config.metric;

        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let row: Vec<f64> = x.row(i).to_vec();
                let neighbors = find_k_nearest(&row, x_train, y_train, k, metric);
                vote(&neighbors)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}

/// Chosen neighbor count and its cross-validated accuracy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KnnSelection {
    pub k: usize,
    pub cv_accuracy: f64,
}

/// Select k by seeded k-fold cross-validation over `candidates`.
///
/// Candidates are scored in parallel; each candidate's folds run on the
/// same seeded split so scores are comparable. Ties go to the smaller k.
pub fn select_k(
    x: &Array2<f64>,
    y: &Array1<f64>,
    candidates: &[usize],
    n_folds: usize,
    seed: u64,
) -> Result<KnnSelection> {
    if candidates.is_empty() {
        return Err(StrokeMlError::HyperparameterSearch(
            "empty candidate range for k".to_string(),
        ));
    }
    check_fit_input(x, y)?;
    distinct_classes(y)?;

    let splits = KFold::new(n_folds, seed).split(x.nrows())?;

    let scored: Vec<(usize, f64)> = candidates
        .par_iter()
        .map(|&k| -> Result<(usize, f64)> {
            let mut total = 0.0;
            for split in &splits {
                let (x_tr, y_tr) = select_rows(x, y, &split.train_indices);
                let (x_va, y_va) = select_rows(x, y, &split.test_indices);

                let mut model = KnnClassifier::with_k(k);
                model.fit(&x_tr, &y_tr)?;
                let y_pred = model.predict(&x_va)?;
                total += fold_accuracy(&y_va, &y_pred);
            }
            Ok((k, total / splits.len() as f64))
        })
        .collect::<Result<Vec<_>>>()?;

    let best = scored
        .into_iter()
        .max_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                // prefer the smaller k on equal accuracy
                .then(b.0.cmp(&a.0))
        })
        .ok_or_else(|| {
            StrokeMlError::HyperparameterSearch("no candidate could be scored".to_string())
        })?;

    debug!(k = best.0, cv_accuracy = best.1, "selected neighbor count");
    Ok(KnnSelection {
        k: best.0,
        cv_accuracy: best.1,
    })
}

/// Max-heap entry for the partial sort (keeps the k smallest distances).
#[derive(PartialEq)]
struct DistLabel(f64, f64);

impl Eq for DistLabel {}
impl PartialOrd for DistLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}
impl Ord for DistLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

/// Find the k nearest neighbors with a bounded max-heap.
fn find_k_nearest(
    point: &[f64],
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    k: usize,
    metric: DistanceMetric,
) -> Vec<(f64, f64)> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (i, row) in x_train.rows().into_iter().enumerate() {
        let dist = compute_distance(point, row.iter(), metric);
        if heap.len() < k {
            heap.push(DistLabel(dist, y_train[i]));
        } else if let Some(top) = heap.peek() {
            if dist < top.0 {
                heap.pop();
                heap.push(DistLabel(dist, y_train[i]));
            }
        }
    }

    heap.into_iter().map(|dl| (dl.0, dl.1)).collect()
}

fn compute_distance<'a, I>(a: &[f64], b: I, metric: DistanceMetric) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    match metric {
        DistanceMetric::Euclidean => a
            .iter()
            .zip(b)
            .map(|(ai, bi)| {
                let d = ai - bi;
                d * d
            })
            .sum::<f64>()
            .sqrt(),
        DistanceMetric::Manhattan => a.iter().zip(b).map(|(ai, bi)| (ai - bi).abs()).sum(),
    }
}

/// Majority vote over the neighbor labels.
fn vote(neighbors: &[(f64, f64)]) -> f64 {
    let mut votes: HashMap<i64, usize> = HashMap::new();
    for &(_, label) in neighbors {
        *votes.entry(label.round() as i64).or_insert(0) += 1;
    }
    votes
        .into_iter()
        // equal votes resolve to the smaller label so repeat runs agree
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(label, _)| label as f64)
        .unwrap_or(0.0)
}
