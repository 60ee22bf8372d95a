//! Classifier implementations.
//!
//! Three independent model families over the same prepared feature matrix:
//! - [`knn`] - nearest-neighbor voting, k selected by cross-validation
//! - [`svm`] - margin-based binary classifier trained with SMO
//! - [`naive_bayes`] - Gaussian naive Bayes
//!
//! [`cross_validation`] provides the seeded k-fold machinery the
//! hyperparameter search runs on.

pub mod cross_validation;
pub mod knn;
pub mod naive_bayes;
pub mod svm;

pub use cross_validation::{CvSplit, KFold};
pub use knn::{select_k, DistanceMetric, KnnClassifier, KnnConfig, KnnSelection};
pub use naive_bayes::GaussianNaiveBayes;
pub use svm::{KernelType, SvmClassifier, SvmConfig};

use crate::error::{Result, StrokeMlError};
use ndarray::{Array1, Array2};

/// Common contract of the model variants.
///
/// `x` is row-major (one row per record); `y` holds the 0.0/1.0 outcome
/// labels. A fitted model is read-only: `predict` never mutates.
pub trait Classifier: Send + Sync {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Distinct labels, sorted. Errors when training data holds fewer than two
/// classes: no decision boundary can be fitted on one class.
pub(crate) fn distinct_classes(y: &Array1<f64>) -> Result<Vec<i64>> {
    let mut classes: Vec<i64> = y.iter().map(|&v| v.round() as i64).collect();
    classes.sort_unstable();
    classes.dedup();

    if classes.len() < 2 {
        return Err(StrokeMlError::DegenerateClass(format!(
            "training data contains {} outcome class(es); need at least 2",
            classes.len()
        )));
    }
    Ok(classes)
}

/// Shape check shared by every `fit`.
pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 {
        return Err(StrokeMlError::Validation(
            "cannot fit on an empty training set".to_string(),
        ));
    }
    if x.nrows() != y.len() {
        return Err(StrokeMlError::Validation(format!(
            "feature matrix has {} rows but labels have {} entries",
            x.nrows(),
            y.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_distinct_classes() {
        let y = array![0.0, 1.0, 1.0, 0.0];
        assert_eq!(distinct_classes(&y).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_single_class_is_degenerate() {
        let y = array![1.0, 1.0, 1.0];
        assert!(matches!(
            distinct_classes(&y).unwrap_err(),
            StrokeMlError::DegenerateClass(_)
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let x = Array2::<f64>::zeros((3, 2));
        let y = array![0.0, 1.0];
        assert!(check_fit_input(&x, &y).is_err());
    }
}
