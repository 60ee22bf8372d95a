//! Seeded train/test partitioning.

use crate::error::{Result, StrokeMlError};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A disjoint row-index partition. Train and test indices are sorted and
/// together cover `0..n_samples` exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Partition `0..n_samples` by a seeded pseudo-random permutation.
///
/// The same `(n_samples, train_fraction, seed)` always yields the same
/// partition.
pub fn train_test_split(
    n_samples: usize,
    train_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if !(0.0..1.0).contains(&train_fraction) || train_fraction == 0.0 {
        return Err(StrokeMlError::Validation(format!(
            "train_fraction must be in (0, 1), got {train_fraction}"
        )));
    }
    if n_samples < 2 {
        return Err(StrokeMlError::Validation(format!(
            "need at least 2 samples to split, got {n_samples}"
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    // both subsets stay non-empty even for extreme fractions
    let n_train = ((n_samples as f64 * train_fraction) as usize).clamp(1, n_samples - 1);

    let mut train_indices = indices[..n_train].to_vec();
    let mut test_indices = indices[n_train..].to_vec();
    train_indices.sort_unstable();
    test_indices.sort_unstable();

    Ok(TrainTestSplit {
        train_indices,
        test_indices,
    })
}

/// Materialize a sub-frame from row indices.
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx: IdxCa = IdxCa::from_vec(
        "idx".into(),
        indices.iter().map(|&i| i as IdxSize).collect(),
    );
    Ok(df.take(&idx)?)
}

/// Materialize the (train, test) frames of a split.
pub fn split_frame(df: &DataFrame, split: &TrainTestSplit) -> Result<(DataFrame, DataFrame)> {
    let train = take_rows(df, &split.train_indices)?;
    let test = take_rows(df, &split.test_indices)?;
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_split_is_disjoint_and_covers() {
        let split = train_test_split(100, 0.8, 3333).unwrap();

        assert_eq!(split.train_indices.len(), 80);
        assert_eq!(split.test_indices.len(), 20);

        let train: HashSet<usize> = split.train_indices.iter().copied().collect();
        let test: HashSet<usize> = split.test_indices.iter().copied().collect();
        assert!(train.is_disjoint(&test));

        let all: HashSet<usize> = train.union(&test).copied().collect();
        assert_eq!(all, (0..100).collect::<HashSet<usize>>());
    }

    #[test]
    fn test_split_is_deterministic() {
        let a = train_test_split(4908, 0.8, 3333).unwrap();
        let b = train_test_split(4908, 0.8, 3333).unwrap();
        assert_eq!(a.train_indices, b.train_indices);
        assert_eq!(a.test_indices, b.test_indices);

        let c = train_test_split(4908, 0.8, 3334).unwrap();
        assert_ne!(a.train_indices, c.train_indices);
    }

    #[test]
    fn test_split_rejects_bad_arguments() {
        assert!(train_test_split(10, 0.0, 1).is_err());
        assert!(train_test_split(10, 1.0, 1).is_err());
        assert!(train_test_split(1, 0.8, 1).is_err());
    }

    #[test]
    fn test_split_frame_row_counts() {
        let df = df!(
            "x" => &(0..10).map(|i| i as f64).collect::<Vec<_>>(),
            "y" => &(0..10).map(|i| (i % 2) as f64).collect::<Vec<_>>()
        )
        .unwrap();

        let split = train_test_split(df.height(), 0.8, 42).unwrap();
        let (train, test) = split_frame(&df, &split).unwrap();

        assert_eq!(train.height(), 8);
        assert_eq!(test.height(), 2);

        // rows carry their original values through the take
        let x0 = train
            .column("x")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .get(0)
            .unwrap();
        assert_eq!(x0, split.train_indices[0] as f64);
    }
}
