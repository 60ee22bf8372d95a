//! Correlation of features against the outcome.

use crate::data::column_to_f64;
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Pearson correlation of one feature against the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCorrelation {
    pub feature: String,
    pub r: f64,
}

/// Pearson correlation coefficient. Constant inputs yield 0.0.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len()) as f64;
    if n < 2.0 {
        return 0.0;
    }

    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let x_std = (x.iter().map(|&v| (v - x_mean).powi(2)).sum::<f64>() / n).sqrt();
    let y_std = (y.iter().map(|&v| (v - y_mean).powi(2)).sum::<f64>() / n).sqrt();

    if x_std <= 0.0 || y_std <= 0.0 {
        return 0.0;
    }

    let covariance = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| (xi - x_mean) * (yi - y_mean))
        .sum::<f64>()
        / n;

    covariance / (x_std * y_std)
}

/// Correlate every non-target column of an encoded frame against the
/// outcome, sorted by descending magnitude.
///
/// Runs on the numeric 0/1 view of the outcome; the frame must already be
/// fully numeric (i.e. encoded).
pub fn outcome_correlations(df: &DataFrame, target: &str) -> Result<Vec<FeatureCorrelation>> {
    let y = column_to_f64(df, target)?;

    let mut correlations: Vec<FeatureCorrelation> = df
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != target)
        .map(|name| {
            let x = column_to_f64(df, name.as_str())?;
            Ok(FeatureCorrelation {
                feature: name.to_string(),
                r: pearson(&x, &y),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    correlations.sort_by(|a, b| {
        b.r.abs()
            .partial_cmp(&a.r.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(correlations)
}
