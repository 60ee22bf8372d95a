//! Continuous-attribute rescaling.

use crate::error::{Result, StrokeMlError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rescaling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Min-max rescaling onto [0, 1]: (x - min) / (max - min)
    MinMax,
    /// Z-score standardization: (x - mean) / std
    Standard,
}

impl Default for ScalerType {
    fn default() -> Self {
        Self::MinMax
    }
}

/// Parameters for one fitted column.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: f64, // min or mean
    scale: f64,  // range or std
}

/// Per-column rescaler.
///
/// `fit` and `transform` are separate so the statistics can come from the
/// training subset alone and still be applied to the test subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    columns: Vec<String>,
    params: HashMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    pub fn new(scaler_type: ScalerType, columns: Vec<String>) -> Self {
        Self {
            scaler_type,
            columns,
            params: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Compute per-column statistics from the given frame.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.params.clear();

        for name in &self.columns {
            let column = df
                .column(name)
                .map_err(|_| StrokeMlError::FeatureNotFound(name.clone()))?;
            let series = column.as_materialized_series().cast(&DataType::Float64)?;
            let ca = series.f64()?;

            if ca.null_count() > 0 {
                return Err(StrokeMlError::Data(format!(
                    "column '{name}' contains missing values; clean before rescaling"
                )));
            }

            let params = match self.scaler_type {
                ScalerType::MinMax => {
                    let min = ca.min().unwrap_or(0.0);
                    let max = ca.max().unwrap_or(1.0);
                    let range = max - min;
                    ScalerParams {
                        center: min,
                        // constant column: map everything to 0 instead of dividing by zero
                        scale: if range == 0.0 { 1.0 } else { range },
                    }
                }
                ScalerType::Standard => {
                    let mean = ca.mean().unwrap_or(0.0);
                    let std = ca.std(1).unwrap_or(1.0);
                    ScalerParams {
                        center: mean,
                        scale: if std == 0.0 { 1.0 } else { std },
                    }
                }
            };
            self.params.insert(name.clone(), params);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Rescale the fitted columns, leaving every other column untouched.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(StrokeMlError::ModelNotFitted);
        }

        let mut replacements = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            let params = &self.params[name];
            let column = df
                .column(name)
                .map_err(|_| StrokeMlError::FeatureNotFound(name.clone()))?;
            let series = column.as_materialized_series().cast(&DataType::Float64)?;
            let ca = series.f64()?;

            let scaled: Float64Chunked = ca
                .into_iter()
                .map(|opt| opt.map(|v| (v - params.center) / params.scale))
                .collect();
            replacements.push(scaled.with_name(name.as_str().into()).into_series());
        }

        let mut result = df.clone();
        for scaled in replacements {
            result.with_column(scaled)?;
        }
        Ok(result)
    }

    /// Fit and transform in one step.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }
}
