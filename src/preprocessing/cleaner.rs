//! Raw-table cleaning.
//!
//! Removes the identifier column, coerces text-typed numeric fields, drops
//! rows with missing values, and drops rows whose categorical value occurs
//! only once in the whole table. Cleaning the output again is a no-op.

use crate::error::{Result, StrokeMlError};
use crate::data::schema;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Row counts recorded while cleaning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CleanSummary {
    pub rows_in: usize,
    pub rows_dropped_missing: usize,
    pub rows_dropped_rare_category: usize,
    pub rows_out: usize,
}

/// Cleaner for the raw screening table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cleaner {
    /// Identifier column stripped before anything else.
    id_column: Option<String>,
    /// Columns coerced from text to numeric; unparseable entries become
    /// missing and their rows are dropped.
    coerce_numeric: Vec<String>,
    /// Categorical columns scanned for single-occurrence values.
    categorical_columns: Vec<String>,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self {
            id_column: Some(schema::ID.to_string()),
            coerce_numeric: vec![schema::BMI.to_string()],
            categorical_columns: schema::CATEGORICAL.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Cleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier column (`None` disables removal).
    pub fn with_id_column(mut self, column: Option<String>) -> Self {
        self.id_column = column;
        self
    }

    /// Set the columns coerced from text to numeric.
    pub fn with_coerce_numeric(mut self, columns: Vec<String>) -> Self {
        self.coerce_numeric = columns;
        self
    }

    /// Set the categorical columns scanned for rare values.
    pub fn with_categorical_columns(mut self, columns: Vec<String>) -> Self {
        self.categorical_columns = columns;
        self
    }

    /// Clean a raw frame. The input is not modified.
    ///
    /// Fails with [`StrokeMlError::DataIntegrity`] when no rows survive:
    /// a dataset that cleans down to nothing is a configuration problem,
    /// not something to paper over.
    pub fn clean(&self, df: &DataFrame) -> Result<(DataFrame, CleanSummary)> {
        let rows_in = df.height();
        let mut result = df.clone();

        // Identifier out first so it can never reach the feature space.
        // Absent column means the frame was already cleaned once.
        if let Some(id) = &self.id_column {
            if result.column(id).is_ok() {
                result = result.drop(id)?;
            }
        }

        for name in &self.coerce_numeric {
            let column = result
                .column(name)
                .map_err(|_| StrokeMlError::FeatureNotFound(name.clone()))?;
            if column.dtype() == &DataType::String {
                // Non-strict cast: entries that fail to parse become null
                // and are swept up by the missing-value drop below.
                let coerced = column
                    .as_materialized_series()
                    .cast(&DataType::Float64)?;
                result.with_column(coerced)?;
            }
        }

        let before_missing = result.height();
        result = Self::drop_missing_rows(&result)?;
        let rows_dropped_missing = before_missing - result.height();

        let before_rare = result.height();
        result = self.drop_rare_category_rows(&result)?;
        let rows_dropped_rare_category = before_rare - result.height();

        let rows_out = result.height();
        if rows_out == 0 {
            return Err(StrokeMlError::DataIntegrity(format!(
                "no rows left after cleaning ({rows_in} in, {rows_dropped_missing} dropped \
                 for missing values, {rows_dropped_rare_category} for rare categories)"
            )));
        }

        debug!(
            rows_in,
            rows_dropped_missing, rows_dropped_rare_category, rows_out, "cleaned dataset"
        );

        Ok((
            result,
            CleanSummary {
                rows_in,
                rows_dropped_missing,
                rows_dropped_rare_category,
                rows_out,
            },
        ))
    }

    /// Keep only rows with no null in any column.
    fn drop_missing_rows(df: &DataFrame) -> Result<DataFrame> {
        let mut keep = vec![true; df.height()];
        for col in df.get_columns() {
            if col.null_count() == 0 {
                continue;
            }
            let not_null = col.as_materialized_series().is_not_null();
            for (i, v) in (&not_null).into_iter().enumerate() {
                if !v.unwrap_or(false) {
                    keep[i] = false;
                }
            }
        }
        let mask = BooleanChunked::new("keep".into(), keep);
        Ok(df.filter(&mask)?)
    }

    /// Drop rows holding a categorical value that occurs exactly once.
    ///
    /// Iterates to a fixed point: removing a row can leave another value
    /// with a single occurrence, and cleaning must be idempotent.
    fn drop_rare_category_rows(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();

        loop {
            let mut keep = vec![true; result.height()];
            let mut any_dropped = false;

            for name in &self.categorical_columns {
                let Ok(column) = result.column(name) else {
                    continue;
                };
                if column.dtype() != &DataType::String {
                    continue;
                }
                let values = column.as_materialized_series().str()?;

                let mut counts: HashMap<String, usize> = HashMap::new();
                for v in values.into_iter().flatten() {
                    *counts.entry(v.to_string()).or_insert(0) += 1;
                }

                for (i, v) in values.into_iter().enumerate() {
                    if let Some(v) = v {
                        if counts.get(v).copied().unwrap_or(0) == 1 {
                            keep[i] = false;
                            any_dropped = true;
                        }
                    }
                }
            }

            if !any_dropped {
                return Ok(result);
            }

            let mask = BooleanChunked::new("keep".into(), keep);
            result = result.filter(&mask)?;
        }
    }
}
