//! Categorical indicator encoding.
//!
//! `fit` enumerates the category domain of each designated column (sorted
//! distinct observed values) as an explicit schema; `transform` replaces
//! each column with one indicator column per category, named
//! `{column}_{value}`. A value outside the fitted schema is an error, so
//! train and test frames always carry identical column sets.

use crate::error::{Result, StrokeMlError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    categories: HashMap<String, Vec<String>>,
    is_fitted: bool,
}

impl OneHotEncoder {
    /// Create an encoder for the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            categories: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Enumerate the category domain of every designated column.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.categories.clear();

        for name in &self.columns {
            let column = df
                .column(name)
                .map_err(|_| StrokeMlError::FeatureNotFound(name.clone()))?;
            let values = column.as_materialized_series().str().map_err(|_| {
                StrokeMlError::Validation(format!(
                    "column '{name}' is not a string column and cannot be one-hot encoded"
                ))
            })?;

            let mut distinct = BTreeSet::new();
            for v in values.into_iter() {
                match v {
                    Some(v) => {
                        distinct.insert(v.to_string());
                    }
                    None => {
                        return Err(StrokeMlError::Data(format!(
                            "column '{name}' contains missing values; clean before encoding"
                        )))
                    }
                }
            }
            if distinct.is_empty() {
                return Err(StrokeMlError::Validation(format!(
                    "column '{name}' has no observed categories"
                )));
            }

            self.categories
                .insert(name.clone(), distinct.into_iter().collect());
        }

        self.is_fitted = true;
        debug!(
            columns = self.columns.len(),
            indicators = self.indicator_columns().len(),
            "fitted category schema"
        );
        Ok(self)
    }

    /// Replace every designated column with its indicator columns.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(StrokeMlError::ModelNotFitted);
        }

        let mut result = df.clone();

        for name in &self.columns {
            let cats = &self.categories[name];
            let indicators = {
                let column = result
                    .column(name)
                    .map_err(|_| StrokeMlError::FeatureNotFound(name.clone()))?;
                let values = column.as_materialized_series().str().map_err(|_| {
                    StrokeMlError::Validation(format!("column '{name}' is not a string column"))
                })?;

                for v in values.into_iter().flatten() {
                    if !cats.iter().any(|c| c == v) {
                        return Err(StrokeMlError::Validation(format!(
                            "category '{v}' in column '{name}' is not in the fitted schema"
                        )));
                    }
                }

                cats.iter()
                    .map(|cat| {
                        let flags: Vec<f64> = values
                            .into_iter()
                            .map(|v| if v == Some(cat.as_str()) { 1.0 } else { 0.0 })
                            .collect();
                        Column::new(format!("{name}_{cat}").into(), flags)
                    })
                    .collect::<Vec<_>>()
            };

            for indicator in indicators {
                result.with_column(indicator)?;
            }
            result = result.drop(name)?;
        }

        Ok(result)
    }

    /// Fit and transform in one step.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Fitted category domain for one column.
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.categories.get(column).map(|c| c.as_slice())
    }

    /// Names of all indicator columns `transform` emits, in emission order.
    pub fn indicator_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|name| {
                self.categories
                    .get(name)
                    .into_iter()
                    .flatten()
                    .map(move |cat| format!("{name}_{cat}"))
            })
            .collect()
    }
}
