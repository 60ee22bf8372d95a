//! Crate-wide error type and `Result` alias.

use thiserror::Error;

/// Errors produced by the pipeline and its components.
#[derive(Error, Debug)]
pub enum StrokeMlError {
    /// Cleaning could not produce a usable dataset (e.g. every row dropped).
    /// Aborts the whole pipeline: every trainer depends on the shared data.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// A training subset contains a single outcome class. Fatal for the
    /// trainer that hit it; sibling trainers are unaffected.
    #[error("Degenerate class distribution: {0}")]
    DegenerateClass(String),

    /// Cross-validation could not produce a valid hyperparameter candidate.
    #[error("Hyperparameter search failed: {0}")]
    HyperparameterSearch(String),

    /// DataFrame-level failure (parsing, casting, column ops).
    #[error("Data error: {0}")]
    Data(String),

    /// Invalid arguments or shape mismatches.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A named column is missing from the frame.
    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    /// `predict` was called before `fit`.
    #[error("Model has not been fitted")]
    ModelNotFitted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<polars::prelude::PolarsError> for StrokeMlError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        StrokeMlError::Data(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StrokeMlError>;
