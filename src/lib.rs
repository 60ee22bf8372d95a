//! strokeml - stroke outcome classification pipeline
//!
//! This crate turns the raw stroke-screening table into trained and scored
//! binary classifiers:
//! - [`data`] - CSV loading, the fixed dataset schema, matrix extraction
//! - [`preprocessing`] - cleaning, one-hot encoding, rescaling, splitting
//! - [`training`] - nearest-neighbor, SVM, and naive Bayes classifiers with
//!   seeded cross-validation
//! - [`evaluation`] - confusion matrix and derived scores
//! - [`stats`] - per-feature correlation against the outcome
//! - [`pipeline`] - end-to-end orchestration with per-model error isolation
//!
//! All stages run forward-only over an in-memory table; randomness (the
//! train/test split, cross-validation folds, the SMO working-pair picks) is
//! seeded through configuration so repeated runs are comparable.

pub mod error;

pub mod data;
pub mod evaluation;
pub mod pipeline;
pub mod preprocessing;
pub mod stats;
pub mod training;
