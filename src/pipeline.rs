//! End-to-end orchestration.
//!
//! One forward pass: clean → encode → correlate → split → rescale →
//! train/evaluate each configured model. Preprocessing failures abort the
//! run; a failing model variant is recorded and its siblings continue.

use crate::data::{schema, to_feature_matrix, DatasetLoader};
use crate::error::Result;
use crate::evaluation::{evaluate, ConfusionMatrix};
use crate::preprocessing::{
    split_frame, train_test_split, CleanSummary, Cleaner, OneHotEncoder, Scaler, ScalerType,
};
use crate::stats::{outcome_correlations, FeatureCorrelation};
use crate::training::{
    select_k, Classifier, GaussianNaiveBayes, KnnClassifier, SvmClassifier, SvmConfig,
};
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// The model families the pipeline trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    NearestNeighbor,
    Svm,
    NaiveBayes,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::NearestNeighbor => "nearest-neighbor",
            ModelKind::Svm => "svm",
            ModelKind::NaiveBayes => "naive-bayes",
        };
        f.write_str(name)
    }
}

/// Full pipeline configuration. The default mirrors the stroke screening
/// setup: 0.8/0.2 split at seed 3333, k searched over 1..=30 with 5-fold
/// cross-validation, fixed-C linear SVM, min-max rescaling fitted on the
/// training subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub target: String,
    pub id_column: Option<String>,
    pub continuous: Vec<String>,
    pub categorical: Vec<String>,
    /// Columns coerced from text to numeric during cleaning.
    pub coerce_numeric: Vec<String>,
    pub train_fraction: f64,
    pub seed: u64,
    pub cv_folds: usize,
    pub knn_k_candidates: Vec<usize>,
    pub svm: SvmConfig,
    pub scaler_type: ScalerType,
    /// Fit rescaling statistics on the full encoded frame before splitting
    /// instead of on the training subset. Matches the original analysis,
    /// which lets test-set extremes into the scaling parameters; off by
    /// default.
    pub scale_on_full_dataset: bool,
    pub models: Vec<ModelKind>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target: schema::STROKE.to_string(),
            id_column: Some(schema::ID.to_string()),
            continuous: schema::CONTINUOUS.iter().map(|s| s.to_string()).collect(),
            categorical: schema::CATEGORICAL.iter().map(|s| s.to_string()).collect(),
            coerce_numeric: vec![schema::BMI.to_string()],
            train_fraction: 0.8,
            seed: 3333,
            cv_folds: 5,
            knn_k_candidates: (1..=30).collect(),
            svm: SvmConfig::default(),
            scaler_type: ScalerType::MinMax,
            scale_on_full_dataset: false,
            models: vec![
                ModelKind::NearestNeighbor,
                ModelKind::Svm,
                ModelKind::NaiveBayes,
            ],
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_train_fraction(mut self, fraction: f64) -> Self {
        self.train_fraction = fraction;
        self
    }

    pub fn with_models(mut self, models: Vec<ModelKind>) -> Self {
        self.models = models;
        self
    }

    pub fn with_knn_k_candidates(mut self, candidates: Vec<usize>) -> Self {
        self.knn_k_candidates = candidates;
        self
    }
}

/// Scores of one trained model variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReport {
    pub model: ModelKind,
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Cross-validated neighbor count (nearest-neighbor variant only).
    pub selected_k: Option<usize>,
}

impl ModelReport {
    fn from_confusion(model: ModelKind, confusion: ConfusionMatrix, selected_k: Option<usize>) -> Self {
        Self {
            model,
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            confusion,
            selected_k,
        }
    }
}

/// A model variant that could not be trained. Recorded instead of
/// aborting the run: sibling variants do not share its failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFailure {
    pub model: ModelKind,
    pub error: String,
}

/// Everything the pipeline hands to the reporting layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub clean: CleanSummary,
    pub feature_names: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub correlations: Vec<FeatureCorrelation>,
    pub models: Vec<ModelReport>,
    pub failures: Vec<ModelFailure>,
}

/// The assembled pipeline.
#[derive(Debug, Clone)]
pub struct StrokePipeline {
    config: PipelineConfig,
}

impl Default for StrokePipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl StrokePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a delimited file and run on it.
    pub fn run_csv(&self, path: impl AsRef<Path>) -> Result<PipelineReport> {
        let df = DatasetLoader::new().load(path)?;
        self.run(&df)
    }

    /// Run the full pass over an already-loaded raw frame.
    pub fn run(&self, raw: &DataFrame) -> Result<PipelineReport> {
        let cfg = &self.config;

        let cleaner = Cleaner::new()
            .with_id_column(cfg.id_column.clone())
            .with_coerce_numeric(cfg.coerce_numeric.clone())
            .with_categorical_columns(cfg.categorical.clone());
        let (cleaned, clean_summary) = cleaner.clean(raw)?;

        let mut encoder = OneHotEncoder::new(cfg.categorical.clone());
        let encoded = encoder.fit_transform(&cleaned)?;

        let correlations = outcome_correlations(&encoded, &cfg.target)?;

        let split = train_test_split(encoded.height(), cfg.train_fraction, cfg.seed)?;
        let (train_df, test_df) = split_frame(&encoded, &split)?;

        let mut scaler = Scaler::new(cfg.scaler_type, cfg.continuous.clone());
        if cfg.scale_on_full_dataset {
            scaler.fit(&encoded)?;
        } else {
            scaler.fit(&train_df)?;
        }
        let train_df = scaler.transform(&train_df)?;
        let test_df = scaler.transform(&test_df)?;

        let (x_train, y_train, feature_names) = to_feature_matrix(&train_df, &cfg.target)?;
        let (x_test, y_test, _) = to_feature_matrix(&test_df, &cfg.target)?;

        info!(
            rows = clean_summary.rows_out,
            features = feature_names.len(),
            train_rows = x_train.nrows(),
            test_rows = x_test.nrows(),
            "dataset prepared"
        );

        let mut models = Vec::new();
        let mut failures = Vec::new();

        for &kind in &cfg.models {
            match self.train_and_evaluate(kind, &x_train, &y_train, &x_test, &y_test) {
                Ok(report) => {
                    info!(model = %kind, accuracy = report.accuracy, "model evaluated");
                    models.push(report);
                }
                Err(err) => {
                    warn!(model = %kind, error = %err, "model training failed");
                    failures.push(ModelFailure {
                        model: kind,
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(PipelineReport {
            clean: clean_summary,
            feature_names,
            train_rows: x_train.nrows(),
            test_rows: x_test.nrows(),
            correlations,
            models,
            failures,
        })
    }

    fn train_and_evaluate(
        &self,
        kind: ModelKind,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<ModelReport> {
        let cfg = &self.config;

        match kind {
            ModelKind::NearestNeighbor => {
                let selection = select_k(
                    x_train,
                    y_train,
                    &cfg.knn_k_candidates,
                    cfg.cv_folds,
                    cfg.seed,
                )?;
                let mut model = KnnClassifier::with_k(selection.k);
                model.fit(x_train, y_train)?;
                let confusion = evaluate(&model, x_test, y_test)?;
                Ok(ModelReport::from_confusion(
                    kind,
                    confusion,
                    Some(selection.k),
                ))
            }
            ModelKind::Svm => {
                let mut model = SvmClassifier::new(cfg.svm.clone());
                model.fit(x_train, y_train)?;
                let confusion = evaluate(&model, x_test, y_test)?;
                Ok(ModelReport::from_confusion(kind, confusion, None))
            }
            ModelKind::NaiveBayes => {
                let mut model = GaussianNaiveBayes::new();
                model.fit(x_train, y_train)?;
                let confusion = evaluate(&model, x_test, y_test)?;
                Ok(ModelReport::from_confusion(kind, confusion, None))
            }
        }
    }
}
