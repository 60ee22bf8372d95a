//! Dataset loading and schema.
//!
//! The raw table is a delimited file with a fixed header; missing
//! body-mass-index entries are written as a placeholder token (`"N/A"` in
//! the source data). Loading produces a [`polars::prelude::DataFrame`];
//! the trainer boundary converts frames into `ndarray` matrices.

use crate::error::{Result, StrokeMlError};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Column names of the stroke screening table.
pub mod schema {
    /// Patient identifier; carries no predictive signal and is removed
    /// before any model sees the data.
    pub const ID: &str = "id";
    pub const GENDER: &str = "gender";
    pub const AGE: &str = "age";
    pub const HYPERTENSION: &str = "hypertension";
    pub const HEART_DISEASE: &str = "heart_disease";
    pub const EVER_MARRIED: &str = "ever_married";
    pub const WORK_TYPE: &str = "work_type";
    pub const RESIDENCE_TYPE: &str = "Residence_type";
    pub const AVG_GLUCOSE_LEVEL: &str = "avg_glucose_level";
    pub const BMI: &str = "bmi";
    pub const SMOKING_STATUS: &str = "smoking_status";
    /// Binary outcome column: 0 = no stroke, 1 = stroke.
    pub const STROKE: &str = "stroke";

    /// Categorical columns expanded into indicator columns.
    pub const CATEGORICAL: [&str; 5] = [
        GENDER,
        EVER_MARRIED,
        WORK_TYPE,
        RESIDENCE_TYPE,
        SMOKING_STATUS,
    ];

    /// Continuous columns rescaled onto [0, 1].
    pub const CONTINUOUS: [&str; 3] = [AGE, AVG_GLUCOSE_LEVEL, BMI];
}

/// Loader for the raw delimited table.
pub struct DatasetLoader {
    delimiter: u8,
    null_token: String,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            null_token: "N/A".to_string(),
        }
    }

    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the token recognized as a missing value.
    pub fn with_null_token(mut self, token: impl Into<String>) -> Self {
        self.null_token = token.into();
        self
    }

    /// Load a delimited file with a header row.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = File::open(path.as_ref())
            .map_err(|e| StrokeMlError::Data(format!("{}: {e}", path.as_ref().display())))?;

        let parse_opts = CsvParseOptions::default()
            .with_separator(self.delimiter)
            .with_null_values(Some(NullValues::AllColumnsSingle(
                self.null_token.as_str().into(),
            )));

        let reader = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file);

        reader.finish().map_err(StrokeMlError::from)
    }
}

/// Extract the feature matrix and label vector from an encoded frame.
///
/// Every column except `target` becomes a feature, in frame order. Returns
/// the matrix, the labels, and the feature names backing each matrix column.
pub fn to_feature_matrix(
    df: &DataFrame,
    target: &str,
) -> Result<(Array2<f64>, Array1<f64>, Vec<String>)> {
    let feature_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != target)
        .map(|s| s.to_string())
        .collect();

    let y = column_to_f64(df, target)?;
    let x = columns_to_array2(df, &feature_names)?;

    Ok((x, Array1::from_vec(y), feature_names))
}

/// Pull one column out as a dense f64 vector, casting if needed.
///
/// A null anywhere is an error: matrix extraction runs after cleaning, so
/// missing values at this point mean the pipeline was wired wrong.
pub fn column_to_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df
        .column(name)
        .map_err(|_| StrokeMlError::FeatureNotFound(name.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                StrokeMlError::Data(format!("null value in column '{name}' at row {i}"))
            })
        })
        .collect()
}

/// Extract named columns into a row-major `Array2<f64>`.
fn columns_to_array2(df: &DataFrame, names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = names.len();

    let col_data: Vec<Vec<f64>> = names
        .iter()
        .map(|name| column_to_f64(df, name))
        .collect::<Result<Vec<_>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_with_null_token() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,gender,age,bmi,stroke").unwrap();
        writeln!(file, "1,Male,67,36.6,1").unwrap();
        writeln!(file, "2,Female,61,N/A,0").unwrap();
        writeln!(file, "3,Female,49,34.4,0").unwrap();
        file.flush().unwrap();

        let df = DatasetLoader::new().load(file.path()).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.column("bmi").unwrap().null_count(), 1);
        // "N/A" forces no string fallback: the rest of the column is numeric
        assert_eq!(df.column("bmi").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_load_with_custom_delimiter_and_token() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id;bmi;stroke").unwrap();
        writeln!(file, "1;36.6;1").unwrap();
        writeln!(file, "2;?;0").unwrap();
        file.flush().unwrap();

        let df = DatasetLoader::new()
            .with_delimiter(b';')
            .with_null_token("?")
            .load(file.path())
            .unwrap();
        assert_eq!(df.width(), 3);
        assert_eq!(df.column("bmi").unwrap().null_count(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = DatasetLoader::new().load("no/such/file.csv").unwrap_err();
        assert!(err.to_string().contains("no/such/file.csv"));
    }

    #[test]
    fn test_to_feature_matrix() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0],
            "b" => &[0.5, 0.25, 0.125],
            "stroke" => &[0i64, 1, 0]
        )
        .unwrap();

        let (x, y, names) = to_feature_matrix(&df, "stroke").unwrap();
        assert_eq!(x.dim(), (3, 2));
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(y.to_vec(), vec![0.0, 1.0, 0.0]);
        assert_eq!(x[[2, 0]], 3.0);
        assert_eq!(x[[1, 1]], 0.25);
    }

    #[test]
    fn test_matrix_extraction_rejects_nulls() {
        let df = df!(
            "a" => &[Some(1.0), None, Some(3.0)],
            "stroke" => &[0i64, 1, 0]
        )
        .unwrap();

        assert!(to_feature_matrix(&df, "stroke").is_err());
    }
}
