//! Integration tests for the data-preparation stages.

use polars::prelude::*;
use std::collections::HashSet;
use strokeml::preprocessing::{
    train_test_split, Cleaner, OneHotEncoder, Scaler, ScalerType,
};

fn raw_frame() -> DataFrame {
    let n = 40usize;
    let mut id = Vec::with_capacity(n + 1);
    let mut gender = Vec::with_capacity(n + 1);
    let mut age = Vec::with_capacity(n + 1);
    let mut work_type = Vec::with_capacity(n + 1);
    let mut bmi: Vec<Option<f64>> = Vec::with_capacity(n + 1);
    let mut stroke = Vec::with_capacity(n + 1);

    for i in 0..n {
        id.push((i + 1) as i64);
        gender.push(if i % 2 == 0 { "Male" } else { "Female" });
        age.push(25.0 + i as f64);
        work_type.push(["Private", "Self-employed", "Govt_job", "children"][i % 4]);
        bmi.push(if i == 3 || i == 17 {
            None
        } else {
            Some(21.0 + (i % 12) as f64)
        });
        stroke.push((i % 4 == 0) as i64);
    }

    // a category value that occurs exactly once in the whole table
    id.push((n + 1) as i64);
    gender.push("Other");
    age.push(45.0);
    work_type.push("Private");
    bmi.push(Some(28.0));
    stroke.push(0);

    df!(
        "id" => &id,
        "gender" => &gender,
        "age" => &age,
        "work_type" => &work_type,
        "bmi" => &bmi,
        "stroke" => &stroke
    )
    .unwrap()
}

fn cleaner() -> Cleaner {
    Cleaner::new()
        .with_categorical_columns(vec!["gender".to_string(), "work_type".to_string()])
}

#[test]
fn test_cleaning_drops_expected_rows() {
    let raw = raw_frame();
    let (cleaned, summary) = cleaner().clean(&raw).unwrap();

    assert_eq!(summary.rows_in, 41);
    assert_eq!(summary.rows_dropped_missing, 2);
    assert_eq!(summary.rows_dropped_rare_category, 1);
    assert_eq!(cleaned.height(), 38);

    assert!(cleaned.column("id").is_err());
    for col in cleaned.get_columns() {
        assert_eq!(col.null_count(), 0, "column {} still has nulls", col.name());
    }
}

#[test]
fn test_cleaning_is_idempotent() {
    let raw = raw_frame();
    let c = cleaner();
    let (once, _) = c.clean(&raw).unwrap();
    let (twice, summary) = c.clean(&once).unwrap();

    assert_eq!(once, twice);
    assert_eq!(summary.rows_dropped_missing, 0);
    assert_eq!(summary.rows_dropped_rare_category, 0);
}

#[test]
fn test_split_is_disjoint_exact_and_deterministic() {
    let split = train_test_split(1000, 0.8, 3333).unwrap();

    let train: HashSet<usize> = split.train_indices.iter().copied().collect();
    let test: HashSet<usize> = split.test_indices.iter().copied().collect();

    assert_eq!(train.len() + test.len(), 1000);
    assert!(train.is_disjoint(&test));
    let union: HashSet<usize> = train.union(&test).copied().collect();
    assert_eq!(union, (0..1000).collect::<HashSet<usize>>());

    // repeated runs with the same seed reproduce the partition exactly
    let again = train_test_split(1000, 0.8, 3333).unwrap();
    assert_eq!(split.train_indices, again.train_indices);
    assert_eq!(split.test_indices, again.test_indices);
}

#[test]
fn test_indicator_sums_equal_one_per_record() {
    let (cleaned, _) = cleaner().clean(&raw_frame()).unwrap();

    let mut encoder =
        OneHotEncoder::new(vec!["gender".to_string(), "work_type".to_string()]);
    let encoded = encoder.fit_transform(&cleaned).unwrap();

    for original in ["gender", "work_type"] {
        let cats: Vec<String> = encoder.categories(original).unwrap().to_vec();
        for row in 0..encoded.height() {
            let sum: f64 = cats
                .iter()
                .map(|cat| {
                    encoded
                        .column(&format!("{original}_{cat}"))
                        .unwrap()
                        .as_materialized_series()
                        .f64()
                        .unwrap()
                        .get(row)
                        .unwrap()
                })
                .sum();
            assert_eq!(sum, 1.0, "row {row} of {original}");
        }
    }
}

#[test]
fn test_rescaled_values_bounded_with_extremes_mapped() {
    let (cleaned, _) = cleaner().clean(&raw_frame()).unwrap();

    let mut scaler = Scaler::new(
        ScalerType::MinMax,
        vec!["age".to_string(), "bmi".to_string()],
    );
    let scaled = scaler.fit_transform(&cleaned).unwrap();

    for name in ["age", "bmi"] {
        let values: Vec<f64> = scaled
            .column(name)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();

        assert!(values.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(values.iter().any(|&v| v == 0.0), "{name} has no 0.0");
        assert!(values.iter().any(|&v| v == 1.0), "{name} has no 1.0");
    }
}
