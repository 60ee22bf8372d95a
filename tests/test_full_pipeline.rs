//! Integration test: full pass (load → clean → encode → split → train → score).

use polars::prelude::*;
use std::io::Write;
use strokeml::pipeline::{ModelKind, PipelineConfig, StrokePipeline};

/// A miniature of the screening table: 120 regular rows plus one row with
/// a gender value that occurs nowhere else. Rows 5 and 20 are missing the
/// body-mass index. Outcome-positive rows sit in a clearly older /
/// higher-glucose region so the fitted models have signal to find.
fn synthetic_raw_frame() -> DataFrame {
    let n = 120usize;
    let mut id = Vec::new();
    let mut gender = Vec::new();
    let mut age = Vec::new();
    let mut hypertension = Vec::new();
    let mut heart_disease = Vec::new();
    let mut ever_married = Vec::new();
    let mut work_type = Vec::new();
    let mut residence_type = Vec::new();
    let mut avg_glucose_level = Vec::new();
    let mut bmi: Vec<Option<f64>> = Vec::new();
    let mut smoking_status = Vec::new();
    let mut stroke = Vec::new();

    for i in 0..n {
        let positive = i % 3 == 0;
        id.push((i + 1) as i64);
        gender.push(if i % 2 == 0 { "Male" } else { "Female" });
        age.push(if positive {
            68.0 + (i % 10) as f64
        } else {
            32.0 + (i % 12) as f64
        });
        hypertension.push((i % 5 == 0) as i64);
        heart_disease.push((i % 7 == 0) as i64);
        ever_married.push(if i % 4 < 2 { "Yes" } else { "No" });
        work_type.push(["Private", "Self-employed", "Govt_job", "children"][i % 4]);
        residence_type.push(if (i / 2) % 2 == 0 { "Urban" } else { "Rural" });
        avg_glucose_level.push(if positive {
            190.0 + (i % 30) as f64
        } else {
            85.0 + (i % 25) as f64
        });
        bmi.push(if i == 5 || i == 20 {
            None
        } else {
            Some(22.0 + (i % 14) as f64 * 0.9)
        });
        smoking_status.push(["never smoked", "formerly smoked", "smokes"][i % 3]);
        stroke.push(positive as i64);
    }

    id.push((n + 1) as i64);
    gender.push("Other");
    age.push(45.0);
    hypertension.push(0);
    heart_disease.push(0);
    ever_married.push("Yes");
    work_type.push("Private");
    residence_type.push("Urban");
    avg_glucose_level.push(100.0);
    bmi.push(Some(27.5));
    smoking_status.push("never smoked");
    stroke.push(0);

    df!(
        "id" => &id,
        "gender" => &gender,
        "age" => &age,
        "hypertension" => &hypertension,
        "heart_disease" => &heart_disease,
        "ever_married" => &ever_married,
        "work_type" => &work_type,
        "Residence_type" => &residence_type,
        "avg_glucose_level" => &avg_glucose_level,
        "bmi" => &bmi,
        "smoking_status" => &smoking_status,
        "stroke" => &stroke
    )
    .unwrap()
}

fn pipeline() -> StrokePipeline {
    // trimmed candidate range keeps the cross-validation quick
    StrokePipeline::new(PipelineConfig::new().with_knn_k_candidates((1..=10).collect()))
}

#[test]
fn test_full_run_cleans_trains_and_scores() {
    let raw = synthetic_raw_frame();
    let report = pipeline().run(&raw).unwrap();

    // cleaning: 121 in, 2 missing-bmi rows and the lone "Other" gender out
    assert_eq!(report.clean.rows_in, 121);
    assert_eq!(report.clean.rows_dropped_missing, 2);
    assert_eq!(report.clean.rows_dropped_rare_category, 1);
    assert_eq!(report.clean.rows_out, 118);

    // 0.8/0.2 split of 118 rows
    assert_eq!(report.train_rows, 94);
    assert_eq!(report.test_rows, 24);

    // 2 gender + 2 ever_married + 4 work_type + 2 residence + 3 smoking
    // indicators, plus age/glucose/bmi and the two 0/1 flags
    assert_eq!(report.feature_names.len(), 18);

    // every variant trained; none failed
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.models.len(), 3);

    for model in &report.models {
        // confusion cells always account for every test row
        assert_eq!(model.confusion.total(), report.test_rows);
        let expected_accuracy = (model.confusion.true_positives()
            + model.confusion.true_negatives()) as f64
            / model.confusion.total() as f64;
        assert!((model.accuracy - expected_accuracy).abs() < 1e-12);
    }

    // the separable synthetic data must be learnable well beyond the
    // majority-class baseline (~0.66 here)
    let knn = report
        .models
        .iter()
        .find(|m| m.model == ModelKind::NearestNeighbor)
        .unwrap();
    assert!(knn.selected_k.is_some());
    assert!(knn.accuracy >= 0.9, "knn accuracy {}", knn.accuracy);

    for model in &report.models {
        assert!(model.accuracy > 0.75, "{} at {}", model.model, model.accuracy);
    }
}

#[test]
fn test_correlations_surface_the_informative_features() {
    let raw = synthetic_raw_frame();
    let report = pipeline().run(&raw).unwrap();

    assert_eq!(report.correlations.len(), report.feature_names.len());
    for c in &report.correlations {
        assert!(c.r.is_finite());
        assert!((-1.0..=1.0).contains(&c.r));
    }

    // age and glucose drive the synthetic outcome; they should top the list
    let top: Vec<&str> = report
        .correlations
        .iter()
        .take(2)
        .map(|c| c.feature.as_str())
        .collect();
    assert!(top.contains(&"age"), "top correlations were {top:?}");
    assert!(top.contains(&"avg_glucose_level"), "top correlations were {top:?}");
}

#[test]
fn test_run_is_deterministic_for_a_fixed_seed() {
    let raw = synthetic_raw_frame();
    let a = pipeline().run(&raw).unwrap();
    let b = pipeline().run(&raw).unwrap();

    for (ma, mb) in a.models.iter().zip(b.models.iter()) {
        assert_eq!(ma.confusion, mb.confusion);
        assert_eq!(ma.selected_k, mb.selected_k);
    }
}

#[test]
fn test_reference_scaling_order_is_available() {
    let raw = synthetic_raw_frame();

    let mut config = PipelineConfig::new().with_knn_k_candidates((1..=10).collect());
    config.scale_on_full_dataset = true;
    let report = StrokePipeline::new(config).run(&raw).unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.models.len(), 3);
}

#[test]
fn test_single_class_outcome_fails_per_model_not_globally() {
    let mut raw = synthetic_raw_frame();
    // overwrite the outcome with a constant column
    let constant = Column::new("stroke".into(), vec![0i64; raw.height()]);
    raw.with_column(constant).unwrap();

    let report = pipeline().run(&raw).unwrap();

    // preprocessing succeeded; every trainer failed independently
    assert_eq!(report.models.len(), 0);
    assert_eq!(report.failures.len(), 3);
    for failure in &report.failures {
        assert!(
            failure.error.contains("class"),
            "unexpected error: {}",
            failure.error
        );
    }
}

#[test]
fn test_run_from_csv_with_missing_token() {
    let raw = synthetic_raw_frame();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "id,gender,age,hypertension,heart_disease,ever_married,work_type,\
         Residence_type,avg_glucose_level,bmi,smoking_status,stroke"
    )
    .unwrap();
    for row in 0..raw.height() {
        let bmi = raw
            .column("bmi")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .get(row)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let get_str = |name: &str| -> String {
            raw.column(name)
                .unwrap()
                .as_materialized_series()
                .str()
                .unwrap()
                .get(row)
                .unwrap()
                .to_string()
        };
        let get_i64 = |name: &str| -> i64 {
            raw.column(name)
                .unwrap()
                .as_materialized_series()
                .i64()
                .unwrap()
                .get(row)
                .unwrap()
        };
        let get_f64 = |name: &str| -> f64 {
            raw.column(name)
                .unwrap()
                .as_materialized_series()
                .f64()
                .unwrap()
                .get(row)
                .unwrap()
        };
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            get_i64("id"),
            get_str("gender"),
            get_f64("age"),
            get_i64("hypertension"),
            get_i64("heart_disease"),
            get_str("ever_married"),
            get_str("work_type"),
            get_str("Residence_type"),
            get_f64("avg_glucose_level"),
            bmi,
            get_str("smoking_status"),
            get_i64("stroke"),
        )
        .unwrap();
    }
    file.flush().unwrap();

    let report = pipeline().run_csv(file.path()).unwrap();
    assert_eq!(report.clean.rows_in, 121);
    assert_eq!(report.clean.rows_out, 118);
    assert_eq!(report.models.len(), 3);
}
