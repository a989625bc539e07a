//! End-to-end validation tests.
//!
//! This test suite covers:
//! - Report assembly over mixed numeric and categorical data
//! - Quality rule outcomes on reference datasets
//! - Explanation reference statistics
//! - Degenerate inputs (zero rows, single row, no numeric columns)

#![allow(clippy::unwrap_used)]

use datavet_core::detection::{self, DetectionOutcome, FeatureMatrix, isolation};
use datavet_core::quality::{ALL_COLUMNS, IssueKind};
use datavet_core::stats;
use datavet_core::{
    Dataset, DetectorKind, IsolationForestConfig, Severity, ValidationConfig,
    ValidationOrchestrator, validate,
};
use serde_json::json;

fn create_dataset(rows: Vec<serde_json::Value>) -> Dataset {
    Dataset::from_json_records(&rows).unwrap()
}

/// Sales-like table: a smooth bulk plus a few extreme rows at the end.
fn sales_dataset() -> Dataset {
    let mut rows: Vec<serde_json::Value> = (0..120)
        .map(|i| {
            let t = f64::from(i);
            json!({
                "order_id": i,
                "amount": 50.0 + (t * 0.7).sin() * 10.0,
                "items": 3.0 + (t * 0.3).cos(),
                "channel": if i % 3 == 0 { "web" } else { "store" },
            })
        })
        .collect();
    rows.push(json!({"order_id": 120, "amount": 5000.0, "items": 3.0, "channel": "web"}));
    rows.push(json!({"order_id": 121, "amount": 51.0, "items": 90.0, "channel": "web"}));
    create_dataset(rows)
}

// =============================================================================
// Report assembly
// =============================================================================

#[test]
fn test_integration_report_over_mixed_data() {
    let dataset = sales_dataset();
    let config = ValidationConfig::new().with_explanations(10);

    let report = validate(&dataset, Some(&config)).unwrap();

    assert_eq!(report.summary.total_rows, 122);
    assert!(report.anomalies.flags[120]);
    assert!(report.anomalies.flags[121]);
    assert_eq!(
        report.anomalies.numeric_columns_analyzed,
        ["order_id", "amount", "items"]
    );
    assert_eq!(report.anomalies.methods_used, ["isolation_forest", "dbscan"]);
    for detector in &report.anomalies.detectors {
        assert!(matches!(detector.outcome, DetectionOutcome::Fitted { .. }));
    }

    let outlier_columns: Vec<&str> = report
        .quality_issues
        .iter()
        .filter(|i| matches!(i.kind, IssueKind::Outliers { .. }))
        .map(|i| i.column.as_str())
        .collect();
    assert_eq!(outlier_columns, ["amount", "items"]);
    assert!(!report.passed());

    let explanations = report.explanations.unwrap();
    let spike = explanations
        .explanations
        .iter()
        .find(|e| e.row_index == 120)
        .unwrap();
    assert_eq!(spike.reasons[0].column, "amount");
    assert_eq!(spike.reasons[0].severity, Severity::High);
}

#[test]
fn test_integration_report_serializes() {
    let report = validate(&sales_dataset(), None).unwrap();

    let json = serde_json::to_value(&report).unwrap();

    assert!(json["report_id"].is_string());
    assert!(json["validated_at"].is_string());
    assert_eq!(json["anomalies"]["flags"].as_array().unwrap().len(), 122);
    assert_eq!(json["anomalies"]["detectors"][0]["detector"], "isolation_forest");
    assert_eq!(json["anomalies"]["detectors"][0]["outcome"]["status"], "fitted");
    assert_eq!(
        json["anomalies"]["detectors"][1]["outcome"]["details"]["method"],
        "dbscan"
    );
    assert_eq!(json["quality_issues"][0]["type"], "outliers");
}

// =============================================================================
// Quality rule reference datasets
// =============================================================================

#[test]
fn test_integration_missing_values_sixty_percent() {
    let dataset = create_dataset(
        (0..100)
            .map(|i| {
                if i < 60 {
                    json!({"id": i, "email": null})
                } else {
                    json!({"id": i, "email": format!("user{i}@example.com")})
                }
            })
            .collect(),
    );

    let report = validate(&dataset, None).unwrap();

    let missing: Vec<_> = report
        .quality_issues
        .iter()
        .filter(|i| i.kind == IssueKind::MissingValues)
        .collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].column, "email");
    assert_eq!(missing[0].count, 60);
    assert_eq!(missing[0].percentage, 60.0);
    assert_eq!(missing[0].severity, Severity::High);
    assert_eq!(report.quality_summary.severity_counts.high, 1);
}

#[test]
fn test_integration_duplicate_rows_ten_percent() {
    let mut rows: Vec<serde_json::Value> = (0..18)
        .map(|i| json!({"sku": format!("SKU-{i}"), "bin": "A"}))
        .collect();
    rows.push(json!({"sku": "SKU-3", "bin": "A"}));
    rows.push(json!({"sku": "SKU-9", "bin": "A"}));

    let report = validate(&create_dataset(rows), None).unwrap();

    assert_eq!(report.quality_issues.len(), 1);
    let issue = &report.quality_issues[0];
    assert_eq!(issue.kind, IssueKind::DuplicateRows);
    assert_eq!(issue.column, ALL_COLUMNS);
    assert_eq!(issue.count, 2);
    assert_eq!(issue.percentage, 10.0);
    assert_eq!(issue.severity, Severity::Medium);
}

#[test]
fn test_integration_custom_duplicate_threshold() {
    let mut rows: Vec<serde_json::Value> = (0..18)
        .map(|i| json!({"sku": format!("SKU-{i}")}))
        .collect();
    rows.push(json!({"sku": "SKU-3"}));
    rows.push(json!({"sku": "SKU-9"}));
    let quality = datavet_core::QualityRuleConfig::new().with_duplicate_medium_pct(20.0);
    let config = ValidationConfig::new().with_quality(quality);

    let report = validate(&create_dataset(rows), Some(&config)).unwrap();

    assert_eq!(report.quality_issues[0].severity, Severity::Low);
}

// =============================================================================
// Explanations
// =============================================================================

#[test]
fn test_integration_explanation_uses_unflagged_reference() {
    let dataset = sales_dataset();
    let orchestrator =
        ValidationOrchestrator::new(ValidationConfig::new().with_explanations(50)).unwrap();

    let report = orchestrator.validate(&dataset).unwrap();
    let flags = &report.anomalies.flags;

    let amount = dataset.column_index("amount").unwrap();
    let normal: Vec<f64> = dataset
        .column_values(amount)
        .zip(flags)
        .filter(|&(_, &flagged)| !flagged)
        .filter_map(|(cell, _)| cell.as_number())
        .collect();
    let (mean, std) = stats::mean_and_sample_std(&normal).unwrap();

    let all: Vec<f64> = dataset.column_values(amount).filter_map(|c| c.as_number()).collect();
    let (full_mean, _) = stats::mean_and_sample_std(&all).unwrap();
    assert!((mean - full_mean).abs() > 1.0);

    let explanations = report.explanations.unwrap();
    let reason = explanations
        .explanations
        .iter()
        .flat_map(|e| &e.reasons)
        .find(|r| r.column == "amount")
        .unwrap();
    assert!((reason.normal_mean - mean).abs() < 1e-9);
    assert!((reason.normal_std - std).abs() < 1e-9);
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_integration_isolation_forest_idempotent() {
    let dataset = sales_dataset();
    let matrix: FeatureMatrix = detection::prepare(&dataset).unwrap();
    let config = IsolationForestConfig {
        contamination: 0.05,
        random_state: 7,
        ..IsolationForestConfig::default()
    };

    let first = isolation::fit_detect(&matrix, &config);
    let second = isolation::fit_detect(&matrix, &config);

    assert_eq!(first.flags, second.flags);
    assert_eq!(first.details(), second.details());
}

// =============================================================================
// Degenerate inputs
// =============================================================================

#[test]
fn test_integration_zero_rows() {
    let dataset = Dataset::from_json_value(&json!([])).unwrap();

    let report = validate(&dataset, None).unwrap();

    assert_eq!(report.summary.total_rows, 0);
    assert_eq!(report.anomalies.anomaly_rate, 0.0);
    assert!(report.anomalies.flags.is_empty());
    assert!(report.passed());
}

#[test]
fn test_integration_single_row() {
    let dataset = create_dataset(vec![json!({"a": 1.0, "b": 2.0, "c": "x"})]);

    let report = validate(&dataset, None).unwrap();

    assert_eq!(report.anomalies.flags, vec![false]);
    assert!(report.anomalies.detectors.is_empty());
    assert!(report.passed());
}

#[test]
fn test_integration_no_numeric_columns_depends_on_rules_only() {
    let clean = create_dataset(vec![json!({"name": "a"}), json!({"name": "b"})]);
    let dirty = create_dataset(vec![json!({"name": "a"}), json!({"name": null})]);

    let clean_report = validate(&clean, None).unwrap();
    let dirty_report = validate(&dirty, None).unwrap();

    assert_eq!(clean_report.summary.total_anomalies, 0);
    assert_eq!(dirty_report.summary.total_anomalies, 0);
    assert!(clean_report.passed());
    assert!(!dirty_report.passed());
}

#[test]
fn test_integration_wide_dataset_with_few_rows_degrades() {
    // Twelve varying features but only six rows: projection is impossible
    let rows: Vec<serde_json::Value> = (0..6)
        .map(|i| {
            let mut obj = serde_json::Map::new();
            for k in 0..12 {
                obj.insert(format!("f{k}"), json!(f64::from(i * (k + 1)) + f64::from(k % 3)));
            }
            serde_json::Value::Object(obj)
        })
        .collect();
    let dataset = create_dataset(rows);

    let report = validate(&dataset, None).unwrap();

    let density = report.anomalies.detector(DetectorKind::Dbscan).unwrap();
    assert!(density.is_degraded());
    assert_eq!(density.flags, vec![false; 6]);
    let forest = report.anomalies.detector(DetectorKind::IsolationForest).unwrap();
    assert!(!forest.is_degraded());
}

#[test]
fn test_integration_overflowing_values_degrade_both_detectors() {
    let rows: Vec<serde_json::Value> = (0..12)
        .map(|i| json!({"x": 1e308 + f64::from(i) * 1e306}))
        .collect();
    let dataset = create_dataset(rows);

    let report = validate(&dataset, None).unwrap();

    assert_eq!(report.anomalies.detectors.len(), 2);
    for detector in &report.anomalies.detectors {
        assert!(detector.is_degraded());
    }
    assert_eq!(report.anomalies.flags, vec![false; 12]);
    assert_eq!(report.summary.total_anomalies, 0);
    assert_eq!(report.summary.anomaly_rate, 0.0);
}
