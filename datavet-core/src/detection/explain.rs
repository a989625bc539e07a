//! Per-row anomaly explanations.
//!
//! For each flagged row, lists the numeric columns where the row sits far
//! from the distribution of the unflagged rows.

use serde::{Deserialize, Serialize};

use super::models::AlignmentError;
use crate::config::ExplainConfig;
use crate::dataset::Dataset;
use crate::quality::Severity;
use crate::stats;

/// A column value that deviates from the normal rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReason {
    /// Deviating column
    pub column: String,
    /// The row's value in that column
    pub value: f64,
    /// Mean of the column over unflagged rows
    pub normal_mean: f64,
    /// Sample standard deviation of the column over unflagged rows
    pub normal_std: f64,
    /// Absolute standardized deviation from `normal_mean`
    pub z_score: f64,
    /// High above `high_severity_z_threshold`, medium otherwise
    pub severity: Severity,
}

/// Reasons a single flagged row was unusual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowExplanation {
    /// Source row index
    pub row_index: usize,
    /// Deviating columns, in dataset column order
    pub reasons: Vec<AnomalyReason>,
}

/// Totals over an explanation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationSummary {
    /// Flagged rows explained
    pub total_explained: usize,
    /// Numeric columns with a usable reference distribution
    pub columns_analyzed: usize,
}

/// Explanations for the first flagged rows of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyExplanations {
    /// One entry per explained row
    pub explanations: Vec<RowExplanation>,
    /// Totals over the run
    pub summary: ExplanationSummary,
}

/// Column statistics over the unflagged rows.
struct Reference<'a> {
    index: usize,
    name: &'a str,
    mean: f64,
    std: f64,
}

/// Explains up to `config.top_n` flagged rows, in row order.
///
/// Numeric columns whose unflagged values have no spread are skipped, as
/// are missing cells. A row with no deviating column still gets an entry
/// with an empty reason list. `flags` must hold one entry per dataset row.
pub fn explain(
    dataset: &Dataset,
    flags: &[bool],
    config: &ExplainConfig,
) -> Result<AnomalyExplanations, AlignmentError> {
    if flags.len() != dataset.row_count() {
        return Err(AlignmentError::FlagCount {
            flags: flags.len(),
            rows: dataset.row_count(),
        });
    }

    let references: Vec<Reference<'_>> = dataset
        .numeric_columns()
        .filter_map(|(index, column)| {
            let normal: Vec<f64> = dataset
                .column_values(index)
                .zip(flags)
                .filter(|&(_, &flagged)| !flagged)
                .filter_map(|(cell, _)| cell.as_number())
                .collect();
            let (mean, std) = stats::mean_and_sample_std(&normal)?;
            (std > 0.0).then_some(Reference {
                index,
                name: &column.name,
                mean,
                std,
            })
        })
        .collect();

    let explanations: Vec<RowExplanation> = dataset
        .rows()
        .iter()
        .zip(flags)
        .enumerate()
        .filter(|&(_, (_, &flagged))| flagged)
        .take(config.top_n)
        .map(|(row_index, (row, _))| {
            let reasons = references
                .iter()
                .filter_map(|reference| {
                    let value = row[reference.index].as_number()?;
                    let z_score = ((value - reference.mean) / reference.std).abs();
                    if z_score <= config.reason_z_threshold {
                        return None;
                    }
                    let severity = if z_score > config.high_severity_z_threshold {
                        Severity::High
                    } else {
                        Severity::Medium
                    };
                    Some(AnomalyReason {
                        column: reference.name.to_string(),
                        value,
                        normal_mean: reference.mean,
                        normal_std: reference.std,
                        z_score,
                        severity,
                    })
                })
                .collect();
            RowExplanation { row_index, reasons }
        })
        .collect();

    Ok(AnomalyExplanations {
        summary: ExplanationSummary {
            total_explained: explanations.len(),
            columns_analyzed: references.len(),
        },
        explanations,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_dataset(rows: Vec<serde_json::Value>) -> Dataset {
        Dataset::from_json_records(&rows).unwrap()
    }

    /// Twenty normal rows followed by two rows far out on "amount".
    fn dataset_with_spikes() -> (Dataset, Vec<bool>) {
        let mut rows: Vec<serde_json::Value> = (0..20)
            .map(|i| json!({"amount": 10.0 + (i % 5) as f64, "qty": (i % 3) as f64, "tag": "n"}))
            .collect();
        rows.push(json!({"amount": 100.0, "qty": 1.0, "tag": "x"}));
        rows.push(json!({"amount": 14.5, "qty": 1.0, "tag": "y"}));
        let mut flags = vec![false; 20];
        flags.extend([true, true]);
        (create_dataset(rows), flags)
    }

    #[test]
    fn test_explains_deviating_column() {
        let (dataset, flags) = dataset_with_spikes();

        let result = explain(&dataset, &flags, &ExplainConfig::default()).unwrap();

        assert_eq!(result.summary.total_explained, 2);
        assert_eq!(result.summary.columns_analyzed, 2);

        let first = &result.explanations[0];
        assert_eq!(first.row_index, 20);
        assert_eq!(first.reasons.len(), 1);
        let reason = &first.reasons[0];
        assert_eq!(reason.column, "amount");
        assert_eq!(reason.value, 100.0);
        assert!((reason.normal_mean - 12.0).abs() < 1e-12);
        assert!(reason.z_score > 3.0);
        assert_eq!(reason.severity, Severity::High);
    }

    #[test]
    fn test_flagged_row_without_deviation_has_no_reasons() {
        let (dataset, flags) = dataset_with_spikes();

        let result = explain(&dataset, &flags, &ExplainConfig::default()).unwrap();

        assert_eq!(result.explanations[1].row_index, 21);
        assert!(result.explanations[1].reasons.is_empty());
    }

    #[test]
    fn test_top_n_limits_rows() {
        let (dataset, flags) = dataset_with_spikes();
        let config = ExplainConfig {
            top_n: 1,
            ..ExplainConfig::default()
        };

        let result = explain(&dataset, &flags, &config).unwrap();

        assert_eq!(result.summary.total_explained, 1);
        assert_eq!(result.explanations[0].row_index, 20);
    }

    #[test]
    fn test_medium_severity_between_thresholds() {
        let mut rows: Vec<serde_json::Value> =
            (0..10).map(|i| json!({"x": if i % 2 == 0 { 0.0 } else { 2.0 }})).collect();
        // Normal mean 1, sample std ~1.054: z ~2.85
        rows.push(json!({"x": 4.0}));
        let mut flags = vec![false; 10];
        flags.push(true);

        let result = explain(&create_dataset(rows), &flags, &ExplainConfig::default()).unwrap();

        let reason = &result.explanations[0].reasons[0];
        assert!(reason.z_score > 2.0 && reason.z_score < 3.0);
        assert_eq!(reason.severity, Severity::Medium);
    }

    #[test]
    fn test_no_flags_no_explanations() {
        let (dataset, _) = dataset_with_spikes();
        let flags = vec![false; dataset.row_count()];

        let result = explain(&dataset, &flags, &ExplainConfig::default()).unwrap();

        assert!(result.explanations.is_empty());
        assert_eq!(result.summary.total_explained, 0);
    }

    #[test]
    fn test_low_value_reports_absolute_z_score() {
        let mut rows: Vec<serde_json::Value> =
            (0..10).map(|i| json!({"x": if i % 2 == 0 { 10.0 } else { 12.0 }})).collect();
        rows.push(json!({"x": -50.0}));
        let mut flags = vec![false; 10];
        flags.push(true);

        let result = explain(&create_dataset(rows), &flags, &ExplainConfig::default()).unwrap();

        let reason = &result.explanations[0].reasons[0];
        assert!(reason.value < reason.normal_mean);
        assert!(reason.z_score > 3.0);
        assert_eq!(reason.severity, Severity::High);
    }

    #[test]
    fn test_column_without_normal_spread_is_skipped() {
        let mut rows: Vec<serde_json::Value> = (0..10)
            .map(|i| json!({"flat": 5.0, "x": f64::from(i % 4)}))
            .collect();
        rows.push(json!({"flat": 500.0, "x": 40.0}));
        let mut flags = vec![false; 10];
        flags.push(true);

        let result = explain(&create_dataset(rows), &flags, &ExplainConfig::default()).unwrap();

        assert_eq!(result.summary.columns_analyzed, 1);
        let columns: Vec<&str> = result.explanations[0]
            .reasons
            .iter()
            .map(|r| r.column.as_str())
            .collect();
        assert_eq!(columns, ["x"]);
    }

    #[test]
    fn test_flag_count_mismatch_is_rejected() {
        let (dataset, mut flags) = dataset_with_spikes();
        flags.pop();

        let err = explain(&dataset, &flags, &ExplainConfig::default()).unwrap_err();

        assert_eq!(err, AlignmentError::FlagCount { flags: 21, rows: 22 });
    }
}
