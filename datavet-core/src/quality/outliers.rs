//! Statistical outlier rule.
//!
//! Flags numeric columns containing values far from the column mean,
//! measured in sample standard deviations.

use crate::config::QualityRuleConfig;
use crate::dataset::Dataset;
use crate::stats;

use super::models::{IssueKind, QualityIssue, Severity, percentage_of};

const METHOD: &str = "z_score";

/// Reports numeric columns with values beyond `outlier_z_threshold`.
///
/// Missing cells are ignored. Columns with fewer than two values or zero
/// spread are skipped. Severity is medium above `outlier_medium_pct`.
pub fn check_outliers(dataset: &Dataset, config: &QualityRuleConfig) -> Vec<QualityIssue> {
    let total_rows = dataset.row_count();

    dataset
        .numeric_columns()
        .filter_map(|(index, column)| {
            let values: Vec<f64> = dataset
                .column_values(index)
                .filter_map(|cell| cell.as_number())
                .collect();

            let (mean, std_dev) = stats::mean_and_sample_std(&values)?;
            if std_dev <= 0.0 {
                return None;
            }

            let outlier_count = values
                .iter()
                .filter(|&&value| ((value - mean) / std_dev).abs() > config.outlier_z_threshold)
                .count() as u64;
            if outlier_count == 0 {
                return None;
            }

            let severity = if percentage_of(outlier_count, total_rows) > config.outlier_medium_pct {
                Severity::Medium
            } else {
                Severity::Low
            };

            Some(QualityIssue::new(
                IssueKind::Outliers {
                    method: METHOD.to_string(),
                    threshold: config.outlier_z_threshold,
                },
                &column.name,
                outlier_count,
                total_rows,
                severity,
            ))
        })
        .collect()
}
