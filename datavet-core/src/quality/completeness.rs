//! Missing value rule.
//!
//! Reports every column with at least one missing cell. Null, absent and
//! non-finite cells all count as missing.

use crate::config::QualityRuleConfig;
use crate::dataset::Dataset;

use super::models::{IssueKind, QualityIssue, Severity, percentage_of};

/// Checks each column for missing cells.
///
/// Severity is high above `missing_high_pct`, medium above
/// `missing_medium_pct`, low otherwise.
pub fn check_missing_values(dataset: &Dataset, config: &QualityRuleConfig) -> Vec<QualityIssue> {
    let total_rows = dataset.row_count();

    dataset
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(index, column)| {
            let missing = dataset
                .column_values(index)
                .filter(|cell| cell.is_null())
                .count() as u64;
            if missing == 0 {
                return None;
            }

            let pct = percentage_of(missing, total_rows);
            let severity = if pct > config.missing_high_pct {
                Severity::High
            } else if pct > config.missing_medium_pct {
                Severity::Medium
            } else {
                Severity::Low
            };

            Some(QualityIssue::new(
                IssueKind::MissingValues,
                &column.name,
                missing,
                total_rows,
                severity,
            ))
        })
        .collect()
}
