//! Data quality issue models.
//!
//! Issues carry counts and percentages only, never cell values.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Column sentinel for issues that concern whole rows.
pub const ALL_COLUMNS: &str = "all_columns";

/// Severity of a quality issue or explanation reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Rule that produced an issue, with its rule-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IssueKind {
    /// Null or non-finite cells in a column
    MissingValues,
    /// Rows identical to an earlier row
    DuplicateRows,
    /// Text column whose values all parse as numbers
    DataTypeMismatch {
        current_type: String,
        suggested_type: String,
    },
    /// Values beyond a z-score threshold
    Outliers { method: String, threshold: f64 },
}

impl IssueKind {
    /// Stable name of the rule, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            IssueKind::MissingValues => "missing_values",
            IssueKind::DuplicateRows => "duplicate_rows",
            IssueKind::DataTypeMismatch { .. } => "data_type_mismatch",
            IssueKind::Outliers { .. } => "outliers",
        }
    }
}

/// One quality rule violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    #[serde(flatten)]
    pub kind: IssueKind,
    /// Affected column, or [`ALL_COLUMNS`]
    pub column: String,
    /// Number of affected cells or rows
    pub count: u64,
    /// `count` as a percentage of all rows
    pub percentage: f64,
    pub severity: Severity,
}

impl QualityIssue {
    /// Creates an issue, computing the percentage against `total_rows`.
    pub fn new(
        kind: IssueKind,
        column: impl Into<String>,
        count: u64,
        total_rows: usize,
        severity: Severity,
    ) -> Self {
        Self {
            kind,
            column: column.into(),
            count,
            percentage: percentage_of(count, total_rows),
            severity,
        }
    }
}

/// `count` as a percentage of `total`, 0 when `total` is zero.
pub(crate) fn percentage_of(count: u64, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Issue counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Aggregate view of the quality issues found in a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub total_rows: usize,
    pub total_columns: usize,
    pub total_issues: usize,
    /// Distinct rule names, sorted
    pub issue_types: Vec<String>,
    /// Distinct affected columns, sorted
    pub columns_with_issues: Vec<String>,
    pub severity_counts: SeverityCounts,
}

impl QualitySummary {
    /// Summarises `issues` found in a dataset of the given shape.
    pub fn new(total_rows: usize, total_columns: usize, issues: &[QualityIssue]) -> Self {
        let issue_types: BTreeSet<&str> = issues.iter().map(|i| i.kind.name()).collect();
        let columns: BTreeSet<&str> = issues.iter().map(|i| i.column.as_str()).collect();

        let mut severity_counts = SeverityCounts::default();
        for issue in issues {
            match issue.severity {
                Severity::High => severity_counts.high += 1,
                Severity::Medium => severity_counts.medium += 1,
                Severity::Low => severity_counts.low += 1,
            }
        }

        Self {
            total_rows,
            total_columns,
            total_issues: issues.len(),
            issue_types: issue_types.into_iter().map(String::from).collect(),
            columns_with_issues: columns.into_iter().map(String::from).collect(),
            severity_counts,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_serializes_flat_with_type_tag() {
        let issue = QualityIssue::new(
            IssueKind::Outliers {
                method: "z_score".to_string(),
                threshold: 3.0,
            },
            "amount",
            4,
            100,
            Severity::Low,
        );

        let json = serde_json::to_value(&issue).unwrap();

        assert_eq!(json["type"], "outliers");
        assert_eq!(json["method"], "z_score");
        assert_eq!(json["threshold"], 3.0);
        assert_eq!(json["column"], "amount");
        assert_eq!(json["count"], 4);
        assert_eq!(json["percentage"], 4.0);
        assert_eq!(json["severity"], "low");
    }

    #[test]
    fn test_issue_deserializes() {
        let issue: QualityIssue = serde_json::from_str(
            r#"{"type":"duplicate_rows","column":"all_columns","count":2,"percentage":10.0,"severity":"medium"}"#,
        )
        .unwrap();

        assert_eq!(issue.kind, IssueKind::DuplicateRows);
        assert_eq!(issue.column, ALL_COLUMNS);
        assert_eq!(issue.severity, Severity::Medium);
    }

    #[test]
    fn test_percentage_of_empty_total() {
        assert_eq!(percentage_of(3, 0), 0.0);
        assert_eq!(percentage_of(1, 4), 25.0);
    }

    #[test]
    fn test_summary_counts() {
        let issues = vec![
            QualityIssue::new(IssueKind::MissingValues, "b", 6, 10, Severity::High),
            QualityIssue::new(IssueKind::MissingValues, "a", 2, 10, Severity::Medium),
            QualityIssue::new(IssueKind::DuplicateRows, ALL_COLUMNS, 1, 10, Severity::Low),
        ];

        let summary = QualitySummary::new(10, 3, &issues);

        assert_eq!(summary.total_issues, 3);
        assert_eq!(summary.issue_types, ["duplicate_rows", "missing_values"]);
        assert_eq!(summary.columns_with_issues, ["a", "all_columns", "b"]);
        assert_eq!(
            summary.severity_counts,
            SeverityCounts {
                high: 1,
                medium: 1,
                low: 1
            }
        );
    }
}
