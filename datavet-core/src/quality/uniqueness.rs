//! Duplicate row rule.

use std::collections::HashSet;

use crate::config::QualityRuleConfig;
use crate::dataset::{CellValue, Dataset};

use super::models::{ALL_COLUMNS, IssueKind, QualityIssue, Severity, percentage_of};

/// Reports rows that repeat an earlier row across every column.
///
/// The first occurrence is not counted. Severity is medium above
/// `duplicate_medium_pct`, low otherwise.
pub fn check_duplicate_rows(dataset: &Dataset, config: &QualityRuleConfig) -> Vec<QualityIssue> {
    let duplicates = count_duplicate_rows(dataset.rows());
    if duplicates == 0 {
        return Vec::new();
    }

    let total_rows = dataset.row_count();
    let severity = if percentage_of(duplicates, total_rows) > config.duplicate_medium_pct {
        Severity::Medium
    } else {
        Severity::Low
    };

    vec![QualityIssue::new(
        IssueKind::DuplicateRows,
        ALL_COLUMNS,
        duplicates,
        total_rows,
        severity,
    )]
}

/// Hashable form of a cell.
///
/// Non-finite numbers collapse to `Null` and `-0.0` to `0.0`, so cells that
/// compare equal as values produce equal keys.
#[derive(Debug, PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Null,
    Boolean(bool),
    Number(u64),
    Text(&'a str),
}

impl<'a> From<&'a CellValue> for CellKey<'a> {
    fn from(cell: &'a CellValue) -> Self {
        match cell {
            CellValue::Null => CellKey::Null,
            CellValue::Boolean(b) => CellKey::Boolean(*b),
            CellValue::Number(v) if !v.is_finite() => CellKey::Null,
            CellValue::Number(v) if *v == 0.0 => CellKey::Number(0.0f64.to_bits()),
            CellValue::Number(v) => CellKey::Number(v.to_bits()),
            CellValue::Text(s) => CellKey::Text(s),
        }
    }
}

/// Counts rows whose full content was already seen.
fn count_duplicate_rows(rows: &[Vec<CellValue>]) -> u64 {
    let mut seen_rows: HashSet<Vec<CellKey<'_>>> = HashSet::new();
    let mut duplicate_count: u64 = 0;

    for row in rows {
        if !seen_rows.insert(row.iter().map(CellKey::from).collect()) {
            duplicate_count += 1;
        }
    }

    duplicate_count
}
