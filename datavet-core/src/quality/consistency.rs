//! Data type consistency rule.
//!
//! Flags text columns that are really numeric: every present value parses
//! as a number, so the column would be better stored as one.

use crate::dataset::{CellValue, ColumnKind, Dataset};

use super::models::{IssueKind, QualityIssue, Severity};

/// Reports categorical columns whose present values all parse as numbers.
///
/// Columns with no present values are not reported.
pub fn check_data_types(dataset: &Dataset) -> Vec<QualityIssue> {
    let total_rows = dataset.row_count();

    dataset
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| column.kind == ColumnKind::Categorical)
        .filter_map(|(index, column)| {
            let mut present: u64 = 0;
            for cell in dataset.column_values(index).filter(|c| !c.is_null()) {
                if !is_numeric_like(cell) {
                    return None;
                }
                present += 1;
            }
            if present == 0 {
                return None;
            }

            Some(QualityIssue::new(
                IssueKind::DataTypeMismatch {
                    current_type: "text".to_string(),
                    suggested_type: "numeric".to_string(),
                },
                &column.name,
                present,
                total_rows,
                Severity::Medium,
            ))
        })
        .collect()
}

fn is_numeric_like(cell: &CellValue) -> bool {
    match cell {
        CellValue::Number(_) => true,
        CellValue::Text(s) => s.trim().parse::<f64>().is_ok(),
        CellValue::Null | CellValue::Boolean(_) => false,
    }
}
