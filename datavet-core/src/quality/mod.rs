//! Rule-based data quality checks.
//!
//! Independent of the anomaly detectors, each rule inspects the dataset and
//! reports typed issues:
//! - **Completeness**: missing cells per column
//! - **Uniqueness**: rows repeating an earlier row
//! - **Consistency**: text columns holding only numbers
//! - **Outliers**: values far from the column mean
//!
//! Issues expose counts and percentages only, never cell values.

mod analyzer;
mod completeness;
mod consistency;
mod models;
mod outliers;
mod uniqueness;

// Re-export public API
pub use analyzer::QualityRuleEngine;
pub use completeness::check_missing_values;
pub use consistency::check_data_types;
pub use models::{ALL_COLUMNS, IssueKind, QualityIssue, QualitySummary, Severity, SeverityCounts};
pub use outliers::check_outliers;
pub use uniqueness::check_duplicate_rows;
