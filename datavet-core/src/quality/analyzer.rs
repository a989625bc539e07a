//! Quality rule engine facade.
//!
//! Runs every rule over a dataset and collects the issues in a fixed
//! order: missing values, duplicate rows, data types, outliers.

use tracing::debug;

use crate::config::QualityRuleConfig;
use crate::dataset::Dataset;

use super::completeness::check_missing_values;
use super::consistency::check_data_types;
use super::models::{QualityIssue, QualitySummary};
use super::outliers::check_outliers;
use super::uniqueness::check_duplicate_rows;

/// Rule-based data quality checker.
///
/// # Example
///
/// ```rust
/// use datavet_core::dataset::Dataset;
/// use datavet_core::quality::QualityRuleEngine;
/// use serde_json::json;
///
/// let dataset = Dataset::from_json_records(&[json!({"a": 1}), json!({"a": null})]).unwrap();
/// let issues = QualityRuleEngine::with_defaults().validate(&dataset);
/// assert_eq!(issues.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct QualityRuleEngine {
    config: QualityRuleConfig,
}

impl QualityRuleEngine {
    /// Creates a rule engine with the given thresholds.
    pub fn new(config: QualityRuleConfig) -> Self {
        Self { config }
    }

    /// Creates a rule engine with default thresholds.
    pub fn with_defaults() -> Self {
        Self::new(QualityRuleConfig::default())
    }

    /// Returns a reference to the rule thresholds.
    pub fn config(&self) -> &QualityRuleConfig {
        &self.config
    }

    /// Runs all rules and returns the issues found.
    ///
    /// An empty dataset has no issues.
    pub fn validate(&self, dataset: &Dataset) -> Vec<QualityIssue> {
        let mut issues = check_missing_values(dataset, &self.config);
        issues.extend(check_duplicate_rows(dataset, &self.config));
        issues.extend(check_data_types(dataset));
        issues.extend(check_outliers(dataset, &self.config));

        debug!(
            "Quality rules found {} issues over {} rows",
            issues.len(),
            dataset.row_count()
        );
        issues
    }

    /// Summarises issues previously found in `dataset`.
    pub fn summarize(&self, dataset: &Dataset, issues: &[QualityIssue]) -> QualitySummary {
        QualitySummary::new(dataset.row_count(), dataset.column_count(), issues)
    }
}

impl Default for QualityRuleEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}
