//! Validation orchestrator.
//!
//! Runs the anomaly branch and the quality branch over the same borrowed
//! dataset in parallel and assembles one report. Either the whole report is
//! produced or the call fails; there is no partial result.

use std::time::Instant;

use tracing::info;

use crate::config::ValidationConfig;
use crate::dataset::Dataset;
use crate::detection::{self, AnomalyReport};
use crate::error::{DatavetError, Result, ValidationStage};
use crate::quality::QualityRuleEngine;
use crate::report::ValidationReport;

/// Entry point of the validation engine.
///
/// # Example
///
/// ```rust
/// use datavet_core::{Dataset, ValidationConfig, ValidationOrchestrator};
/// use serde_json::json;
///
/// let rows: Vec<_> = (0..20).map(|i| json!({"id": i, "score": i * 2})).collect();
/// let dataset = Dataset::from_json_records(&rows).unwrap();
///
/// let orchestrator = ValidationOrchestrator::new(ValidationConfig::default()).unwrap();
/// let report = orchestrator.validate(&dataset).unwrap();
/// assert_eq!(report.summary.total_rows, 20);
/// ```
#[derive(Debug, Clone)]
pub struct ValidationOrchestrator {
    config: ValidationConfig,
}

impl ValidationOrchestrator {
    /// Creates an orchestrator, rejecting invalid configuration.
    pub fn new(config: ValidationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Creates an orchestrator with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: ValidationConfig::default(),
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validates a dataset.
    ///
    /// Models are fitted fresh for this call. Explanations are attached
    /// when `explain.enabled` is set.
    pub fn validate(&self, dataset: &Dataset) -> Result<ValidationReport> {
        let started = Instant::now();
        info!(
            "Validating dataset: {} rows, {} columns",
            dataset.row_count(),
            dataset.column_count()
        );

        let rules = QualityRuleEngine::new(self.config.quality.clone());
        let (anomalies, quality_issues) = rayon::join(
            || detection::detect_anomalies(dataset, &self.config),
            || rules.validate(dataset),
        );
        let anomalies: AnomalyReport = anomalies?;

        info!(
            "✓ Anomaly detection: {} of {} rows flagged",
            anomalies.total_anomalies,
            dataset.row_count()
        );
        info!("✓ Quality rules: {} issues", quality_issues.len());

        let explanations = self
            .config
            .explain
            .enabled
            .then(|| detection::explain(dataset, &anomalies.flags, &self.config.explain))
            .transpose()
            .map_err(|e| DatavetError::validation_failed(ValidationStage::AnomalyDetection, e))?;

        let quality_summary = rules.summarize(dataset, &quality_issues);
        let report = ValidationReport::new(anomalies, quality_issues, quality_summary, explanations);

        info!(
            "Validation {} in {:.2?}",
            if report.passed() { "passed" } else { "failed" },
            started.elapsed()
        );
        Ok(report)
    }
}

impl Default for ValidationOrchestrator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Validates a dataset with the given configuration, or the defaults.
pub fn validate(dataset: &Dataset, config: Option<&ValidationConfig>) -> Result<ValidationReport> {
    let config = config.cloned().unwrap_or_default();
    ValidationOrchestrator::new(config)?.validate(dataset)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_dataset(rows: Vec<serde_json::Value>) -> Dataset {
        Dataset::from_json_records(&rows).unwrap()
    }

    fn mixed_dataset() -> Dataset {
        let mut rows: Vec<serde_json::Value> = (0..60)
            .map(|i| {
                json!({
                    "amount": 100.0 + (i % 10) as f64,
                    "quantity": (i % 4) as f64,
                    "region": if i % 2 == 0 { "north" } else { "south" },
                })
            })
            .collect();
        rows.push(json!({"amount": 9000.0, "quantity": 40.0, "region": "north"}));
        create_dataset(rows)
    }

    #[test]
    fn test_validate_assembles_report() {
        let dataset = mixed_dataset();

        let report = validate(&dataset, None).unwrap();

        assert_eq!(report.summary.total_rows, 61);
        assert_eq!(report.anomalies.flags.len(), 61);
        assert!(report.anomalies.flags[60]);
        assert_eq!(report.summary.total_anomalies, report.anomalies.total_anomalies);
        assert_eq!(report.summary.total_quality_issues, report.quality_issues.len());
        assert!(!report.passed());
        assert!(report.explanations.is_none());
    }

    #[test]
    fn test_explanations_attached_when_enabled() {
        let dataset = mixed_dataset();
        let config = ValidationConfig::new().with_explanations(5);

        let report = validate(&dataset, Some(&config)).unwrap();

        let explanations = report.explanations.unwrap();
        assert!(explanations.summary.total_explained >= 1);
        assert!(explanations.summary.total_explained <= 5);
        assert!(explanations.explanations.iter().any(|e| e.row_index == 60));
    }

    #[test]
    fn test_invalid_config_fails_before_analysis() {
        let config = ValidationConfig::new().with_contamination(0.9);

        let err = validate(&mixed_dataset(), Some(&config)).unwrap_err();

        assert_eq!(err.stage(), Some(ValidationStage::Configuration));
    }

    #[test]
    fn test_zero_rows() {
        let report = validate(&Dataset::empty(), None).unwrap();

        assert!(report.anomalies.flags.is_empty());
        assert_eq!(report.summary.anomaly_rate, 0.0);
        assert!(report.quality_issues.is_empty());
        assert!(report.passed());
    }

    #[test]
    fn test_categorical_only_dataset() {
        let dataset = create_dataset(vec![
            json!({"city": "Oslo"}),
            json!({"city": "Lima"}),
            json!({"city": "Pune"}),
        ]);

        let report = validate(&dataset, None).unwrap();

        assert_eq!(report.anomalies.flags, vec![false; 3]);
        assert_eq!(report.summary.total_anomalies, 0);
        assert!(report.passed());
    }

    #[test]
    fn test_same_input_same_flags() {
        let dataset = mixed_dataset();
        let orchestrator = ValidationOrchestrator::with_defaults();

        let first = orchestrator.validate(&dataset).unwrap();
        let second = orchestrator.validate(&dataset).unwrap();

        assert_eq!(first.anomalies, second.anomalies);
        assert_eq!(first.quality_issues, second.quality_issues);
        assert_ne!(first.report_id, second.report_id);
    }
}
