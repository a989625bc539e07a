//! Validation report models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::detection::{AnomalyExplanations, AnomalyReport};
use crate::quality::{QualityIssue, QualitySummary};

/// Headline figures of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_rows: usize,
    /// Rows flagged by any detector, each counted once
    pub total_anomalies: usize,
    pub total_quality_issues: usize,
    pub anomaly_rate: f64,
    /// True when no row was flagged and no quality issue was found
    pub validation_passed: bool,
}

impl ValidationSummary {
    /// Builds the summary from the two branch results.
    pub fn new(total_rows: usize, anomalies: &AnomalyReport, issues: &[QualityIssue]) -> Self {
        Self {
            total_rows,
            total_anomalies: anomalies.total_anomalies,
            total_quality_issues: issues.len(),
            anomaly_rate: anomalies.anomaly_rate,
            validation_passed: anomalies.total_anomalies == 0 && issues.is_empty(),
        }
    }
}

/// Complete result of validating one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Unique identifier of this run
    pub report_id: Uuid,
    /// When the run completed
    pub validated_at: DateTime<Utc>,
    pub anomalies: AnomalyReport,
    /// Issues in rule order
    pub quality_issues: Vec<QualityIssue>,
    pub quality_summary: QualitySummary,
    /// Present when explanations were requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanations: Option<AnomalyExplanations>,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    /// Assembles a report stamped with a fresh id and the current time.
    pub fn new(
        anomalies: AnomalyReport,
        quality_issues: Vec<QualityIssue>,
        quality_summary: QualitySummary,
        explanations: Option<AnomalyExplanations>,
    ) -> Self {
        let summary = ValidationSummary::new(quality_summary.total_rows, &anomalies, &quality_issues);
        Self {
            report_id: Uuid::new_v4(),
            validated_at: Utc::now(),
            anomalies,
            quality_issues,
            quality_summary,
            explanations,
            summary,
        }
    }

    /// Returns true when the dataset passed validation.
    pub fn passed(&self) -> bool {
        self.summary.validation_passed
    }
}
