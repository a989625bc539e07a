//! Detector result models.
//!
//! A detector either fits and reports typed diagnostics, or degrades to an
//! all-clear flag vector with the reason recorded. Degradation is a result
//! state, not an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outlier detectors run by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Randomised partitioning tree ensemble
    IsolationForest,
    /// Density-based clustering, noise points flagged
    Dbscan,
}

impl DetectorKind {
    /// Stable name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            DetectorKind::IsolationForest => "isolation_forest",
            DetectorKind::Dbscan => "dbscan",
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Isolation forest diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForestDetails {
    /// Expected anomaly proportion used for the threshold
    pub contamination: f64,
    /// Number of trees fitted
    pub n_estimators: usize,
    /// Rows drawn per tree
    pub max_samples: usize,
    /// Mean of the decision scores (negative means anomalous)
    pub anomaly_scores_mean: f64,
    /// Population standard deviation of the decision scores
    pub anomaly_scores_std: f64,
    /// Contamination percentile of the decision scores
    pub threshold: f64,
}

/// DBSCAN diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbscanDetails {
    pub eps: f64,
    pub min_samples: usize,
    /// Number of clusters found, noise excluded
    pub n_clusters: usize,
    /// Size of each cluster in discovery order
    pub cluster_sizes: Vec<usize>,
    /// Rows assigned to no cluster
    pub noise_points: usize,
    /// Dimensions clustered on (principal components or raw features)
    pub pca_components: usize,
    /// Variance share per principal component, when a projection was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explained_variance_ratio: Option<Vec<f64>>,
}

/// Detector-specific diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DetectorDetails {
    IsolationForest(IsolationForestDetails),
    Dbscan(DbscanDetails),
}

/// Whether a detector produced a real verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectionOutcome {
    /// Model fitted; flags reflect its verdict
    Fitted { details: DetectorDetails },
    /// Model could not be fitted; flags are all false
    Degraded { reason: String },
}

/// Verdict of one detector over a feature matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorResult {
    pub detector: DetectorKind,
    /// One flag per row, in row order
    pub flags: Vec<bool>,
    pub anomaly_count: usize,
    pub outcome: DetectionOutcome,
}

impl DetectorResult {
    /// Creates the result of a successful fit.
    pub fn fitted(detector: DetectorKind, flags: Vec<bool>, details: DetectorDetails) -> Self {
        let anomaly_count = flags.iter().filter(|&&f| f).count();
        Self {
            detector,
            flags,
            anomaly_count,
            outcome: DetectionOutcome::Fitted { details },
        }
    }

    /// Creates an all-clear result for a detector that could not be fitted.
    pub fn degraded(detector: DetectorKind, rows: usize, reason: impl Into<String>) -> Self {
        Self {
            detector,
            flags: vec![false; rows],
            anomaly_count: 0,
            outcome: DetectionOutcome::Degraded {
                reason: reason.into(),
            },
        }
    }

    /// Returns true when the detector fell back to an all-clear verdict.
    pub fn is_degraded(&self) -> bool {
        matches!(self.outcome, DetectionOutcome::Degraded { .. })
    }

    /// Returns the fitted diagnostics, if any.
    pub fn details(&self) -> Option<&DetectorDetails> {
        match &self.outcome {
            DetectionOutcome::Fitted { details } => Some(details),
            DetectionOutcome::Degraded { .. } => None,
        }
    }

    /// Re-expresses matrix-aligned flags against source dataset rows.
    ///
    /// `row_ids[k]` is the source row of matrix row `k`. Rows absent from
    /// the matrix are reported as not anomalous.
    pub fn aligned_to(
        self,
        row_ids: &[usize],
        row_count: usize,
    ) -> Result<Self, AlignmentError> {
        if self.flags.len() != row_ids.len() {
            return Err(AlignmentError::LengthMismatch {
                detector: self.detector,
                flags: self.flags.len(),
                rows: row_ids.len(),
            });
        }

        let mut flags = vec![false; row_count];
        for (&row, &flag) in row_ids.iter().zip(&self.flags) {
            let slot = flags
                .get_mut(row)
                .ok_or(AlignmentError::RowOutOfRange { row, row_count })?;
            *slot = flag;
        }

        Ok(Self { flags, ..self })
    }
}

/// Expected failures while fitting a model on a feature matrix.
///
/// These are the only failures a detector recovers from.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("feature matrix has no rows")]
    EmptyMatrix,
    #[error("feature matrix has no columns")]
    NoFeatures,
    #[error("non-finite value at row {row}, feature {feature}")]
    NonFiniteValue { row: usize, feature: usize },
    #[error("{components} components requested from {rows} rows")]
    InsufficientRows { rows: usize, components: usize },
}

/// Detector output that cannot be mapped back to source rows.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlignmentError {
    #[error("{detector} returned {flags} flags for {rows} matrix rows")]
    LengthMismatch {
        detector: DetectorKind,
        flags: usize,
        rows: usize,
    },
    #[error("row id {row} is outside a dataset of {row_count} rows")]
    RowOutOfRange { row: usize, row_count: usize },
    #[error("{flags} row flags for a dataset of {rows} rows")]
    FlagCount { flags: usize, rows: usize },
}

/// Combined anomaly verdict over a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    /// Per source row: flagged by any detector
    pub flags: Vec<bool>,
    pub total_anomalies: usize,
    /// `total_anomalies / row_count`, 0 for an empty dataset
    pub anomaly_rate: f64,
    pub methods_used: Vec<String>,
    pub numeric_columns_analyzed: Vec<String>,
    /// Individual detector verdicts, aligned to source rows
    pub detectors: Vec<DetectorResult>,
}

impl AnomalyReport {
    /// Report for a dataset with nothing to run the detectors on.
    pub fn no_numeric_data(row_count: usize) -> Self {
        Self {
            flags: vec![false; row_count],
            total_anomalies: 0,
            anomaly_rate: 0.0,
            methods_used: Vec::new(),
            numeric_columns_analyzed: Vec::new(),
            detectors: Vec::new(),
        }
    }

    /// Source row indexes flagged as anomalous.
    pub fn anomalous_rows(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect()
    }

    /// Result of a single detector, if it ran.
    pub fn detector(&self, kind: DetectorKind) -> Option<&DetectorResult> {
        self.detectors.iter().find(|d| d.detector == kind)
    }
}
