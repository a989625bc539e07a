//! Unsupervised anomaly detection.
//!
//! Two detectors run over the numeric features of a dataset:
//! - **Isolation forest**: rows isolated by few random splits
//! - **DBSCAN**: rows in no dense cluster
//!
//! Their verdicts are combined by union. Models are fitted fresh on every
//! call and never outlive it. A detector that cannot be fitted degrades to
//! an all-clear verdict instead of failing the run.

mod combine;
pub mod dbscan;
mod explain;
mod features;
pub mod isolation;
mod models;
pub mod pca;

use tracing::{debug, info};

use crate::config::ValidationConfig;
use crate::dataset::Dataset;
use crate::error::{DatavetError, Result, ValidationStage};

// Re-export public API
pub use combine::combine;
pub use explain::{AnomalyExplanations, AnomalyReason, ExplanationSummary, RowExplanation, explain};
pub use features::{FeatureMatrix, FeatureMatrixError, prepare};
pub use models::{
    AlignmentError, AnomalyReport, DbscanDetails, DetectionOutcome, DetectorDetails, DetectorKind,
    DetectorResult, FitError, IsolationForestDetails,
};

/// Runs both detectors over a dataset and combines their verdicts.
///
/// The detectors run in parallel. A dataset without usable numeric features
/// yields an all-clear report with no methods used.
pub fn detect_anomalies(dataset: &Dataset, config: &ValidationConfig) -> Result<AnomalyReport> {
    let row_count = dataset.row_count();
    let matrix = prepare(dataset)
        .map_err(|e| DatavetError::validation_failed(ValidationStage::AnomalyDetection, e))?;

    if matrix.is_empty() {
        info!("No numeric features to analyze; skipping anomaly detection");
        return Ok(AnomalyReport::no_numeric_data(row_count));
    }

    debug!(
        "Running anomaly detectors over {} rows, {} features",
        matrix.n_rows(),
        matrix.n_features()
    );
    let (forest, density) = rayon::join(
        || isolation::fit_detect(&matrix, &config.isolation_forest),
        || dbscan::fit_detect(&matrix, &config.dbscan),
    );

    combine(
        forest,
        density,
        matrix.row_ids(),
        row_count,
        matrix.columns().to_vec(),
    )
    .map_err(|e| DatavetError::validation_failed(ValidationStage::AnomalyDetection, e))
}
