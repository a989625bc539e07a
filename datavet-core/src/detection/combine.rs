//! Union of detector verdicts.

use super::models::{AlignmentError, AnomalyReport, DetectorResult};

/// Merges the two detector verdicts into one report over the source rows.
///
/// A row is anomalous when either detector flags it. Detector flags are
/// matrix-aligned and are mapped to source rows through `row_ids`; rows
/// that never reached the matrix stay unflagged.
pub fn combine(
    isolation: DetectorResult,
    density: DetectorResult,
    row_ids: &[usize],
    row_count: usize,
    numeric_columns: Vec<String>,
) -> Result<AnomalyReport, AlignmentError> {
    let isolation = isolation.aligned_to(row_ids, row_count)?;
    let density = density.aligned_to(row_ids, row_count)?;

    let flags: Vec<bool> = isolation
        .flags
        .iter()
        .zip(&density.flags)
        .map(|(&a, &b)| a || b)
        .collect();
    let total_anomalies = flags.iter().filter(|&&f| f).count();
    let anomaly_rate = if row_count == 0 {
        0.0
    } else {
        total_anomalies as f64 / row_count as f64
    };

    Ok(AnomalyReport {
        flags,
        total_anomalies,
        anomaly_rate,
        methods_used: vec![
            isolation.detector.name().to_string(),
            density.detector.name().to_string(),
        ],
        numeric_columns_analyzed: numeric_columns,
        detectors: vec![isolation, density],
    })
}
