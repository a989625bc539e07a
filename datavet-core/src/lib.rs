//! Core validation engine for datavet.
//!
//! Given a tabular dataset, decides which rows are anomalous and which
//! columns show quality defects. Two unsupervised detectors (isolation
//! forest and DBSCAN) run alongside a rule-based quality checker; their
//! results are merged into a single [`ValidationReport`].
//!
//! # Guarantees
//! - The engine only borrows the dataset and never mutates it
//! - Models are fitted fresh on every call; nothing is persisted
//! - A fixed seed gives identical anomaly flags for identical input
//! - Offline-only operation with no network dependencies
//!
//! # Example
//! ```rust
//! use datavet_core::{Dataset, validate};
//! use serde_json::json;
//!
//! let rows: Vec<_> = (0..30).map(|i| json!({"amount": i % 7, "region": "north"})).collect();
//! let dataset = Dataset::from_json_records(&rows).unwrap();
//!
//! let report = validate(&dataset, None).unwrap();
//! println!("{} anomalies", report.summary.total_anomalies);
//! ```

pub mod config;
pub mod dataset;
pub mod detection;
pub mod error;
pub mod logging;
pub mod quality;
pub mod report;
pub mod stats;
pub mod validator;

// Re-export commonly used types
pub use config::{
    ConfigValidationError, DbscanConfig, ExplainConfig, IsolationForestConfig, QualityRuleConfig,
    ValidationConfig,
};
pub use dataset::{CellValue, Column, ColumnKind, Dataset, DatasetError};
pub use detection::{AnomalyExplanations, AnomalyReport, DetectorKind, DetectorResult};
pub use error::{DatavetError, Result, ValidationStage};
pub use quality::{QualityIssue, QualityRuleEngine, QualitySummary, Severity};
pub use report::{ValidationReport, ValidationSummary};
pub use validator::{ValidationOrchestrator, validate};
