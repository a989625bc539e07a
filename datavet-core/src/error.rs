//! Error types for datavet operations.
//!
//! Only orchestrator-level failures surface through [`DatavetError`].
//! Detector fitting problems are recovered locally and reported as
//! degraded detection results, never as errors.

use thiserror::Error;

use crate::config::ConfigValidationError;
use crate::dataset::DatasetError;

/// Stage of a validation call in which a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    /// Configuration checks performed before any analysis
    Configuration,
    /// Feature preparation, model fitting and result fusion
    AnomalyDetection,
}

impl std::fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationStage::Configuration => write!(f, "configuration"),
            ValidationStage::AnomalyDetection => write!(f, "anomaly detection"),
        }
    }
}

/// Main error type for datavet operations.
#[derive(Debug, Error)]
pub enum DatavetError {
    /// A validation branch failed; no partial report is produced
    #[error("Validation failed during {stage}")]
    ValidationFailed {
        stage: ValidationStage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration or override error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Dataset could not be built or loaded
    #[error("Dataset error: {context}")]
    Dataset {
        context: String,
        #[source]
        source: DatasetError,
    },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with DatavetError
pub type Result<T> = std::result::Result<T, DatavetError>;

impl DatavetError {
    /// Wraps an error escaping a validation branch
    pub fn validation_failed<E>(stage: ValidationStage, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ValidationFailed {
            stage,
            source: Box::new(error),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a dataset error with context
    pub fn dataset(context: impl Into<String>, error: DatasetError) -> Self {
        Self::Dataset {
            context: context.into(),
            source: error,
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, error: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source: error,
        }
    }

    /// Returns the failing stage for validation failures.
    pub fn stage(&self) -> Option<ValidationStage> {
        match self {
            Self::ValidationFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<ConfigValidationError> for DatavetError {
    fn from(error: ConfigValidationError) -> Self {
        Self::validation_failed(ValidationStage::Configuration, error)
    }
}
