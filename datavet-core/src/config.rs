//! Validation configuration.
//!
//! Every recognised setting is a named, typed field with a default, so a
//! partial JSON document deserializes into a complete configuration and an
//! unknown key is rejected instead of silently ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Isolation forest settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IsolationForestConfig {
    /// Expected anomaly proportion, in (0.0, 0.5]
    pub contamination: f64,
    /// Seed for tree randomisation
    pub random_state: u64,
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Upper bound on rows drawn per tree
    pub max_samples: usize,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            contamination: 0.01,
            random_state: 42,
            n_estimators: 100,
            max_samples: 256,
        }
    }
}

/// Density clustering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DbscanConfig {
    /// Neighbourhood radius in standardised feature space
    pub eps: f64,
    /// Minimum neighbourhood size (the point itself included) for a core point
    pub min_samples: usize,
    /// Feature count above which the data is projected onto this many
    /// principal components before clustering
    pub max_components: usize,
}

impl Default for DbscanConfig {
    fn default() -> Self {
        Self {
            eps: 0.5,
            min_samples: 5,
            max_components: 10,
        }
    }
}

/// Thresholds for the rule-based quality checks.
///
/// Percentages are expressed on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityRuleConfig {
    /// Missing percentage above which severity is high
    pub missing_high_pct: f64,
    /// Missing percentage above which severity is medium
    pub missing_medium_pct: f64,
    /// Duplicate row percentage above which severity is medium
    pub duplicate_medium_pct: f64,
    /// Absolute z-score above which a cell is an outlier
    pub outlier_z_threshold: f64,
    /// Outlier percentage above which severity is medium
    pub outlier_medium_pct: f64,
}

impl Default for QualityRuleConfig {
    fn default() -> Self {
        Self {
            missing_high_pct: 50.0,
            missing_medium_pct: 10.0,
            duplicate_medium_pct: 5.0,
            outlier_z_threshold: 3.0,
            outlier_medium_pct: 5.0,
        }
    }
}

impl QualityRuleConfig {
    /// Creates a new quality rule config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the missing-value severity cut-offs.
    pub fn with_missing_thresholds(mut self, medium_pct: f64, high_pct: f64) -> Self {
        self.missing_medium_pct = clamp_percentage("missing_medium_pct", medium_pct);
        self.missing_high_pct = clamp_percentage("missing_high_pct", high_pct);
        self
    }

    /// Builder method to set the duplicate-row severity cut-off.
    pub fn with_duplicate_medium_pct(mut self, pct: f64) -> Self {
        self.duplicate_medium_pct = clamp_percentage("duplicate_medium_pct", pct);
        self
    }

    /// Builder method to set the outlier z-score threshold.
    pub fn with_outlier_z_threshold(mut self, threshold: f64) -> Self {
        self.outlier_z_threshold = threshold;
        self
    }

    /// Builder method to set the outlier severity cut-off.
    pub fn with_outlier_medium_pct(mut self, pct: f64) -> Self {
        self.outlier_medium_pct = clamp_percentage("outlier_medium_pct", pct);
        self
    }
}

fn clamp_percentage(name: &str, pct: f64) -> f64 {
    if !(0.0..=100.0).contains(&pct) {
        tracing::warn!("{} {} clamped to valid range [0.0, 100.0]", name, pct);
    }
    pct.clamp(0.0, 100.0)
}

/// Row-level explanation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplainConfig {
    /// Attach explanations to the validation report
    pub enabled: bool,
    /// Number of flagged rows to explain, in row order
    pub top_n: usize,
    /// Absolute z-score above which a column is reported as a reason
    pub reason_z_threshold: f64,
    /// Absolute z-score above which a reason is high severity
    pub high_severity_z_threshold: f64,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            top_n: 10,
            reason_z_threshold: 2.0,
            high_severity_z_threshold: 3.0,
        }
    }
}

/// Complete validation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Isolation forest settings
    pub isolation_forest: IsolationForestConfig,
    /// Density clustering settings
    pub dbscan: DbscanConfig,
    /// Quality rule thresholds
    pub quality: QualityRuleConfig,
    /// Explanation settings
    pub explain: ExplainConfig,
}

/// Validation errors for configuration values.
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("isolation_forest.contamination must be in (0.0, 0.5], got {0}")]
    InvalidContamination(f64),
    #[error("isolation_forest.n_estimators must be at least 1")]
    InvalidEstimators,
    #[error("isolation_forest.max_samples must be at least 1")]
    InvalidMaxSamples,
    #[error("dbscan.eps must be a positive finite number, got {0}")]
    InvalidEps(f64),
    #[error("dbscan.min_samples must be at least 1")]
    InvalidMinSamples,
    #[error("dbscan.max_components must be at least 1")]
    InvalidComponents,
    #[error("{name} must be a non-negative finite number, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error("explain.high_severity_z_threshold ({high}) must not be below reason_z_threshold ({reason})")]
    InvertedExplainThresholds { reason: f64, high: f64 },
}

impl ValidationConfig {
    /// Creates a new validation config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration document; omitted keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Builder method to set the expected anomaly proportion.
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.isolation_forest.contamination = contamination;
        self
    }

    /// Builder method to set the isolation forest seed.
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.isolation_forest.random_state = seed;
        self
    }

    /// Builder method to set the DBSCAN neighbourhood radius.
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.dbscan.eps = eps;
        self
    }

    /// Builder method to set the DBSCAN minimum neighbourhood size.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.dbscan.min_samples = min_samples;
        self
    }

    /// Builder method to set the quality rule thresholds.
    pub fn with_quality(mut self, quality: QualityRuleConfig) -> Self {
        self.quality = quality;
        self
    }

    /// Builder method to enable explanations for the first `top_n` flagged rows.
    pub fn with_explanations(mut self, top_n: usize) -> Self {
        self.explain.enabled = true;
        self.explain.top_n = top_n;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns the first out-of-range value found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let forest = &self.isolation_forest;
        if !(forest.contamination > 0.0 && forest.contamination <= 0.5) {
            return Err(ConfigValidationError::InvalidContamination(
                forest.contamination,
            ));
        }
        if forest.n_estimators == 0 {
            return Err(ConfigValidationError::InvalidEstimators);
        }
        if forest.max_samples == 0 {
            return Err(ConfigValidationError::InvalidMaxSamples);
        }

        let dbscan = &self.dbscan;
        if !(dbscan.eps.is_finite() && dbscan.eps > 0.0) {
            return Err(ConfigValidationError::InvalidEps(dbscan.eps));
        }
        if dbscan.min_samples == 0 {
            return Err(ConfigValidationError::InvalidMinSamples);
        }
        if dbscan.max_components == 0 {
            return Err(ConfigValidationError::InvalidComponents);
        }

        let quality = &self.quality;
        for (name, value) in [
            ("quality.missing_high_pct", quality.missing_high_pct),
            ("quality.missing_medium_pct", quality.missing_medium_pct),
            ("quality.duplicate_medium_pct", quality.duplicate_medium_pct),
            ("quality.outlier_z_threshold", quality.outlier_z_threshold),
            ("quality.outlier_medium_pct", quality.outlier_medium_pct),
            ("explain.reason_z_threshold", self.explain.reason_z_threshold),
            (
                "explain.high_severity_z_threshold",
                self.explain.high_severity_z_threshold,
            ),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigValidationError::InvalidThreshold { name, value });
            }
        }

        if self.explain.high_severity_z_threshold < self.explain.reason_z_threshold {
            return Err(ConfigValidationError::InvertedExplainThresholds {
                reason: self.explain.reason_z_threshold,
                high: self.explain.high_severity_z_threshold,
            });
        }

        Ok(())
    }
}
