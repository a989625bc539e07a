//! Library module for datavet
//!
//! This module exposes the CLI definition and the file handling helpers for
//! testing purposes. The main binary functionality is in main.rs.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use datavet_core::{
    Dataset, DatavetError, DetectorKind, QualityRuleConfig, Result, ValidationConfig,
    ValidationReport,
};
use serde_json::Value;
use tracing::warn;

/// Default report file name
pub const DEFAULT_REPORT_PATH: &str = "validation_report.json";

#[derive(Parser)]
#[command(name = "datavet")]
#[command(about = "Tabular dataset validation: anomaly detection and data quality checks")]
#[command(version)]
#[command(long_about = "
datavet - Offline validation of tabular datasets

Reads a JSON dataset and reports:
- Anomalous rows (isolation forest and DBSCAN, combined by union)
- Missing values, duplicate rows, numeric data stored as text
- Statistical outliers per numeric column
- Optional per-row explanations of flagged rows

INPUT FORMATS:
- JSON array of records:     [{\"a\": 1}, {\"a\": 2}]
- Wrapped records:           {\"data\": [{\"a\": 1}]}
- Single record:             {\"a\": 1}

EXAMPLES:
  datavet validate sales.json
  datavet validate sales.json --contamination 0.05 --explain --output report.json
  datavet validate sales.json --config datavet.json --annotated sales.flagged.json
  datavet defaults > datavet.json
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a dataset and write the report
    Validate(ValidateArgs),
    /// Print the default configuration as JSON
    Defaults,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,

    /// Structured log output
    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[derive(Args, Default)]
pub struct ValidateArgs {
    /// Dataset file
    #[arg(help = "JSON dataset to validate")]
    pub input: PathBuf,

    /// Report output path
    #[arg(short, long, default_value = DEFAULT_REPORT_PATH, help = "Report output file")]
    pub output: PathBuf,

    /// Configuration file
    #[arg(
        short,
        long,
        env = "DATAVET_CONFIG",
        help = "JSON configuration file (omitted keys keep their defaults)"
    )]
    pub config: Option<PathBuf>,

    /// Annotated dataset output
    #[arg(
        long,
        value_name = "FILE",
        help = "Also write the dataset with per-row anomaly flag columns"
    )]
    pub annotated: Option<PathBuf>,

    #[arg(long, help = "Expected anomaly proportion, in (0, 0.5]")]
    pub contamination: Option<f64>,

    #[arg(long, help = "Seed for the isolation forest")]
    pub random_state: Option<u64>,

    #[arg(long, help = "DBSCAN neighbourhood radius")]
    pub eps: Option<f64>,

    #[arg(long, help = "DBSCAN minimum neighbourhood size")]
    pub min_samples: Option<usize>,

    /// Quality threshold overrides (format: rule:value)
    #[arg(
        long,
        value_delimiter = ',',
        help = "Quality thresholds (missing_high:50,missing_medium:10,duplicate_medium:5,outlier_z:3,outlier_medium:5)"
    )]
    pub quality_threshold: Vec<String>,

    /// Attach explanations
    #[arg(long, help = "Explain the first flagged rows")]
    pub explain: bool,

    #[arg(long, help = "Number of flagged rows to explain (implies --explain)")]
    pub top_n: Option<usize>,

    /// Exit status on failure
    #[arg(long, help = "Exit with status 2 when validation does not pass")]
    pub fail_on_issues: bool,
}

/// Loads a dataset from a JSON file.
pub async fn load_dataset(path: &Path) -> Result<Dataset> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DatavetError::Io {
            context: format!("Failed to read {}", path.display()),
            source: e,
        })?;

    let document: Value = serde_json::from_str(&content).map_err(|e| {
        DatavetError::serialization(format!("Invalid JSON in {}", path.display()), e)
    })?;

    Dataset::from_json_value(&document)
        .map_err(|e| DatavetError::dataset(format!("Unusable dataset in {}", path.display()), e))
}

/// Loads the configuration file, or the defaults when none is given.
pub async fn load_config(path: Option<&Path>) -> Result<ValidationConfig> {
    let Some(path) = path else {
        return Ok(ValidationConfig::default());
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DatavetError::Io {
            context: format!("Failed to read {}", path.display()),
            source: e,
        })?;

    ValidationConfig::from_json_str(&content).map_err(|e| {
        DatavetError::serialization(format!("Invalid configuration in {}", path.display()), e)
    })
}

/// Applies command-line overrides on top of a loaded configuration.
pub fn apply_overrides(mut config: ValidationConfig, args: &ValidateArgs) -> ValidationConfig {
    if let Some(c) = args.contamination {
        config = config.with_contamination(c);
    }
    if let Some(seed) = args.random_state {
        config = config.with_random_state(seed);
    }
    if let Some(eps) = args.eps {
        config = config.with_eps(eps);
    }
    if let Some(min_samples) = args.min_samples {
        config = config.with_min_samples(min_samples);
    }

    config.quality = parse_quality_thresholds(config.quality, &args.quality_threshold);

    if let Some(top_n) = args.top_n {
        config = config.with_explanations(top_n);
    } else if args.explain {
        config.explain.enabled = true;
    }

    config
}

/// Parses quality thresholds from CLI arguments onto `base`.
///
/// Malformed entries and unknown rule names are logged and skipped.
pub fn parse_quality_thresholds(base: QualityRuleConfig, thresholds: &[String]) -> QualityRuleConfig {
    let mut config = base;

    for threshold in thresholds {
        let Some((rule, value)) = threshold.split_once(':') else {
            warn!("Ignoring malformed quality threshold: {}", threshold);
            continue;
        };
        let Ok(v) = value.trim().parse::<f64>() else {
            warn!("Invalid threshold value for {}: {}", rule, value);
            continue;
        };

        config = match rule.trim().to_lowercase().as_str() {
            "missing_high" => {
                let medium = config.missing_medium_pct;
                config.with_missing_thresholds(medium, v)
            }
            "missing_medium" => {
                let high = config.missing_high_pct;
                config.with_missing_thresholds(v, high)
            }
            "duplicate_medium" => config.with_duplicate_medium_pct(v),
            "outlier_z" => config.with_outlier_z_threshold(v),
            "outlier_medium" => config.with_outlier_medium_pct(v),
            _ => {
                warn!("Unknown quality rule: {}", rule);
                config
            }
        };
    }

    config
}

/// Copies the dataset records and appends per-row anomaly flag columns.
///
/// Adds `isolation_forest_anomaly`, `dbscan_anomaly` and `combined_anomaly`.
/// A detector that did not run contributes `false` for every row.
pub fn annotate_records(dataset: &Dataset, report: &ValidationReport) -> Vec<Value> {
    let detector_flags = |kind: DetectorKind| {
        report
            .anomalies
            .detector(kind)
            .map(|d| d.flags.as_slice())
            .unwrap_or_default()
    };
    let forest = detector_flags(DetectorKind::IsolationForest);
    let density = detector_flags(DetectorKind::Dbscan);

    dataset
        .to_json_records()
        .into_iter()
        .enumerate()
        .map(|(row, mut record)| {
            if let Value::Object(obj) = &mut record {
                let flag = |flags: &[bool]| flags.get(row).copied().unwrap_or(false);
                obj.insert("isolation_forest_anomaly".into(), Value::Bool(flag(forest)));
                obj.insert("dbscan_anomaly".into(), Value::Bool(flag(density)));
                obj.insert(
                    "combined_anomaly".into(),
                    Value::Bool(flag(&report.anomalies.flags)),
                );
            }
            record
        })
        .collect()
}

/// Serializes `value` as pretty JSON and writes it to `path`.
pub async fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let json_data = serde_json::to_string_pretty(value)
        .map_err(|e| DatavetError::serialization("JSON serialization", e))?;

    tokio::fs::write(path, json_data)
        .await
        .map_err(|e| DatavetError::Io {
            context: format!("Failed to write to {}", path.display()),
            source: e,
        })
}
