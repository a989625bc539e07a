//! Dataset validation tool.
//!
//! This binary loads a tabular JSON dataset, runs anomaly detection and
//! rule-based quality checks over it, and writes a JSON report.
//!
//! # Guarantees
//! - Offline-only operation; no network I/O
//! - The input file is never modified
//! - Reports expose counts, ratios and flagged row indexes

use clap::Parser;
use datavet::{
    Cli, Command, ValidateArgs, annotate_records, apply_overrides, load_config, load_dataset,
    write_json,
};
use datavet_core::{
    DatavetError, Result, ValidationConfig, ValidationOrchestrator, ValidationReport,
    logging::init_logging,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet, cli.global.log_json)?;

    match &cli.command {
        Command::Validate(args) => {
            let report = run_validation(args).await?;
            if args.fail_on_issues && !report.passed() {
                std::process::exit(2);
            }
            Ok(())
        }
        Command::Defaults => {
            let json = serde_json::to_string_pretty(&ValidationConfig::default())
                .map_err(|e| DatavetError::serialization("Default configuration", e))?;
            println!("{json}");
            Ok(())
        }
    }
}

/// Loads the dataset, validates it and writes the outputs.
async fn run_validation(args: &ValidateArgs) -> Result<ValidationReport> {
    info!("Starting validation...");
    info!("Input: {}", args.input.display());
    info!("Output: {}", args.output.display());

    let config = apply_overrides(load_config(args.config.as_deref()).await?, args);
    let dataset = load_dataset(&args.input).await.map_err(|e| {
        error!("Failed to load dataset: {}", e);
        e
    })?;
    info!(
        "✓ Loaded {} rows, {} columns",
        dataset.row_count(),
        dataset.column_count()
    );

    let orchestrator = ValidationOrchestrator::new(config).map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    // Model fitting is CPU-bound; keep it off the async workers
    let (report, dataset) = tokio::task::spawn_blocking(move || {
        orchestrator.validate(&dataset).map(|report| (report, dataset))
    })
    .await
    .unwrap_or_else(|e| std::panic::resume_unwind(e.into_panic()))?;

    for detector in &report.anomalies.detectors {
        if detector.is_degraded() {
            warn!("Detector {} did not fit; its rows are reported clean", detector.detector);
        }
    }
    for issue in &report.quality_issues {
        warn!(
            "Quality issue in '{}': {} ({} rows, {:.2}%, {:?} severity)",
            issue.column,
            issue.kind.name(),
            issue.count,
            issue.percentage,
            issue.severity
        );
    }

    write_json(&report, &args.output).await?;
    info!("✓ Report saved to {}", args.output.display());

    if let Some(ref annotated) = args.annotated {
        write_json(&annotate_records(&dataset, &report), annotated).await?;
        info!("✓ Annotated dataset saved to {}", annotated.display());
    }

    let summary = &report.summary;
    println!(
        "Validation {}",
        if summary.validation_passed { "passed" } else { "failed" }
    );
    println!("Rows: {}", summary.total_rows);
    println!(
        "Anomalies: {} ({:.2}%)",
        summary.total_anomalies,
        summary.anomaly_rate * 100.0
    );
    println!("Quality issues: {}", summary.total_quality_issues);
    println!("Report: {}", args.output.display());

    Ok(report)
}
