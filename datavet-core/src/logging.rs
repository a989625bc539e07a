//! Shared logging setup for datavet binaries.

use crate::Result;

/// Maps CLI verbosity flags to a log level.
///
/// `quiet` wins over any verbosity; 0 is INFO, 1 is DEBUG, 2+ is TRACE.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Initializes structured logging based on verbosity level.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
/// * `quiet` - If true, only show ERROR level logs
/// * `json` - Emit one JSON object per event instead of human-readable lines
///
/// # Example
/// ```rust,no_run
/// use datavet_core::logging::init_logging;
///
/// // Initialize at DEBUG level
/// init_logging(1, false, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool, json: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level_for(verbose, quiet))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| {
        crate::error::DatavetError::configuration(format!("Failed to initialize logging: {}", e))
    })
}
