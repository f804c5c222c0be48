//! Tracing setup for the `culler` binary.
//!
//! Logs go to a daily-rolling file so they never interleave with the REPL.

use anyhow::{Context, Result};
use culler_infrastructure::CullerPaths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_PREFIX: &str = "culler.log";

/// Installs the global subscriber.
///
/// Filter precedence: `cli_filter`, then `RUST_LOG`, then `config_filter`.
/// The returned guard flushes buffered lines on drop; keep it alive for the
/// whole run.
pub fn init(cli_filter: Option<&str>, config_filter: &str) -> Result<WorkerGuard> {
    let filter = match cli_filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("Invalid --log-level filter: {}", directives))?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(config_filter))
            .with_context(|| format!("Invalid logging.level in config: {}", config_filter))?,
    };

    let log_dir = CullerPaths::logs_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    tracing::info!("[Bootstrap] Logging to {}", log_dir.display());
    Ok(guard)
}
