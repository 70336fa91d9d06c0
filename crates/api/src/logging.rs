//! Tracing subscriber setup.
//!
//! Console output always; when a log directory is configured, a daily
//! rolling file is written alongside through a non-blocking appender.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str =
    "herald_api=debug,herald_engine=debug,herald_notifier=debug,tower_http=debug";

/// File name prefix for rolled log files.
pub const LOG_FILE_PREFIX: &str = "herald.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the lifetime of the process; dropping it
/// stops the file writer.
pub fn init_logging(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt::layer())
            .try_init()?;
        return Ok(None);
    };

    std::fs::create_dir_all(log_dir).map_err(|e| {
        anyhow::anyhow!("failed to create log directory {}: {}", log_dir.display(), e)
    })?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer())
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()?;

    Ok(Some(guard))
}
