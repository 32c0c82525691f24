//! MacroBot Library
//!
//! A multi-client chat macro bot: each configured client accepts
//! owner-issued commands inside channels and repeats a fixed message on
//! a fixed interval in that channel until told to stop.

pub mod cli;
pub mod command;
pub mod config;
pub mod interval;
pub mod macros;
pub mod session;
pub mod supervisor;
pub mod transport;

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::LogConfig;

/// Application result type for consistent error handling
pub type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Initialize tracing subscriber for logging
///
/// Installs a stdout fmt layer plus a non-blocking file layer at the
/// configured path. The returned guard must stay alive for the process
/// lifetime, otherwise buffered log lines are dropped.
pub fn init_logging(level: &str, log_config: &LogConfig) -> Result<WorkerGuard> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_path = Path::new(&log_config.file_path);
    let log_dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    let log_file = log_path
        .file_name()
        .context("log file path has no file name component")?;

    let appender = tracing_appender::rolling::never(log_dir, log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("macrobot={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}
