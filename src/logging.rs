//! Logging setup.
//!
//! Logs go to stderr (stdout is reserved for answers) and to a daily-rolling file
//! under the platform data directory.
//!
//! ```no_run
//! tabletalk::logging::init(false).expect("Failed to initialize logging");
//! tracing::info!("ready");
//! ```

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/tabletalk/logs`
/// - macOS: `~/Library/Application Support/tabletalk/logs`
/// - Linux: `~/.local/share/tabletalk/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let log_dir = crate::utils::data_dir()
        .context("Failed to determine data directory")?
        .join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `info` for verbose runs and
/// `warn` for quiet ones.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or the file appender fails
pub fn init(verbose: bool) -> Result<()> {
    let log_dir = get_log_dir()?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("tabletalk")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create log file appender")?;

    let default_level = if verbose { "info" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("Failed to create env filter")?;

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(file_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::debug!("Logging initialized, log directory: {}", log_dir.display());

    Ok(())
}

/// Gets the path to today's log file
pub fn get_current_log_path() -> Result<PathBuf> {
    let log_dir = get_log_dir()?;
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    Ok(log_dir.join(format!("tabletalk.{today}.log")))
}
