//! Logging setup for the parkstats binary.
//!
//! Logs go to stderr (stdout carries the JSON results) and, unless
//! disabled, to daily-rotated files in the platform data directory:
//!
//! - `parkstats.<date>.log`: everything the filter lets through
//! - `error.<date>.log`: warnings and errors only
//!
//! ```no_run
//! use parkstats::logging::{self, LogOptions};
//!
//! logging::init(&LogOptions::default()).expect("Failed to initialize logging");
//! tracing::info!("Pipeline started");
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const APP_DIR: &str = "parkstats";

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
    pub file_logging: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            default_filter: "info".to_owned(),
            file_logging: true,
        }
    }
}

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/parkstats/logs`
/// - macOS: `~/Library/Application Support/parkstats/logs`
/// - Linux: `~/.local/share/parkstats/logs`
///
/// # Errors
///
/// Fails when no data directory is known or it cannot be created.
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    Ok(base_dir.join(APP_DIR).join("logs"))
}

fn file_appender(dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(dir)
        .with_context(|| format!("Failed to create {prefix} log appender"))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns error if the log directory cannot be created, a file appender
/// fails, or a subscriber is already installed.
///
/// # Errors
///
/// Fails when the log directory cannot be prepared or a subscriber is
/// already installed.
pub fn init(options: &LogOptions) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.default_filter))
        .context("Failed to create env filter")?;

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let (file_layers, log_dir) = if options.file_logging {
        let log_dir = get_log_dir()?;
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        let all_logs = fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false)
            .with_writer(file_appender(&log_dir, APP_DIR)?);
        let error_logs = fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false)
            .with_writer(file_appender(&log_dir, "error")?)
            .with_filter(EnvFilter::new("warn"));
        (Some(all_logs.and_then(error_logs)), Some(log_dir))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(log_dir) = log_dir {
        tracing::debug!("Logging initialized, log directory: {}", log_dir.display());
    }
    Ok(())
}

/// Gets the path to today's log file
///
/// # Errors
///
/// Propagates [`get_log_dir`] errors.
pub fn get_current_log_path() -> Result<PathBuf> {
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    Ok(get_log_dir()?.join(format!("{APP_DIR}.{today}.log")))
}
