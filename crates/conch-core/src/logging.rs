//! File logging for the console
//!
//! Stdout belongs to the headless NDJSON stream, so all tracing output goes
//! to a daily rolling file. The filter comes from `CONCH_LOG`.

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "CONCH_LOG";

/// File name prefix; the appender appends `.YYYY-MM-DD`
pub const LOG_FILE_PREFIX: &str = "conch.log";

/// Filter used when `CONCH_LOG` is unset or invalid
pub const DEFAULT_DIRECTIVES: &str =
    "conch_console=info,conch_app=info,conch_api=info,conch_i18n=info,conch_core=info,warn";

/// Initialize logging under the platform data directory.
///
/// Returns the directory logs are written to.
///
/// # Examples
/// ```bash
/// CONCH_LOG=debug conch /rack
/// CONCH_LOG=conch_app=trace conch /device/HX-42
/// ```
pub fn init() -> Result<PathBuf> {
    let log_dir = log_directory();
    init_in(&log_dir)?;
    Ok(log_dir)
}

/// Initialize logging into `log_dir`. Fails if a global subscriber is
/// already installed.
pub fn init_in(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| Error::config(format!("Failed to install logger: {}", e)))?;

    tracing::info!("Conch console logging to {}", log_dir.display());
    Ok(())
}

/// Filter from `CONCH_LOG`, falling back to [`DEFAULT_DIRECTIVES`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// `<data_local_dir>/conch/logs`, or `./conch/logs` without a data dir.
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("conch")
        .join("logs")
}
