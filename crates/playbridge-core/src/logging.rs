//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable controlling the log filter
pub const LOG_ENV: &str = "PLAYBRIDGE_LOG";

/// Initialize the logging subsystem
///
/// Logs are written to `<data-local-dir>/play-bridge/logs/`.
/// Log level is controlled by the `PLAYBRIDGE_LOG` environment variable.
///
/// # Examples
/// ```bash
/// PLAYBRIDGE_LOG=debug playbridge simulate scenario.toml
/// PLAYBRIDGE_LOG=playbridge_app=trace playbridge simulate scenario.toml
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "playbridge.log");

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("Play Bridge starting");
    tracing::info!("Log directory: {}", log_dir.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(())
}

fn default_filter() -> &'static str {
    "playbridge=info,playbridge_core=info,playbridge_vendor=info,playbridge_app=info,warn"
}

/// Get the log directory path
fn get_log_directory() -> Result<PathBuf> {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join("play-bridge").join("logs"))
}

/// Get the log file path for the current day
pub fn get_current_log_file() -> Result<PathBuf> {
    let dir = get_log_directory()?;
    Ok(dir.join("playbridge.log"))
}
