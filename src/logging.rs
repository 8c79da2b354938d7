/*!
 * Logging and tracing initialization
 */

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::config::MaintenanceConfig;
use crate::error::{BroomError, Result};

/// Initialize structured logging based on configuration.
///
/// With a configured `log_dir`, a fresh timestamped log file is created there
/// and the path is returned; otherwise logs go to stderr. `RUST_LOG` wins
/// over the configured verbosity when set.
pub fn init_logging(config: &MaintenanceConfig) -> Result<Option<PathBuf>> {
    let level = if config.verbose { "debug" } else { "info" };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("broom={}", level)))
        .map_err(|e| BroomError::Config(format!("failed to create log filter: {}", e)))?;

    match &config.log_dir {
        Some(dir) => init_file_logging(dir, env_filter).map(Some),
        None => {
            init_stderr_logging(env_filter);
            Ok(None)
        }
    }
}

/// Name of the log file for a run starting at `now`
fn log_file_name(now: DateTime<Local>) -> String {
    format!("broom-{}.log", now.format("%Y%m%d-%H%M%S"))
}

fn init_stderr_logging(env_filter: EnvFilter) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn init_file_logging(log_dir: &Path, env_filter: EnvFilter) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        BroomError::Config(format!(
            "failed to create log directory {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let log_path = log_dir.join(log_file_name(Local::now()));
    let file = File::create(&log_path).map_err(|e| {
        BroomError::Config(format!(
            "failed to create log file {}: {}",
            log_path.display(),
            e
        ))
    })?;

    let fmt_layer = fmt::layer()
        .with_writer(Arc::new(file))
        .with_target(true)
        .with_ansi(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(log_path)
}
