use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Log files are named `partsync.<date>.log`.
pub const LOG_FILE_PREFIX: &str = "partsync";

/// Daily files kept on disk; older ones are removed on rotation.
pub const MAX_LOG_FILES: usize = 3;

#[derive(Debug, Error)]
pub enum LogInitError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open rolling log file: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),
}

/// Initialize tracing/logging for the process.
///
/// JSON lines on stdout, filtered by `RUST_LOG` (default `info`). With a
/// `log_dir`, the same events also go to a daily-rolling plain-text file.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(log_dir: Option<&Path>) -> Result<(), LogInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_dir {
        Some(dir) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(rolling_appender(dir)?),
        ),
        None => None,
    };

    let already_set = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_target(false))
        .with(file_layer)
        .try_init()
        .is_err();

    if already_set {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

fn rolling_appender(dir: &Path) -> Result<RollingFileAppender, LogInitError> {
    std::fs::create_dir_all(dir).map_err(|source| LogInitError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    Ok(RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)?)
}
