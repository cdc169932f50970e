//! Tracing/logging setup shared by every binary in the workspace.

/// Subscriber initialisation (console + rolling file).
pub mod logging;

pub use logging::{LOG_FILE_PREFIX, LogInitError, MAX_LOG_FILES, init};
