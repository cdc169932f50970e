//! Configuration error model.

use thiserror::Error;

/// Result type used while building configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Startup configuration failure.
///
/// Raised once, before any network or database I/O happens. A run never starts
/// with a partially valid configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key was not set at all.
    #[error("missing configuration key: {0}")]
    Missing(String),

    /// A required key was set to an empty or whitespace-only value.
    #[error("configuration key is blank: {0}")]
    Blank(String),

    /// A key was set but its value cannot be used.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing(key.into())
    }

    pub fn blank(key: impl Into<String>) -> Self {
        Self::Blank(key.into())
    }

    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
