//! # Error Handling

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents all possible errors that can occur in the file logging system.
///
/// Configuration problems are reported when options are applied (setup or
/// reload). I/O problems met by the background worker are never surfaced to
/// log callers; they switch the processor into its degraded write mode instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Represents an underlying I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value was missing or could not be interpreted.
    ///
    /// # Fields
    /// - `field`: The name of the offending option.
    /// - `reason`: Why the value was refused.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Error triggered when a log level string cannot be parsed.
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Error triggered when a behaviour string cannot be parsed.
    #[error("Invalid file behaviour: {0}")]
    InvalidBehaviour(String),

    /// Error triggered when a backup mode flag cannot be parsed.
    #[error("Invalid backup mode: {0}")]
    InvalidBackupMode(String),

    /// A required collaborator was not supplied by the caller.
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),
}

impl Error {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
