//! # FileKeeper - Asynchronous File Logging with Rotation
//!
//! FileKeeper writes log lines to a single file through a bounded queue and
//! one background writer thread, rotating the file by size, age or at startup.
//!
//! ## Key Features
//!
//! - **Asynchronous Processing**: Lines are rendered on the calling thread and
//!   written by a dedicated worker thread, in queue order
//! - **Backpressure**: The queue holds 1024 lines; producers wait when it is full
//! - **No Lost Lines**: Once the queue is closed, log calls fall back to
//!   synchronous writes
//! - **Rotation**: Append, override or numbered backups (`app.log` becomes
//!   `app.0.log`, `app.1.log`, ...)
//! - **Message Patterns**: `%date [%lvl] %name - %message` style templates,
//!   compiled once per configuration
//! - **Runtime Reload**: Existing logger handles follow a reconfiguration
//!
//! ## Architecture
//!
//! - **Producer**: A [`FileLogger`] formats a record with a [`LineFormatter`]
//!   and hands the text to its [`FileProcessor`]
//! - **Consumer**: A worker thread drains the queue and applies the
//!   [`RotationPolicy`] before every append
//! - **Provider**: The [`FileLoggerProvider`] owns the processor, creates
//!   loggers and rebinds them on reload
//!
//! ## Configuration Reference
//!
//! [`FileLoggerOptions::from_hashmap`] accepts a `HashMap<String, String>`
//! with the following keys:
//!
//! - `"path"`: log file path; a leading `~` resolves against the executable's directory
//! - `"include_scopes"`: `"true"` or `"false"`
//! - `"pattern"`: message pattern (default `"%date [%lvl] %name - %message"`)
//! - `"behaviour"`: `"append"`, `"override"` or `"backup"`
//! - `"backup_mode"`: any of `"startup"`, `"size"`, `"age"` joined by `|` or `,`
//! - `"max_size"`: size with an optional unit, e.g. `"10M"` or `"512"`
//! - `"max_age"`: age in seconds
//!
//! ## Usage Example
//!
//! ```rust
//! use file_keeper::{FileLoggerOptions, FileLoggerProvider, Logger};
//!
//! let dir = std::env::temp_dir().join("file_keeper_doc");
//! let options = FileLoggerOptions::new(dir.join("app.log").to_string_lossy());
//! let provider = FileLoggerProvider::new(&options).unwrap();
//!
//! let logger = provider.create_logger("App");
//! logger.info("Application started");
//! logger.warn("This is a warning");
//!
//! // Flushes the queue and releases the file
//! provider.close();
//! ```
//!
//! ## Backup Rotation
//!
//! ```rust
//! use std::collections::HashMap;
//! use file_keeper::{FileLoggerOptions, FileLoggerProvider};
//!
//! let dir = std::env::temp_dir().join("file_keeper_doc_backup");
//! let mut config: HashMap<String, String> = HashMap::new();
//! config.insert("path".to_string(), dir.join("app.log").to_string_lossy().into_owned());
//! config.insert("behaviour".to_string(), "backup".to_string());
//! config.insert("backup_mode".to_string(), "startup|size".to_string());
//! config.insert("max_size".to_string(), "10M".to_string());
//!
//! let options = FileLoggerOptions::from_hashmap(Some(config)).unwrap();
//! let provider = FileLoggerProvider::new(&options).unwrap();
//! // Use loggers...
//! provider.close();
//! ```
mod buffer;
mod config;
mod error;
mod formatter;
mod level;
mod logger;
mod pattern;
mod processor;
mod provider;
mod rotation;
mod scope;
mod sink;
mod worker;

pub use crate::config::{BackupMode, Behaviour, FileLoggerOptions, Settings};
pub use crate::error::{Error, Result};
pub use crate::formatter::{ExceptionInfo, LineFormatter, MAX_EXCEPTION_DEPTH};
pub use crate::level::LogLevel;
pub use crate::logger::{FileLogger, LogFilter};
pub use crate::pattern::{CompiledPattern, PatternArg, PatternArgs, Segment, DEFAULT_PATTERN};
pub use crate::processor::{FileProcessor, ProcessorState, QUEUE_CAPACITY};
pub use crate::provider::FileLoggerProvider;
pub use crate::rotation::{parse_size, RotationPolicy};
pub use crate::scope::{ScopeGuard, ScopeProvider, ThreadScopeProvider};
pub use crate::sink::{FileSink, FileState};

/// The logging interface implemented by [`FileLogger`].
///
/// # Thread Safety
///
/// Implementors must be `Send + Sync + 'static` so that a logger can be
/// shared between threads without lifetime constraints.
pub trait Logger: Send + Sync + 'static {
    /// Writes a record if `level` is enabled.
    ///
    /// # Arguments
    ///
    /// * `level` - Severity of the record
    /// * `event_id` - Numeric event identifier
    /// * `message` - The message text; an empty message writes only the exception
    /// * `exception` - Optional failure with its chain of causes
    fn log(&self, level: LogLevel, event_id: i32, message: &str, exception: Option<&ExceptionInfo>);

    /// Logs a trace message.
    fn trace<S: AsRef<str>>(&self, message: S) {
        self.log(LogLevel::Trace, 0, message.as_ref(), None);
    }

    /// Logs a debug message.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to log (anything that can be converted to a string reference)
    fn debug<S: AsRef<str>>(&self, message: S) {
        self.log(LogLevel::Debug, 0, message.as_ref(), None);
    }

    /// Logs an informational message.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to log (anything that can be converted to a string reference)
    fn info<S: AsRef<str>>(&self, message: S) {
        self.log(LogLevel::Information, 0, message.as_ref(), None);
    }

    /// Logs a warning message.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to log (anything that can be converted to a string reference)
    fn warn<S: AsRef<str>>(&self, message: S) {
        self.log(LogLevel::Warning, 0, message.as_ref(), None);
    }

    /// Logs an error message.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to log (anything that can be converted to a string reference)
    fn error<S: AsRef<str>>(&self, message: S) {
        self.log(LogLevel::Error, 0, message.as_ref(), None);
    }

    /// Logs a critical message.
    fn critical<S: AsRef<str>>(&self, message: S) {
        self.log(LogLevel::Critical, 0, message.as_ref(), None);
    }
}
