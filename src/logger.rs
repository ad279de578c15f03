//! # File Logger Handle

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::formatter::{ExceptionInfo, LineFormatter};
use crate::level::LogLevel;
use crate::processor::FileProcessor;
use crate::scope::{ScopeGuard, ScopeProvider};
use crate::Logger;

/// Predicate deciding whether a logger writes a level: `(name, level)`.
pub type LogFilter = Arc<dyn Fn(&str, LogLevel) -> bool + Send + Sync>;

/// Everything a logger needs to turn a call into a queued line.
///
/// A binding is immutable. Reconfiguration builds a new one and swaps it into
/// the shared cell every logger of a provider reads from.
pub(crate) struct Binding {
    pub processor: Arc<FileProcessor>,
    pub formatter: LineFormatter,
    pub scopes: Option<Arc<dyn ScopeProvider>>,
}

pub(crate) type SharedBinding = Arc<RwLock<Arc<Binding>>>;

/// A named logger writing to the file of its provider.
///
/// Handles stay valid across reloads of the provider: each call picks up the
/// processor, pattern and scope provider that are current at that moment.
pub struct FileLogger {
    name: String,
    filter: LogFilter,
    binding: SharedBinding,
}

impl fmt::Debug for FileLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLogger")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl FileLogger {
    pub(crate) fn new(name: String, filter: LogFilter, binding: SharedBinding) -> Self {
        FileLogger {
            name,
            filter,
            binding,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a message at `level` would be written.
    ///
    /// `LogLevel::None` is never enabled; every other level is delegated to
    /// the filter supplied to the provider.
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::None && (self.filter)(&self.name, level)
    }

    /// Pushes `state` as a scope for lines written from this thread.
    ///
    /// Returns a no-op guard when scopes are disabled.
    pub fn begin_scope(&self, state: impl fmt::Display) -> ScopeGuard {
        let scopes = self.binding.read().scopes.clone();
        match scopes {
            Some(provider) => provider.push(state.to_string()),
            None => ScopeGuard::noop(),
        }
    }

    /// Logs a typed state rendered through `formatter`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingArgument` if the level is enabled but no
    /// formatter is given. Sink failures are never reported here.
    pub fn log_state<S, F>(
        &self,
        level: LogLevel,
        event_id: i32,
        state: &S,
        exception: Option<&ExceptionInfo>,
        formatter: Option<F>,
    ) -> Result<()>
    where
        F: FnOnce(&S, Option<&ExceptionInfo>) -> String,
    {
        if !self.is_enabled(level) {
            return Ok(());
        }
        let formatter = formatter.ok_or(Error::MissingArgument("formatter"))?;
        let message = formatter(state, exception);
        self.write_message(level, event_id, &message, exception);
        Ok(())
    }

    fn write_message(
        &self,
        level: LogLevel,
        event_id: i32,
        message: &str,
        exception: Option<&ExceptionInfo>,
    ) {
        if message.is_empty() && exception.is_none() {
            return;
        }

        let binding = Arc::clone(&self.binding.read());
        let scopes = binding
            .scopes
            .as_ref()
            .map(|provider| provider.scopes())
            .unwrap_or_default();

        let line = binding
            .formatter
            .render(level, &self.name, event_id, message, exception, &scopes);
        binding.processor.enqueue(line);
    }
}

impl Logger for FileLogger {
    fn log(
        &self,
        level: LogLevel,
        event_id: i32,
        message: &str,
        exception: Option<&ExceptionInfo>,
    ) {
        if self.is_enabled(level) {
            self.write_message(level, event_id, message, exception);
        }
    }
}
