//! # File Logger Provider
//!
//! Entry point of the crate. The provider owns the active
//! [`FileProcessor`], hands out named [`FileLogger`]s and applies
//! reconfiguration. All loggers of a provider share one binding cell, so a
//! reload rebinds every existing handle at once.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::{FileLoggerOptions, Settings};
use crate::error::Result;
use crate::formatter::LineFormatter;
use crate::level::LogLevel;
use crate::logger::{Binding, FileLogger, LogFilter, SharedBinding};
use crate::processor::FileProcessor;
use crate::scope::{ScopeProvider, ThreadScopeProvider};

struct ProviderState {
    /// Settings of the active processor.
    settings: Settings,
    scope_provider: Option<Arc<dyn ScopeProvider>>,
}

impl ProviderState {
    /// Scope provider for loggers, creating the default one on first use.
    fn active_scopes(&mut self) -> Option<Arc<dyn ScopeProvider>> {
        if !self.settings.include_scopes {
            return None;
        }
        let provider = self
            .scope_provider
            .get_or_insert_with(|| Arc::new(ThreadScopeProvider::new()));
        Some(Arc::clone(provider))
    }

    /// Starts a processor for the current settings.
    fn bind(&mut self, startup: bool) -> Result<Binding> {
        let processor = FileProcessor::start(&self.settings, startup)?;
        Ok(Binding {
            processor: Arc::new(processor),
            formatter: LineFormatter::new(self.settings.pattern.clone()),
            scopes: self.active_scopes(),
        })
    }
}

/// Creates file loggers and owns the processor they write through.
pub struct FileLoggerProvider {
    loggers: Mutex<HashMap<String, Arc<FileLogger>>>,
    binding: SharedBinding,
    filter: LogFilter,
    /// Also serializes reloads.
    state: Mutex<ProviderState>,
}

impl FileLoggerProvider {
    /// Validates `options` and starts the first processor.
    ///
    /// Every level is enabled; filtering is left to the caller.
    pub fn new(options: &FileLoggerOptions) -> Result<Self> {
        Self::with_filter(options, Arc::new(|_: &str, _: LogLevel| true))
    }

    /// Like [`new`](Self::new), with a `(name, level)` predicate used by
    /// [`FileLogger::is_enabled`].
    pub fn with_filter(options: &FileLoggerOptions, filter: LogFilter) -> Result<Self> {
        let mut state = ProviderState {
            settings: options.validate()?,
            scope_provider: None,
        };
        let binding = state.bind(true)?;

        Ok(FileLoggerProvider {
            loggers: Mutex::new(HashMap::new()),
            binding: Arc::new(RwLock::new(Arc::new(binding))),
            filter,
            state: Mutex::new(state),
        })
    }

    /// Returns the logger named `name`, creating it on first use.
    pub fn create_logger(&self, name: &str) -> Arc<FileLogger> {
        let mut loggers = self.loggers.lock();
        let logger = loggers.entry(name.to_string()).or_insert_with(|| {
            Arc::new(FileLogger::new(
                name.to_string(),
                Arc::clone(&self.filter),
                Arc::clone(&self.binding),
            ))
        });
        Arc::clone(logger)
    }

    /// Replaces the scope provider used when scopes are enabled.
    pub fn set_scope_provider(&self, provider: Arc<dyn ScopeProvider>) {
        let mut state = self.state.lock();
        state.scope_provider = Some(provider);
        let scopes = state.active_scopes();

        let mut binding = self.binding.write();
        *binding = Arc::new(Binding {
            processor: Arc::clone(&binding.processor),
            formatter: binding.formatter.clone(),
            scopes,
        });
    }

    /// Applies new options.
    ///
    /// The options are validated and the target directory is created first;
    /// on error nothing changes. Otherwise the current processor is closed
    /// (its queue drained) and a new one is started, and every logger already
    /// handed out switches to it along with the recompiled pattern and scope
    /// setting. The startup part of the rotation policy is not applied again.
    ///
    /// If the new processor still fails to start, a processor for the
    /// previous settings is started in its place and the error is returned.
    pub fn reload(&self, options: &FileLoggerOptions) -> Result<()> {
        let settings = options.validate()?;
        FileProcessor::prepare(&settings)?;
        let mut state = self.state.lock();

        let previous = Arc::clone(&self.binding.read().processor);
        previous.close();

        let previous_settings = std::mem::replace(&mut state.settings, settings);
        let binding = match state.bind(false) {
            Ok(binding) => binding,
            Err(err) => {
                warn!(error = %err, "file logger reload failed, restoring previous settings");
                state.settings = previous_settings;
                if let Ok(restored) = state.bind(false) {
                    *self.binding.write() = Arc::new(restored);
                }
                return Err(err);
            }
        };
        *self.binding.write() = Arc::new(binding);

        info!(path = %state.settings.path.display(), "file logger reconfigured");
        Ok(())
    }

    /// Path of the live log file.
    pub fn path(&self) -> PathBuf {
        self.state.lock().settings.path.clone()
    }

    /// Closes the active processor, flushing what it has queued.
    ///
    /// Loggers stay usable afterwards but write synchronously.
    pub fn close(&self) {
        let processor = Arc::clone(&self.binding.read().processor);
        processor.close();
    }
}

impl Drop for FileLoggerProvider {
    fn drop(&mut self) {
        self.close();
    }
}
