//! # Line Formatter
//!
//! Turns one log call into the finished text that is queued for the file:
//! the scope prefix, the pattern-formatted message line and one line pair per
//! exception in the cause chain.

use std::sync::Arc;

use chrono::Local;

use crate::buffer::BufferPool;
use crate::level::LogLevel;
use crate::pattern::{CompiledPattern, PatternArgs, DATE_FORMAT};

/// Maximum number of links followed in an exception cause chain.
pub const MAX_EXCEPTION_DEPTH: usize = 64;

/// Type name recorded for the sources of an error converted with
/// [`ExceptionInfo::from_error`].
const SOURCE_TYPE_NAME: &str = "caused by";

/// A failure attached to a log record, with its chain of causes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    type_name: String,
    message: String,
    stack_trace: Option<String>,
    cause: Option<Box<ExceptionInfo>>,
}

impl ExceptionInfo {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        ExceptionInfo {
            type_name: type_name.into(),
            message: message.into(),
            stack_trace: None,
            cause: None,
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Attaches the failure that caused this one.
    pub fn with_cause(mut self, cause: ExceptionInfo) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Builds an exception chain from a Rust error and its `source()` links.
    ///
    /// The outer error is named after its type; sources are recorded as
    /// `caused by`. At most [`MAX_EXCEPTION_DEPTH`] links are kept.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        let mut sources = Vec::new();
        let mut next = error.source();
        while let Some(source) = next {
            if sources.len() + 1 >= MAX_EXCEPTION_DEPTH {
                break;
            }
            sources.push(source.to_string());
            next = source.source();
        }

        let cause = sources.into_iter().rev().fold(None, |cause, message| {
            let mut link = ExceptionInfo::new(SOURCE_TYPE_NAME, message);
            link.cause = cause.map(Box::new);
            Some(link)
        });

        let mut info = ExceptionInfo::new(std::any::type_name::<E>(), error.to_string());
        info.cause = cause.map(Box::new);
        info
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }

    pub fn cause(&self) -> Option<&ExceptionInfo> {
        self.cause.as_deref()
    }

    /// Iterates from this exception outward through its causes.
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            next: Some(self),
            remaining: MAX_EXCEPTION_DEPTH,
        }
    }
}

/// Iterator over an exception and its causes, bounded by
/// [`MAX_EXCEPTION_DEPTH`].
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    next: Option<&'a ExceptionInfo>,
    remaining: usize,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a ExceptionInfo;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = current.cause();
        Some(current)
    }
}

/// Assembles finished log lines from a compiled pattern.
///
/// Cloning is cheap: the pattern and the scratch buffer pool are shared.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    pattern: Arc<CompiledPattern>,
    pool: Arc<BufferPool>,
}

impl LineFormatter {
    pub fn new(pattern: CompiledPattern) -> Self {
        LineFormatter {
            pattern: Arc::new(pattern),
            pool: Arc::new(BufferPool::new()),
        }
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// Renders a record stamped with the current local time.
    pub fn render(
        &self,
        level: LogLevel,
        logger_name: &str,
        event_id: i32,
        message: &str,
        exception: Option<&ExceptionInfo>,
        scopes: &[String],
    ) -> String {
        let timestamp = Local::now().format(DATE_FORMAT).to_string();
        self.render_at(
            &timestamp,
            level,
            logger_name,
            event_id,
            message,
            exception,
            scopes,
        )
    }

    /// Renders a record with an explicit timestamp text.
    #[allow(clippy::too_many_arguments)]
    pub fn render_at(
        &self,
        timestamp: &str,
        level: LogLevel,
        logger_name: &str,
        _event_id: i32,
        message: &str,
        exception: Option<&ExceptionInfo>,
        scopes: &[String],
    ) -> String {
        let mut buffer = self.pool.take();

        // the first line follows the last scope directly
        for (i, scope) in scopes.iter().enumerate() {
            buffer.push_str(if i == 0 { "=> " } else { " => " });
            buffer.push_str(scope);
        }

        if !message.is_empty() {
            self.push_line(&mut buffer, timestamp, level, logger_name, message);
        }

        if let Some(exception) = exception {
            for link in exception.chain() {
                let text = format!("{}: {}", link.type_name(), link.message());
                self.push_line(&mut buffer, timestamp, level, logger_name, &text);
                if let Some(trace) = link.stack_trace() {
                    buffer.push_str(trace);
                    buffer.push('\n');
                }
            }
        }

        let line = String::from(buffer.as_str());
        self.pool.recycle(buffer);
        line
    }

    fn push_line(
        &self,
        buffer: &mut String,
        timestamp: &str,
        level: LogLevel,
        logger_name: &str,
        message: &str,
    ) {
        let args = PatternArgs {
            timestamp,
            level,
            name: logger_name,
            message,
        };
        self.pattern.render_into(buffer, &args);
        if !self.pattern.has_message() {
            buffer.push_str(message);
        }
        buffer.push('\n');
    }
}
