//! # Log Levels

use crate::error::Error;
use std::{fmt, str::FromStr};

/// Represents the severity of a log message.
///
/// The levels follow increasing severity:
/// `Trace < Debug < Information < Warning < Error < Critical`.
/// `None` sits above every real level and is never written; it exists so a
/// filter can switch a logger off entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Very detailed diagnostics, usually disabled in production.
    Trace = 0,

    /// Diagnostic information useful while developing.
    Debug = 1,

    /// General runtime events.
    Information = 2,

    /// Something unexpected happened but the application keeps working.
    Warning = 3,

    /// An operation failed.
    Error = 4,

    /// A failure that requires immediate attention.
    Critical = 5,

    /// Not a severity: disables logging.
    None = 6,
}

impl LogLevel {
    /// Full display name of the level, e.g. `Information`.
    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Trace => "Trace",
            LogLevel::Debug => "Debug",
            LogLevel::Information => "Information",
            LogLevel::Warning => "Warning",
            LogLevel::Error => "Error",
            LogLevel::Critical => "Critical",
            LogLevel::None => "None",
        }
    }

    /// Fixed-width (four character) token of the level, e.g. `Info`.
    pub fn abbreviation(self) -> &'static str {
        match self {
            LogLevel::Trace => "Trce",
            LogLevel::Debug => "Dbug",
            LogLevel::Information => "Info",
            LogLevel::Warning => "Warn",
            LogLevel::Error => "Fail",
            LogLevel::Critical => "Crit",
            LogLevel::None => "None",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    /// Parses a level from its name or abbreviation (case-insensitive).
    ///
    /// `"info"`, `"information"`, `"warn"` and `"warning"` are all accepted.
    /// Returns an `Error::InvalidLevel` if the input is unrecognized.
    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "trace" | "trce" => Ok(LogLevel::Trace),
            "debug" | "dbug" => Ok(LogLevel::Debug),
            "information" | "info" => Ok(LogLevel::Information),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" | "fail" => Ok(LogLevel::Error),
            "critical" | "crit" => Ok(LogLevel::Critical),
            "none" => Ok(LogLevel::None),
            _ => Err(Error::InvalidLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Information);
        assert!(LogLevel::Information < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Critical);
        assert!(LogLevel::Critical < LogLevel::None);
    }

    #[test]
    fn test_abbreviations_are_fixed_width() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Information,
            LogLevel::Warning,
            LogLevel::Error,
            LogLevel::Critical,
        ] {
            assert_eq!(level.abbreviation().len(), 4, "{level}");
        }
        assert_eq!(LogLevel::Error.abbreviation(), "Fail");
        assert_eq!(LogLevel::Information.abbreviation(), "Info");
    }

    #[test]
    fn test_display_uses_full_name() {
        assert_eq!(LogLevel::Information.to_string(), "Information");
        assert_eq!(LogLevel::Critical.to_string(), "Critical");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Information);
        assert_eq!("Warning".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("fail".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!(matches!(
            "silly".parse::<LogLevel>(),
            Err(Error::InvalidLevel(s)) if s == "silly"
        ));
    }
}
