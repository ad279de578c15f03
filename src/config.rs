//! # Configuration Module
//!
//! [`FileLoggerOptions`] holds the raw, user-facing values. They can be set
//! field by field, through the builder methods, or from a
//! `HashMap<String, String>` (e.g. parsed from CLI, environment variables or a
//! config file). [`FileLoggerOptions::validate`] checks everything at once and
//! produces the [`Settings`] a processor is built from, so a bad value is
//! reported when the options are applied and never while writing.
//!
//! ## Keys accepted by `from_hashmap`
//!
//! - `path`: log file path; a leading `~` is resolved against the directory
//!   of the running executable (e.g. `"~/logs/app.log"`)
//! - `include_scopes`: `"true"` or `"false"`
//! - `pattern`: message pattern (default `"%date [%lvl] %name - %message"`)
//! - `behaviour`: `"append"`, `"override"` or `"backup"`
//! - `backup_mode`: any combination of `"startup"`, `"size"`, `"age"`
//!   separated by `,` or `|`
//! - `max_size`: size with an optional unit, e.g. `"10M"`
//! - `max_age`: age in seconds, e.g. `"86400"`

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::pattern::{CompiledPattern, DEFAULT_PATTERN};
use crate::rotation::{parse_size, RotationPolicy};

/// What happens to the log file left by a previous run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Behaviour {
    /// Keep appending to the existing file.
    #[default]
    Append,
    /// Empty the file when the application starts.
    Override,
    /// Back the file up according to the [`BackupMode`] triggers.
    Backup,
}

impl FromStr for Behaviour {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "append" => Ok(Behaviour::Append),
            "override" => Ok(Behaviour::Override),
            "backup" => Ok(Behaviour::Backup),
            _ => Err(Error::InvalidBehaviour(s.to_string())),
        }
    }
}

/// Triggers for [`Behaviour::Backup`]. The flags combine freely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupMode {
    /// Back up once when the application starts.
    pub startup: bool,
    /// Back up when the file grows beyond `max_size`.
    pub size: bool,
    /// Back up when the file is older than `max_age`.
    pub age: bool,
}

impl BackupMode {
    pub const STARTUP: BackupMode = BackupMode {
        startup: true,
        size: false,
        age: false,
    };
    pub const SIZE: BackupMode = BackupMode {
        startup: false,
        size: true,
        age: false,
    };
    pub const AGE: BackupMode = BackupMode {
        startup: false,
        size: false,
        age: true,
    };

    pub fn is_empty(&self) -> bool {
        !(self.startup || self.size || self.age)
    }
}

impl std::ops::BitOr for BackupMode {
    type Output = BackupMode;

    fn bitor(self, rhs: BackupMode) -> BackupMode {
        BackupMode {
            startup: self.startup || rhs.startup,
            size: self.size || rhs.size,
            age: self.age || rhs.age,
        }
    }
}

impl FromStr for BackupMode {
    type Err = Error;

    /// Parses flags such as `"Startup|Size"` or `"size, age"`.
    fn from_str(s: &str) -> Result<Self> {
        s.split([',', '|'])
            .map(str::trim)
            .filter(|flag| !flag.is_empty())
            .try_fold(BackupMode::default(), |mode, flag| {
                let flag_mode = match flag.to_lowercase().as_str() {
                    "startup" => BackupMode::STARTUP,
                    "size" => BackupMode::SIZE,
                    "age" => BackupMode::AGE,
                    "default" | "none" => BackupMode::default(),
                    _ => return Err(Error::InvalidBackupMode(flag.to_string())),
                };
                Ok(mode | flag_mode)
            })
    }
}

impl fmt::Display for BackupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags: Vec<&str> = [
            (self.startup, "Startup"),
            (self.size, "Size"),
            (self.age, "Age"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();

        if flags.is_empty() {
            f.write_str("Default")
        } else {
            f.write_str(&flags.join("|"))
        }
    }
}

/// Raw options of a file logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLoggerOptions {
    pub path: Option<String>,
    pub include_scopes: bool,
    pub pattern: String,
    pub behaviour: Behaviour,
    pub backup_mode: BackupMode,
    pub max_size: Option<String>,
    pub max_age: Option<Duration>,
}

impl Default for FileLoggerOptions {
    fn default() -> Self {
        FileLoggerOptions {
            path: None,
            include_scopes: false,
            pattern: DEFAULT_PATTERN.to_string(),
            behaviour: Behaviour::Append,
            backup_mode: BackupMode::default(),
            max_size: None,
            max_age: None,
        }
    }
}

impl FileLoggerOptions {
    /// Options writing to `path` with every other value defaulted.
    pub fn new(path: impl Into<String>) -> Self {
        FileLoggerOptions {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_include_scopes(mut self, include_scopes: bool) -> Self {
        self.include_scopes = include_scopes;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn with_backup_mode(mut self, backup_mode: BackupMode) -> Self {
        self.backup_mode = backup_mode;
        self
    }

    pub fn with_max_size(mut self, max_size: impl Into<String>) -> Self {
        self.max_size = Some(max_size.into());
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Builds options from string key/value pairs. Unknown keys are ignored.
    ///
    /// Only the syntax of each value is checked here; cross-field rules are
    /// enforced by [`validate`](Self::validate).
    pub fn from_hashmap(config: Option<HashMap<String, String>>) -> Result<Self> {
        let mut options = FileLoggerOptions::default();
        let Some(config) = config else {
            return Ok(options);
        };

        for (key, value) in &config {
            match key.as_str() {
                "path" => options.path = Some(value.clone()),
                "include_scopes" => {
                    options.include_scopes = value.trim().parse::<bool>().map_err(|_| {
                        Error::config("include_scopes", format!("`{value}` is not a boolean"))
                    })?
                }
                "pattern" => options.pattern = value.clone(),
                "behaviour" => options.behaviour = value.parse()?,
                "backup_mode" => options.backup_mode = value.parse()?,
                "max_size" => options.max_size = Some(value.clone()),
                "max_age" => {
                    let secs = value.trim().parse::<u64>().map_err(|_| {
                        Error::config("max_age", format!("`{value}` is not a number of seconds"))
                    })?;
                    options.max_age = Some(Duration::from_secs(secs));
                }
                _ => {}
            }
        }
        Ok(options)
    }

    /// Checks the options and produces the settings a processor runs with.
    ///
    /// # Errors
    ///
    /// - missing or empty `path`, or a `~` path that cannot be resolved
    /// - `max_size` missing or unparsable while the size trigger is enabled
    /// - `max_age` missing or zero while the age trigger is enabled
    pub fn validate(&self) -> Result<Settings> {
        let raw_path = self
            .path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| Error::config("path", "a log file path is required"))?;
        let path = resolve_path(raw_path)?;

        let mut max_size = None;
        let mut max_age = None;
        if self.behaviour == Behaviour::Backup {
            if self.backup_mode.size {
                let raw = self.max_size.as_deref().ok_or_else(|| {
                    Error::config("max_size", "required when the size trigger is enabled")
                })?;
                max_size = Some(parse_size(raw)?);
            }
            if self.backup_mode.age {
                match self.max_age {
                    Some(age) if !age.is_zero() => max_age = Some(age),
                    _ => {
                        return Err(Error::config(
                            "max_age",
                            "must be positive when the age trigger is enabled",
                        ))
                    }
                }
            }
        }

        Ok(Settings {
            path,
            include_scopes: self.include_scopes,
            pattern: CompiledPattern::compile(&self.pattern),
            policy: RotationPolicy::new(self.behaviour, self.backup_mode, max_size, max_age),
        })
    }
}

/// Validated, immutable configuration of one processor generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub path: PathBuf,
    pub include_scopes: bool,
    pub pattern: CompiledPattern,
    pub policy: RotationPolicy,
}

/// Resolves a `~`-prefixed path against the directory of the executable.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let Some(rest) = path.strip_prefix('~') else {
        return Ok(PathBuf::from(path));
    };

    let exe = std::env::current_exe()
        .map_err(|err| Error::config("path", format!("cannot resolve `{path}`: {err}")))?;
    let base = exe
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::config("path", format!("cannot resolve `{path}`")))?;

    Ok(base.join(rest.trim_start_matches(['/', '\\'])))
}
