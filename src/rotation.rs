//! # Rotation Policy
//!
//! Decides what happens to the live file when it is opened and before every
//! write, and performs backups.
//!
//! A backup copies the live file `dir/app.log` to `dir/app.<N>.log`, where
//! `N` is one more than the highest ordinal already present in the directory
//! (or `0` for the first backup), then empties the live file. The live file
//! always keeps its configured name.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::config::{BackupMode, Behaviour};
use crate::error::{Error, Result};
use crate::sink::{FileSink, FileState};

/// Unit letters accepted at the end of a size string, with their shift.
const UNITS: [(char, u32); 5] = [('o', 0), ('k', 10), ('m', 20), ('g', 30), ('t', 40)];

/// Parses a human size such as `"10M"`, `"2g"` or `"512"` into bytes.
///
/// A trailing unit letter (`o`, `k`, `m`, `g`, `t`, any case) multiplies the
/// number by 1, 2^10, 2^20, 2^30 or 2^40. Without a unit the whole string is
/// a byte count.
pub fn parse_size(value: &str) -> Result<u64> {
    let invalid = || Error::config("max_size", format!("`{value}` is not a valid size"));
    let value_trimmed = value.trim();
    let last = value_trimmed.chars().last().ok_or_else(invalid)?;

    let unit = UNITS
        .iter()
        .find(|(unit, _)| last.eq_ignore_ascii_case(unit))
        .map(|(_, shift)| *shift);

    match unit {
        Some(shift) => {
            let number = value_trimmed[..value_trimmed.len() - last.len_utf8()]
                .parse::<u64>()
                .map_err(|_| invalid())?;
            number.checked_mul(1u64 << shift).ok_or_else(invalid)
        }
        None => value_trimmed.parse::<u64>().map_err(|_| invalid()),
    }
}

/// What the processor does with the live file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPolicy {
    /// Keep appending; never rotate.
    Append,
    /// Empty the file once when the sink starts, then append.
    Override,
    /// Back the file up when one of the enabled triggers fires.
    Backup {
        mode: BackupMode,
        /// Enabled when `mode.size` is set.
        max_size: Option<u64>,
        /// Enabled when `mode.age` is set.
        max_age: Option<Duration>,
    },
}

impl RotationPolicy {
    pub fn new(
        behaviour: Behaviour,
        mode: BackupMode,
        max_size: Option<u64>,
        max_age: Option<Duration>,
    ) -> Self {
        match behaviour {
            Behaviour::Append => RotationPolicy::Append,
            Behaviour::Override => RotationPolicy::Override,
            Behaviour::Backup => RotationPolicy::Backup {
                mode,
                max_size: max_size.filter(|_| mode.size),
                max_age: max_age.filter(|_| mode.age),
            },
        }
    }

    /// Applies the policy when a sink is set up.
    ///
    /// Truncation and startup backups only happen when `startup` is true,
    /// i.e. on the first configuration, not on reloads.
    pub fn on_open(&self, sink: &mut FileSink, startup: bool) -> io::Result<()> {
        if !startup {
            return Ok(());
        }
        match self {
            RotationPolicy::Override => sink.truncate(),
            RotationPolicy::Backup { mode, .. } if mode.startup => rotate(sink).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Whether the live file must be backed up before the next write.
    pub fn should_rotate(&self, state: &FileState, now: SystemTime) -> bool {
        let RotationPolicy::Backup {
            max_size, max_age, ..
        } = self
        else {
            return false;
        };

        let too_big = max_size.is_some_and(|max| state.len > max);
        let too_old = max_age.is_some_and(|age| {
            state
                .created
                .checked_add(age)
                .is_some_and(|deadline| deadline < now)
        });
        too_big || too_old
    }

    /// Checks the triggers and rotates if needed. Returns the backup written.
    pub fn check(&self, sink: &mut FileSink) -> io::Result<Option<PathBuf>> {
        if !matches!(self, RotationPolicy::Backup { .. }) {
            return Ok(None);
        }
        let state = sink.state()?;
        if self.should_rotate(&state, SystemTime::now()) {
            rotate(sink)
        } else {
            Ok(None)
        }
    }
}

/// Backs up the live file and starts a fresh one.
///
/// An empty or missing live file is not copied, only reset.
pub fn rotate(sink: &mut FileSink) -> io::Result<Option<PathBuf>> {
    sink.close();

    let path = sink.path().to_path_buf();
    let non_empty = match fs::metadata(&path) {
        Ok(meta) => meta.len() > 0,
        Err(err) if err.kind() == io::ErrorKind::NotFound => false,
        Err(err) => return Err(err),
    };

    let backup = if non_empty {
        let ordinal = next_backup_ordinal(&path)?;
        let backup = backup_path(&path, ordinal);
        fs::copy(&path, &backup)?;
        debug!(live = %path.display(), backup = %backup.display(), "log file backed up");
        Some(backup)
    } else {
        None
    };

    sink.truncate()?;
    Ok(backup)
}

/// Name of the backup with the given ordinal: `dir/<stem>.<ordinal><ext>`.
pub fn backup_path(path: &Path, ordinal: u64) -> PathBuf {
    let (stem, ext) = split_name(path);
    let mut name = OsString::from(stem);
    name.push(format!(".{ordinal}{ext}"));
    path.with_file_name(name)
}

/// One more than the highest backup ordinal found next to `path`, or 0.
pub fn next_backup_ordinal(path: &Path) -> io::Result<u64> {
    let (stem, ext) = split_name(path);
    let prefix = format!("{stem}.");
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut highest: Option<u64> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(ordinal) = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(&ext))
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u64>().ok())
        else {
            continue;
        };
        highest = Some(highest.map_or(ordinal, |h| h.max(ordinal)));
    }

    match highest {
        None => Ok(0),
        Some(h) => h
            .checked_add(1)
            .ok_or_else(|| io::Error::other("backup ordinal overflow")),
    }
}

/// Splits `path` into its file stem and its extension including the dot.
fn split_name(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, ext)
}
