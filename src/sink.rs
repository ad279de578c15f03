//! # File Sink
//!
//! Owns the handle of the live log file. The handle is opened lazily in
//! append mode on the first write and can be closed at any time; the next
//! append simply reopens it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Snapshot of the live file used by the rotation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileState {
    /// Current length in bytes (0 if the file does not exist).
    pub len: u64,
    /// When the current generation of the file was started.
    pub created: SystemTime,
}

/// The live log file.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
    created: SystemTime,
}

impl FileSink {
    /// Creates a sink for `path` without opening the file.
    ///
    /// The creation time of an existing file is taken from its metadata,
    /// falling back to the modification time where the platform does not
    /// record creation times.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let created = fs::metadata(&path)
            .and_then(|meta| meta.created().or_else(|_| meta.modified()))
            .unwrap_or_else(|_| SystemTime::now());

        FileSink {
            path,
            file: None,
            created,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Length and creation time of the live file.
    pub fn state(&self) -> io::Result<FileState> {
        let len = match &self.file {
            Some(file) => file.metadata()?.len(),
            None => match fs::metadata(&self.path) {
                Ok(meta) => meta.len(),
                Err(err) if err.kind() == io::ErrorKind::NotFound => 0,
                Err(err) => return Err(err),
            },
        };

        Ok(FileState {
            len,
            created: self.created,
        })
    }

    /// Appends `text` and flushes it to the OS.
    pub fn append(&mut self, text: &str) -> io::Result<()> {
        let file = match self.file.take() {
            Some(file) => file,
            None => OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?,
        };
        let file = self.file.insert(file);

        file.write_all(text.as_bytes())?;
        file.flush()
    }

    /// Empties the live file and starts a new generation of it.
    ///
    /// The file is recreated rather than truncated in place so that its
    /// creation time on disk is reset as well.
    pub fn truncate(&mut self) -> io::Result<()> {
        self.close();
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        File::create(&self.path)?;
        self.created = SystemTime::now();
        Ok(())
    }

    /// Releases the file handle.
    pub fn close(&mut self) {
        self.file = None;
    }

    #[cfg(test)]
    pub(crate) fn set_created(&mut self, created: SystemTime) {
        self.created = created;
    }
}
