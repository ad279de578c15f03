//! # File Processor
//!
//! A processor is one generation of the delivery pipeline: a bounded queue of
//! finished lines, the [`Worker`] draining it, and the [`LogFile`] both of
//! them write to.
//!
//! ## Lifecycle
//!
//! 1. **Open**: producers push lines into the queue and block while it is
//!    full.
//! 2. **Draining**: [`FileProcessor::close`] stops the queue from accepting;
//!    the worker keeps writing what was already queued.
//! 3. **Closed**: the worker has exited and the file handle is released.
//!
//! Once the queue stops accepting, either because of `close` or because the
//! worker hit an I/O error, every new line is written from a short-lived
//! detached thread instead. Those writes are not ordered against the lines
//! the worker is still draining.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread::{self, Thread};
use std::time::Duration;

use futures::channel::mpsc::{self, SendError, Sender};
use futures::task::{waker_ref, ArcWake};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::rotation::RotationPolicy;
use crate::sink::FileSink;
use crate::worker::Worker;

/// Number of lines the queue holds before producers block.
pub const QUEUE_CAPACITY: usize = 1024;

/// How long `close` waits for the worker to drain the queue.
pub const JOIN_TIMEOUT: Duration = Duration::from_millis(1500);

/// The live file together with its rotation policy.
///
/// Rotation and appends happen under the same lock, so a backup never
/// interleaves with a write.
#[derive(Debug)]
pub struct LogFile {
    sink: Mutex<FileSink>,
    policy: RotationPolicy,
}

impl LogFile {
    pub fn new(sink: FileSink, policy: RotationPolicy) -> Self {
        LogFile {
            sink: Mutex::new(sink),
            policy,
        }
    }

    /// Rotates the file if the policy asks for it, then appends `text`.
    pub fn write(&self, text: &str) -> io::Result<()> {
        let mut sink = self.sink.lock();
        self.policy.check(&mut sink)?;
        sink.append(text)
    }

    /// Releases the file handle; the next write reopens it.
    pub fn close(&self) {
        self.sink.lock().close();
    }

    #[cfg(test)]
    pub(crate) fn with_sink<R>(&self, f: impl FnOnce(&mut FileSink) -> R) -> R {
        f(&mut self.sink.lock())
    }
}

/// Observable state of a [`FileProcessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Open,
    Draining,
    Closed,
}

/// Queue, worker and file of one configuration generation.
#[derive(Debug)]
pub struct FileProcessor {
    file: Arc<LogFile>,
    path: std::path::PathBuf,
    sender: Mutex<Sender<String>>,
    /// Used only to close the queue, so `close` never waits behind a
    /// producer blocked on a full queue.
    closer: Mutex<Sender<String>>,
    worker: Mutex<Option<Worker>>,
}

impl FileProcessor {
    /// Opens the log file, applies the startup part of the rotation policy and
    /// spawns the worker.
    ///
    /// `startup` is true for the first configuration of a provider and false
    /// for reloads; it gates the Override truncation and the startup backup.
    pub fn start(settings: &Settings, startup: bool) -> Result<Self> {
        FileProcessor::prepare(settings)?;

        let mut sink = FileSink::new(&settings.path);
        settings.policy.on_open(&mut sink, startup)?;
        let file = Arc::new(LogFile::new(sink, settings.policy));

        // mpsc grants each sender one slot on top of the buffer; only the
        // producer sender ever sends
        let (sender, receiver) = mpsc::channel::<String>(QUEUE_CAPACITY - 1);
        let worker_id = format!("file-logger-{}", std::process::id());
        let worker = Worker::start(&worker_id, receiver, Arc::clone(&file))?;

        debug!(path = %settings.path.display(), policy = ?settings.policy, "file processor started");

        Ok(FileProcessor {
            file,
            path: settings.path.clone(),
            closer: Mutex::new(sender.clone()),
            sender: Mutex::new(sender),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Creates the parent directory of the log file.
    ///
    /// Runs as part of [`start`](Self::start), and on its own before a
    /// reload tears down the running processor.
    pub fn prepare(settings: &Settings) -> Result<()> {
        let Some(parent) = settings.path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };
        fs::create_dir_all(parent).map_err(|err| {
            Error::config(
                "path",
                format!("cannot create `{}`: {err}", parent.display()),
            )
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether new lines still go through the queue.
    pub fn is_accepting(&self) -> bool {
        !self.closer.lock().is_closed()
    }

    pub fn state(&self) -> ProcessorState {
        if self.is_accepting() {
            return ProcessorState::Open;
        }
        match &*self.worker.lock() {
            Some(worker) if !worker.is_finished() => ProcessorState::Draining,
            _ => ProcessorState::Closed,
        }
    }

    /// Hands a finished line over for writing. Never fails.
    ///
    /// Blocks while the queue is full. When the queue no longer accepts
    /// entries the line is written from a detached thread instead.
    pub fn enqueue(&self, line: String) {
        let mut sender = self.sender.lock();
        let mut line = line;
        loop {
            match sender.try_send(line) {
                Ok(()) => return,
                Err(err) if err.is_full() => {
                    line = err.into_inner();
                    if wait_ready(&mut sender).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    line = err.into_inner();
                    break;
                }
            }
        }
        drop(sender);
        self.write_detached(line);
    }

    /// Fire-and-forget synchronous write used once the queue is closed.
    fn write_detached(&self, line: String) {
        let file = Arc::clone(&self.file);
        let spawned = thread::Builder::new()
            .name("file-logger-fallback".to_string())
            .spawn(move || {
                if let Err(err) = file.write(&line) {
                    warn!(error = %err, "dropping log line, file is not writable");
                }
            });
        if let Err(err) = spawned {
            warn!(error = %err, "dropping log line, cannot spawn fallback writer");
        }
    }

    /// Stops accepting, lets the worker drain for up to [`JOIN_TIMEOUT`] and
    /// releases the file handle. Calling it again is a no-op.
    pub fn close(&self) {
        self.closer.lock().close_channel();

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker.join_timeout(JOIN_TIMEOUT);
            self.file.close();
            debug!(path = %self.path.display(), "file processor closed");
        }
    }

    #[cfg(test)]
    pub(crate) fn log_file(&self) -> &LogFile {
        &self.file
    }
}

/// Wakes a producer parked on a full queue.
struct ThreadWaker(Thread);

impl ArcWake for ThreadWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.unpark();
    }
}

/// Parks the calling thread until `sender` has room or the queue closes.
///
/// Does not enter an executor, so it is safe to call from inside one.
fn wait_ready(sender: &mut Sender<String>) -> std::result::Result<(), SendError> {
    let waker = Arc::new(ThreadWaker(thread::current()));
    let waker = waker_ref(&waker);
    let mut cx = Context::from_waker(&waker);
    loop {
        match sender.poll_ready(&mut cx) {
            Poll::Ready(ready) => return ready,
            Poll::Pending => thread::park(),
        }
    }
}

impl Drop for FileProcessor {
    fn drop(&mut self) {
        self.close();
    }
}
