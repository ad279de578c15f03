//! # Worker Module
//!
//! The single background thread of a processor. It drains the line queue in
//! order and hands every entry to the shared [`LogFile`], which applies the
//! rotation policy and appends the text.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use futures::channel::{mpsc::Receiver, oneshot};
use futures::executor::{block_on, LocalPool};
use futures::future::{self, Either};
use futures::stream::StreamExt;
use tracing::{debug, warn};

use crate::processor::LogFile;

/// The writer thread of a processor.
#[derive(Debug)]
pub struct Worker {
    /// Identifier used as the thread name and in diagnostics
    pub worker_id: String,
    /// Handle to the worker thread (None once joined)
    handle: Option<JoinHandle<()>>,
    /// Resolves when the worker loop has returned
    done: Option<oneshot::Receiver<()>>,
}

impl Worker {
    /// Spawns the worker thread.
    ///
    /// # Arguments
    ///
    /// * `worker_id` - Name of the thread
    /// * `receiver` - Consuming end of the line queue
    /// * `file` - Destination of every line
    pub fn start(worker_id: &str, receiver: Receiver<String>, file: Arc<LogFile>) -> io::Result<Worker> {
        let (done_tx, done_rx) = oneshot::channel::<()>();
        let id = worker_id.to_string();

        let handle = thread::Builder::new()
            .name(format!("Worker {worker_id}"))
            .spawn(move || {
                let mut pool = LocalPool::new();
                pool.run_until(async move {
                    let mut receiver = receiver;
                    debug!(worker = %id, "file logger worker started");
                    match Worker::drain(&mut receiver, &file).await {
                        Ok(()) => debug!(worker = %id, "file logger worker finished"),
                        Err(err) => warn!(
                            worker = %id,
                            error = %err,
                            "file logger worker stopped, falling back to synchronous writes"
                        ),
                    }
                });
                let _ = done_tx.send(());
            })?;

        Ok(Worker {
            worker_id: worker_id.to_string(),
            handle: Some(handle),
            done: Some(done_rx),
        })
    }

    /// Writes queued lines until the queue is closed and empty.
    ///
    /// On a write error the queue is closed so producers switch to the
    /// synchronous path; entries that were already queued get one
    /// best-effort write each and the error is returned.
    pub async fn drain(receiver: &mut Receiver<String>, file: &LogFile) -> io::Result<()> {
        while let Some(line) = receiver.next().await {
            if let Err(err) = file.write(&line) {
                receiver.close();
                while let Ok(Some(line)) = receiver.try_next() {
                    let _ = file.write(&line);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Whether the worker loop has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits up to `timeout` for the worker to finish.
    ///
    /// Returns `false` if the wait timed out; the thread is then left to
    /// finish on its own.
    pub fn join_timeout(mut self, timeout: Duration) -> bool {
        let finished = match self.done.take() {
            Some(done) => block_on(async {
                match future::select(Box::pin(done), Box::pin(futures_timer::Delay::new(timeout)))
                    .await
                {
                    Either::Left(_) => true,
                    Either::Right(_) => false,
                }
            }),
            None => true,
        };

        if !finished {
            warn!(worker = %self.worker_id, ?timeout, "file logger worker did not stop in time");
            return false;
        }

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.join() {
                warn!(worker = %self.worker_id, "file logger worker panicked: {e:?}");
            }
        }
        true
    }
}
