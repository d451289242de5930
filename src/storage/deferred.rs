//! Best-effort background progress writer.
//!
//! When the presentation shell is torn down while a persistence update is
//! still owed, the write should complete in the background without blocking
//! exit. This module makes that explicit: a dedicated worker thread drains
//! a bounded queue of full-record updates, and every enqueue hands back a
//! [`WriteTicket`] the caller may await, poll, or simply drop.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::progress::ProgressRecord;
use crate::storage::traits::{ProgressStore, StorageError};

struct WriteJob {
    record: ProgressRecord,
    reply: Sender<Result<(), StorageError>>,
}

/// Completion handle for one enqueued write.
///
/// Dropping the ticket is fire-and-forget: the write still runs, its
/// result is discarded.
#[derive(Debug)]
pub struct WriteTicket {
    rx: Receiver<Result<(), StorageError>>,
}

impl WriteTicket {
    /// Blocks until the write has been attempted.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write failed, or
    /// [`StorageError::BackendError`] if the writer shut down first.
    pub fn wait(&self) -> Result<(), StorageError> {
        self.rx
            .recv()
            .unwrap_or_else(|_| Err(StorageError::BackendError("writer shut down".to_string())))
    }

    /// Waits up to `timeout` for the write to be attempted.
    ///
    /// Returns `None` on timeout; the write may still land later.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<(), StorageError>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(StorageError::BackendError(
                "writer shut down".to_string(),
            ))),
        }
    }
}

/// Background writer for progress records.
///
/// Enqueueing never blocks; when the queue is full the write is rejected
/// immediately through the ticket rather than stalling the UI. Dropping
/// the queue drains outstanding jobs and joins the worker.
#[derive(Debug)]
pub struct ProgressWriteQueue {
    tx: Option<Sender<WriteJob>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressWriteQueue {
    /// Spawns the worker thread over `store` with the given queue capacity.
    #[must_use]
    pub fn new(store: Arc<dyn ProgressStore>, capacity: usize) -> Self {
        let (tx, rx) = bounded::<WriteJob>(capacity.max(1));
        let join = thread::Builder::new()
            .name("prepdrill-progress-writer".to_string())
            .spawn(move || worker_loop(&store, &rx))
            .expect("failed to spawn progress writer thread");

        Self {
            tx: Some(tx),
            join: Mutex::new(Some(join)),
        }
    }

    /// Enqueues a full-record update.
    ///
    /// The returned ticket resolves once the store call has been attempted.
    #[must_use]
    pub fn enqueue(&self, record: ProgressRecord) -> WriteTicket {
        let (reply_tx, reply_rx) = bounded(1);
        let ticket = WriteTicket { rx: reply_rx };

        let Some(tx) = &self.tx else {
            let _ = reply_tx.send(Err(StorageError::BackendError(
                "writer shut down".to_string(),
            )));
            return ticket;
        };

        let job = WriteJob {
            record,
            reply: reply_tx,
        };
        match tx.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                let _ = job.reply.send(Err(StorageError::BackendError(
                    "progress write queue full".to_string(),
                )));
            }
            Err(TrySendError::Disconnected(job)) => {
                let _ = job.reply.send(Err(StorageError::BackendError(
                    "writer shut down".to_string(),
                )));
            }
        }
        ticket
    }
}

impl Drop for ProgressWriteQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain remaining jobs and exit.
        self.tx.take();
        if let Ok(mut join) = self.join.lock() {
            if let Some(handle) = join.take() {
                let _ = handle.join();
            }
        }
    }
}

fn worker_loop(store: &Arc<dyn ProgressStore>, rx: &Receiver<WriteJob>) {
    for job in rx {
        let result = store.update(&job.record);
        // The ticket may already be dropped; that is the fire-and-forget case.
        let _ = job.reply.send(result);
    }
}
