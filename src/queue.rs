//! Target execution queues for routed dispatch
//!
//! A subscription may name an `EventQueue`; matching handler invocations
//! are then submitted to that queue instead of running inline on the
//! posting thread. The bus introduces no scheduler of its own — a queue
//! is whatever execution context the host program provides.

use crate::error::{BusError, Result};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread::JoinHandle;

/// A unit of routed work
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Execution context a subscription's handler can be routed to
///
/// Submission is fire-and-forget: `execute` must not block on the job
/// completing, and an already-submitted job cannot be recalled. Ordering
/// across jobs is whatever the queue itself guarantees.
pub trait EventQueue: Send + Sync {
    /// Queue name, used for logging
    fn name(&self) -> &str;

    /// Submit a job for asynchronous execution
    fn execute(&self, job: Job);
}

/// FIFO queue backed by a dedicated worker thread
///
/// Jobs run one at a time in submission order. After [`shutdown`], or
/// once the queue is dropped, further jobs are dropped with a warning
/// rather than panicking.
///
/// [`shutdown`]: SerialQueue::shutdown
pub struct SerialQueue {
    name: String,
    sender: Mutex<Option<Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SerialQueue {
    /// Spawn the worker thread and return the queue
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (tx, rx) = mpsc::channel::<Job>();

        let worker = std::thread::Builder::new()
            .name(format!("typebus-queue-{name}"))
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    job();
                }
            })
            .map_err(|_| BusError::QueueSpawn(name.clone()))?;

        Ok(Self {
            name,
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Stop accepting jobs, drain the backlog, and join the worker
    ///
    /// Jobs submitted before the shutdown still run. Idempotent.
    pub fn shutdown(&self) -> Result<()> {
        drop(lock_ignore_poison(&self.sender).take());

        let worker = lock_ignore_poison(&self.worker).take();
        if let Some(handle) = worker {
            handle
                .join()
                .map_err(|_| BusError::QueueJoin(self.name.clone()))?;
        }
        Ok(())
    }
}

impl EventQueue for SerialQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, job: Job) {
        let guard = lock_ignore_poison(&self.sender);
        match guard.as_ref() {
            Some(tx) if tx.send(job).is_ok() => {}
            _ => tracing::warn!(queue = %self.name, "Job dropped: queue is closed"),
        }
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        // Disconnecting the channel lets the worker drain and exit. No
        // join here, so a drop from inside a job cannot deadlock.
        drop(lock_ignore_poison(&self.sender).take());
    }
}

/// Adapter routing jobs onto a tokio runtime
///
/// Jobs run via `spawn_blocking`; ordering follows the runtime's
/// scheduling with no FIFO guarantee added.
pub struct TokioQueue {
    name: String,
    handle: tokio::runtime::Handle,
}

impl TokioQueue {
    /// Wrap a runtime handle as an event queue
    pub fn new(name: impl Into<String>, handle: tokio::runtime::Handle) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }

    /// Queue bound to the currently running runtime
    ///
    /// Panics when called outside a tokio runtime context, matching
    /// `tokio::runtime::Handle::current`.
    pub fn current(name: impl Into<String>) -> Self {
        Self::new(name, tokio::runtime::Handle::current())
    }
}

impl EventQueue for TokioQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, job: Job) {
        self.handle.spawn_blocking(job);
    }
}

fn lock_ignore_poison<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
