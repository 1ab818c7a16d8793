//! Bounded worker pool for watch evaluations

use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::database::WatchKey;
use crate::errors::WatcherError;

/// Outcome of handing a task to the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Accepted,
    /// The same watch is already queued or running
    AlreadyQueued,
    /// Admission queue is full; the caller retries later
    Rejected,
}

/// Runs at most `worker_count` tasks at once and admits at most
/// `worker_count + queue_capacity` tasks in total
#[derive(Clone)]
pub struct WorkerPool {
    workers: Arc<Semaphore>,
    admission: Arc<Semaphore>,
    in_flight: Arc<Mutex<HashSet<WatchKey>>>,
}

/// Releases the watch key when the task ends, panics included
struct InFlightGuard {
    key: WatchKey,
    in_flight: Arc<Mutex<HashSet<WatchKey>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.remove(&self.key);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl WorkerPool {
    /// Permit counts are clamped to what a semaphore can hold
    pub fn new(worker_count: usize, queue_capacity: usize) -> Self {
        let workers = worker_count.min(Semaphore::MAX_PERMITS);
        let admitted = workers
            .saturating_add(queue_capacity)
            .min(Semaphore::MAX_PERMITS);
        Self {
            workers: Arc::new(Semaphore::new(workers)),
            admission: Arc::new(Semaphore::new(admitted)),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Queue `task` for the watch `key`
    ///
    /// Errors and panics of the task are logged here and go no further.
    pub fn submit<F>(&self, key: WatchKey, task: F) -> Submission
    where
        F: Future<Output = Result<(), WatcherError>> + Send + 'static,
    {
        let slot = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            if in_flight.contains(&key) {
                return Submission::AlreadyQueued;
            }
            let Ok(slot) = self.admission.clone().try_acquire_owned() else {
                return Submission::Rejected;
            };
            in_flight.insert(key.clone());
            slot
        };

        let guard = InFlightGuard {
            key,
            in_flight: self.in_flight.clone(),
        };
        let workers = self.workers.clone();

        tokio::spawn(async move {
            let _slot = slot;
            let Ok(_worker) = workers.acquire_owned().await else {
                warn!("Worker pool closed, dropping task for {}", guard.key);
                return;
            };

            debug!("Evaluating {}", guard.key);
            match AssertUnwindSafe(task).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Evaluation of {} failed: {}", guard.key, e),
                Err(panic) => error!(
                    "Evaluation of {} panicked: {}",
                    guard.key,
                    panic_message(panic.as_ref())
                ),
            }
        });

        Submission::Accepted
    }

    /// Watches queued or running
    pub fn pending(&self) -> usize {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_pending(&self, key: &WatchKey) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }
}
