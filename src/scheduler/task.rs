//! Queued event tasks and the handles returned to producers.

use crate::core::{HsmError, ResolvedTransition};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of processing one event.
pub type FireResult<S> = Result<Option<ResolvedTransition<S>>, HsmError>;

enum Status<S> {
    Pending,
    Running,
    Done(FireResult<S>),
    Cancelled,
}

/// One submitted event waiting for the worker.
pub(crate) struct AsyncTask<S, E> {
    event: E,
    priority: i64,
    status: Mutex<Status<S>>,
    finished: Condvar,
}

impl<S: Clone, E> AsyncTask<S, E> {
    pub(crate) fn new(event: E, priority: i64) -> Self {
        Self {
            event,
            priority,
            status: Mutex::new(Status::Pending),
            finished: Condvar::new(),
        }
    }

    pub(crate) fn event(&self) -> &E {
        &self.event
    }

    pub(crate) fn priority(&self) -> i64 {
        self.priority
    }

    /// Claim the task for execution. Fails if it was cancelled.
    pub(crate) fn start(&self) -> bool {
        let mut status = self.status.lock();
        match *status {
            Status::Pending => {
                *status = Status::Running;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn complete(&self, result: FireResult<S>) {
        *self.status.lock() = Status::Done(result);
        self.finished.notify_all();
    }

    pub(crate) fn cancel(&self) -> bool {
        let mut status = self.status.lock();
        if !matches!(*status, Status::Pending) {
            return false;
        }
        *status = Status::Cancelled;
        self.finished.notify_all();
        true
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        matches!(*self.status.lock(), Status::Cancelled)
    }

    fn is_done(&self) -> bool {
        matches!(*self.status.lock(), Status::Done(_) | Status::Cancelled)
    }

    fn outcome(status: &Status<S>) -> Option<FireResult<S>> {
        match status {
            Status::Pending | Status::Running => None,
            Status::Done(result) => Some(result.clone()),
            Status::Cancelled => Some(Err(HsmError::Cancelled)),
        }
    }

    fn wait(&self) -> FireResult<S> {
        let mut status = self.status.lock();
        loop {
            if let Some(result) = Self::outcome(&status) {
                return result;
            }
            self.finished.wait(&mut status);
        }
    }

    fn wait_timeout(&self, timeout: Duration) -> Option<FireResult<S>> {
        let deadline = Instant::now() + timeout;
        let mut status = self.status.lock();
        loop {
            if let Some(result) = Self::outcome(&status) {
                return Some(result);
            }
            if self.finished.wait_until(&mut status, deadline).timed_out() {
                return Self::outcome(&status);
            }
        }
    }
}

/// Handle to an event submitted to an
/// [`AsyncStateMachine`](super::AsyncStateMachine).
///
/// The handle can be cancelled until the worker starts the task, and blocks
/// in [`wait`](Self::wait) until the task has been processed.
pub struct TaskHandle<S, E> {
    task: Arc<AsyncTask<S, E>>,
}

impl<S, E> Clone for TaskHandle<S, E> {
    fn clone(&self) -> Self {
        Self {
            task: Arc::clone(&self.task),
        }
    }
}

impl<S: Clone, E> TaskHandle<S, E> {
    pub(crate) fn new(task: Arc<AsyncTask<S, E>>) -> Self {
        Self { task }
    }

    pub fn event(&self) -> &E {
        self.task.event()
    }

    pub fn priority(&self) -> i64 {
        self.task.priority()
    }

    /// Cancel the task if the worker has not started it.
    ///
    /// Returns `false` when the task already ran, is running, or was
    /// cancelled before.
    pub fn cancel(&self) -> bool {
        self.task.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_cancelled()
    }

    /// Whether the task completed or was cancelled.
    pub fn is_done(&self) -> bool {
        self.task.is_done()
    }

    /// Block until the task has been processed.
    ///
    /// A cancelled task yields [`HsmError::Cancelled`].
    pub fn wait(&self) -> FireResult<S> {
        self.task.wait()
    }

    /// Like [`wait`](Self::wait), giving up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<FireResult<S>> {
        self.task.wait_timeout(timeout)
    }
}

impl<S, E: fmt::Debug> fmt::Debug for TaskHandle<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("event", &self.task.event)
            .field("priority", &self.task.priority)
            .finish_non_exhaustive()
    }
}
