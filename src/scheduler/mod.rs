//! Asynchronous scheduler: many producers, one worker, one transition at a
//! time.
//!
//! An [`AsyncStateMachine`] wraps a [`StateMachine`] behind a priority queue.
//! Producers call [`submit`](AsyncStateMachine::submit),
//! [`inject`](AsyncStateMachine::inject) or [`fire`](AsyncStateMachine::fire)
//! from any thread; a single worker running [`run`](AsyncStateMachine::run)
//! takes tasks in priority order and executes each under the machine's
//! execution lock.
//!
//! # Ordering
//!
//! - `submit` and `fire` draw from a shared counter, so they are processed in
//!   call order.
//! - `inject` uses the reserved minimum priority: it jumps ahead of everything
//!   already queued but is unordered relative to other injected events.
//! - `stop` queues a poison entry at the next counter value, so events queued
//!   before it still complete.

#[cfg(feature = "offload")]
pub mod offload;
mod queue;
mod task;

pub use task::{FireResult, TaskHandle};

use crate::core::{Event, HsmError, State};
use crate::engine::TransitionListener;
use crate::machine::StateMachine;
use crate::structure::Structure;
use parking_lot::Mutex;
use queue::{Entry, TaskQueue};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use task::AsyncTask;
use tracing::{trace, warn};

/// Priority used by `inject`; always taken before counter-issued priorities.
pub const INJECT_PRIORITY: i64 = i64::MIN;

const NOT_RUNNING: u8 = 0;
const RUNNING: u8 = 1;
const STOPPING: u8 = 2;

/// Name given to worker threads started with [`AsyncStateMachine::spawn`].
pub const WORKER_THREAD_NAME: &str = "hsm-worker";

/// State machine that serializes events from many threads through one
/// worker.
///
/// Share it with `Arc`. Callbacks run on the worker thread while the
/// execution lock is held; they must not call [`fire`](Self::fire) (which is
/// rejected with [`HsmError::Reentrancy`]) nor the accessors
/// [`state`](Self::state), [`with_context`](Self::with_context),
/// [`add_listener`](Self::add_listener) or
/// [`force_state`](Self::force_state), which wait for the same lock.
pub struct AsyncStateMachine<S, E, C> {
    machine: Mutex<StateMachine<S, E, C>>,
    queue: TaskQueue<S, E>,
    priority: AtomicI64,
    run_state: AtomicU8,
    executing: Mutex<Option<ThreadId>>,
}

/// Marks the current thread as holding the execution lock until dropped.
struct ExecutionMarker<'a> {
    slot: &'a Mutex<Option<ThreadId>>,
}

impl<'a> ExecutionMarker<'a> {
    fn enter(slot: &'a Mutex<Option<ThreadId>>) -> Self {
        *slot.lock() = Some(thread::current().id());
        Self { slot }
    }
}

impl Drop for ExecutionMarker<'_> {
    fn drop(&mut self) {
        *self.slot.lock() = None;
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "callback panicked".to_string()
    }
}

impl<S: State, E: Event, C: Send> AsyncStateMachine<S, E, C> {
    pub fn new(machine: StateMachine<S, E, C>) -> Self {
        Self {
            machine: Mutex::new(machine),
            queue: TaskQueue::new(),
            priority: AtomicI64::new(INJECT_PRIORITY + 1),
            run_state: AtomicU8::new(NOT_RUNNING),
            executing: Mutex::new(None),
        }
    }

    /// Whether a worker is processing the queue. Stays `true` until the
    /// worker has taken the poison entry queued by [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.run_state.load(Ordering::SeqCst) != NOT_RUNNING
    }

    /// Queue `event` behind everything submitted before it.
    pub fn submit(&self, event: E) -> TaskHandle<S, E> {
        let priority = self.next_priority();
        trace!(?event, priority, "Submitting event to the queue");
        self.enqueue(event, priority)
    }

    /// Queue `event` ahead of every event already queued.
    pub fn inject(&self, event: E) -> TaskHandle<S, E> {
        trace!(?event, priority = INJECT_PRIORITY, "Injecting event into the queue");
        self.enqueue(event, INJECT_PRIORITY)
    }

    /// Submit `event` and block until the worker has processed it.
    ///
    /// Blocks forever if no worker is running. Calling this from an action or
    /// listener of this machine fails with [`HsmError::Reentrancy`] instead
    /// of deadlocking.
    pub fn fire(&self, event: E) -> FireResult<S> {
        if self.is_executing_here() {
            return Err(HsmError::Reentrancy);
        }
        let priority = self.next_priority();
        trace!(?event, priority, "Firing event");
        self.enqueue(event, priority).wait()
    }

    /// Run the worker loop on the current thread until stopped.
    ///
    /// Returns [`HsmError::WorkerFailure`] if a task failed or panicked; the
    /// worker does not restart itself.
    pub fn run(&self) -> Result<(), HsmError> {
        self.run_state
            .compare_exchange(NOT_RUNNING, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| HsmError::AlreadyRunning)?;
        self.work()
    }

    /// Start the worker loop on a dedicated thread.
    ///
    /// The machine is marked running before the thread starts, so a `stop`
    /// issued right after `spawn` returns is never lost.
    pub fn spawn(self: &Arc<Self>) -> Result<JoinHandle<Result<(), HsmError>>, HsmError>
    where
        C: 'static,
    {
        self.run_state
            .compare_exchange(NOT_RUNNING, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| HsmError::AlreadyRunning)?;

        let machine = Arc::clone(self);
        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || machine.work())
            .map_err(|err| {
                self.run_state.store(NOT_RUNNING, Ordering::SeqCst);
                HsmError::WorkerFailure {
                    reason: err.to_string(),
                }
            })
    }

    /// Ask the worker to stop once the events queued so far are processed.
    ///
    /// Does nothing if the worker is not running or already stopping.
    pub fn stop(&self) {
        if self
            .run_state
            .compare_exchange(RUNNING, STOPPING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let priority = self.next_priority();
            trace!(priority, "Submitting poison into the queue");
            self.queue.push_poison(priority);
        }
    }

    /// Cancel every queued event. A pending `stop` still takes effect.
    pub fn clear(&self) {
        let cancelled = self.queue.cancel_events();
        trace!(cancelled, "Cleared the event queue");
    }

    /// Events waiting in the queue, in the order they will be processed.
    pub fn pending_events(&self) -> Vec<E> {
        self.queue.pending_events()
    }

    pub fn state(&self) -> S {
        self.machine.lock().state().clone()
    }

    pub fn structure(&self) -> Structure<S, E, C> {
        self.machine.lock().structure().clone()
    }

    /// Access the context under the execution lock.
    pub fn with_context<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(self.machine.lock().context_mut())
    }

    pub fn add_listener<L>(&self, listener: L)
    where
        L: TransitionListener<S, E, C> + 'static,
    {
        self.machine.lock().add_listener(listener);
    }

    pub fn force_state(&self, state: S) {
        self.machine.lock().force_state(state);
    }

    /// Recover the wrapped machine.
    pub fn into_inner(self) -> StateMachine<S, E, C> {
        self.machine.into_inner()
    }

    fn next_priority(&self) -> i64 {
        self.priority.fetch_add(1, Ordering::SeqCst)
    }

    fn enqueue(&self, event: E, priority: i64) -> TaskHandle<S, E> {
        let task = Arc::new(AsyncTask::new(event, priority));
        self.queue.push_event(Arc::clone(&task));
        TaskHandle::new(task)
    }

    fn is_executing_here(&self) -> bool {
        *self.executing.lock() == Some(thread::current().id())
    }

    fn execute(&self, event: &E) -> FireResult<S> {
        trace!(?event, "Acquiring state machine lock");
        let mut machine = self.machine.lock();
        let _marker = ExecutionMarker::enter(&self.executing);
        let result = machine.fire(event);
        trace!(?event, "Releasing state machine lock");
        result
    }

    fn work(&self) -> Result<(), HsmError> {
        trace!("Worker started");
        loop {
            let task = match self.queue.take() {
                Entry::Event(task) => task,
                Entry::Poison => {
                    if self
                        .run_state
                        .compare_exchange(STOPPING, NOT_RUNNING, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                    {
                        trace!("Poison taken, worker stopped");
                        return Ok(());
                    }
                    trace!("Ignoring stale poison");
                    continue;
                }
            };

            if !task.start() {
                trace!(event = ?task.event(), "Skipping cancelled event");
                continue;
            }
            trace!(event = ?task.event(), priority = task.priority(), "Running next event");

            let reason = match panic::catch_unwind(AssertUnwindSafe(|| self.execute(task.event()))) {
                Ok(Ok(transition)) => {
                    task.complete(Ok(transition));
                    continue;
                }
                Ok(Err(err)) => {
                    task.complete(Err(err.clone()));
                    err.to_string()
                }
                Err(payload) => {
                    let reason = panic_reason(payload.as_ref());
                    task.complete(Err(HsmError::WorkerFailure {
                        reason: reason.clone(),
                    }));
                    reason
                }
            };

            warn!(%reason, "The state machine worker exited without being properly shut down");
            self.run_state.store(NOT_RUNNING, Ordering::SeqCst);
            self.queue.purge_poison();
            return Err(HsmError::WorkerFailure { reason });
        }
    }
}
