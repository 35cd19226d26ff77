//! Blocking priority queue feeding the worker loop.
//!
//! Lower priority values are taken first. Real events and the poison entry
//! that stops the worker are separate variants, so no event value is ever
//! reserved as a sentinel.

use super::task::AsyncTask;
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

pub(crate) enum Entry<S, E> {
    Event(Arc<AsyncTask<S, E>>),
    Poison,
}

struct Queued<S, E> {
    priority: i64,
    entry: Entry<S, E>,
}

impl<S, E> PartialEq for Queued<S, E> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl<S, E> Eq for Queued<S, E> {}

impl<S, E> PartialOrd for Queued<S, E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S, E> Ord for Queued<S, E> {
    // BinaryHeap pops the greatest element; reverse so the smallest
    // priority value comes out first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.priority.cmp(&self.priority)
    }
}

pub(crate) struct TaskQueue<S, E> {
    heap: Mutex<BinaryHeap<Queued<S, E>>>,
    available: Condvar,
}

impl<S: Clone, E: Clone> TaskQueue<S, E> {
    pub(crate) fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            available: Condvar::new(),
        }
    }

    pub(crate) fn push_event(&self, task: Arc<AsyncTask<S, E>>) {
        let priority = task.priority();
        self.push(priority, Entry::Event(task));
    }

    pub(crate) fn push_poison(&self, priority: i64) {
        self.push(priority, Entry::Poison);
    }

    fn push(&self, priority: i64, entry: Entry<S, E>) {
        self.heap.lock().push(Queued { priority, entry });
        self.available.notify_one();
    }

    /// Block until an entry is available and remove it.
    pub(crate) fn take(&self) -> Entry<S, E> {
        let mut heap = self.heap.lock();
        loop {
            if let Some(queued) = heap.pop() {
                return queued.entry;
            }
            self.available.wait(&mut heap);
        }
    }

    /// Cancel every queued event, keeping poison entries in place.
    ///
    /// Returns the number of events cancelled.
    pub(crate) fn cancel_events(&self) -> usize {
        let mut heap = self.heap.lock();
        let drained: Vec<Queued<S, E>> = heap.drain().collect();
        let mut cancelled = 0;
        for queued in drained {
            match &queued.entry {
                Entry::Poison => heap.push(queued),
                Entry::Event(task) => {
                    if task.cancel() {
                        cancelled += 1;
                    }
                }
            }
        }
        cancelled
    }

    /// Drop every poison entry, keeping events.
    pub(crate) fn purge_poison(&self) {
        self.heap
            .lock()
            .retain(|queued| matches!(queued.entry, Entry::Event(_)));
    }

    /// Queued, non-cancelled events in the order they will be taken.
    pub(crate) fn pending_events(&self) -> Vec<E> {
        let heap = self.heap.lock();
        let mut events: Vec<(i64, E)> = heap
            .iter()
            .filter_map(|queued| match &queued.entry {
                Entry::Event(task) if !task.is_cancelled() => {
                    Some((task.priority(), task.event().clone()))
                }
                _ => None,
            })
            .collect();
        events.sort_by_key(|(priority, _)| *priority);
        events.into_iter().map(|(_, event)| event).collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.heap.lock().len()
    }
}
