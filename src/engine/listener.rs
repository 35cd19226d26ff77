//! Transition listeners and the history recorder built on them.

use crate::core::{Event, ResolvedTransition, State, StateHistory, StateTransition};
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Point in a transition at which listeners are notified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionStage {
    /// Before any exit action runs.
    Before,
    /// After the exit cascade, before the transition action.
    Between,
    /// After the entrance cascade completed.
    After,
}

/// Observer of every transition a machine performs.
///
/// Listeners run synchronously inside the transition. Any closure with the
/// matching signature is a listener.
pub trait TransitionListener<S, E, C>: Send + Sync {
    fn on_transition(
        &self,
        stage: TransitionStage,
        event: &E,
        transition: &ResolvedTransition<S>,
        context: &C,
    );
}

impl<S, E, C, F> TransitionListener<S, E, C> for F
where
    F: Fn(TransitionStage, &E, &ResolvedTransition<S>, &C) + Send + Sync,
{
    fn on_transition(
        &self,
        stage: TransitionStage,
        event: &E,
        transition: &ResolvedTransition<S>,
        context: &C,
    ) {
        self(stage, event, transition, context)
    }
}

/// Listener that records every completed transition into a [`StateHistory`].
///
/// The listener follows the machine's state on its own, starting from the
/// state given at construction, so it must be created with the same starting
/// state as the machine it observes. Clones share the same history.
#[derive(Debug, Clone)]
pub struct HistoryListener<S> {
    inner: Arc<Mutex<Tracked<S>>>,
}

#[derive(Debug)]
struct Tracked<S> {
    current: S,
    history: StateHistory<S>,
}

impl<S: State> HistoryListener<S> {
    pub fn new(starting: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Tracked {
                current: starting,
                history: StateHistory::new(),
            })),
        }
    }

    /// Snapshot of the history recorded so far.
    pub fn history(&self) -> StateHistory<S> {
        self.inner.lock().history.clone()
    }
}

impl<S: State, E: Event, C> TransitionListener<S, E, C> for HistoryListener<S> {
    fn on_transition(
        &self,
        stage: TransitionStage,
        _event: &E,
        transition: &ResolvedTransition<S>,
        _context: &C,
    ) {
        if stage != TransitionStage::After {
            return;
        }
        let mut tracked = self.inner.lock();
        let record = StateTransition {
            from: tracked.current.clone(),
            to: transition.destination.clone(),
            declared_on: transition.source.clone(),
            timestamp: Utc::now(),
        };
        tracked.history = tracked.history.record(record);
        tracked.current = transition.destination.clone();
    }
}
