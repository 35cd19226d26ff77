//! State transition history tracking.
//!
//! Immutable record of the transitions a machine has completed, fed by
//! [`HistoryListener`](crate::engine::HistoryListener).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single completed transition.
///
/// # Example
///
/// ```rust
/// use arbor::core::StateTransition;
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: "Playing",
///     to: "Stopped",
///     declared_on: "Active",
///     timestamp: Utc::now(),
/// };
/// assert_ne!(transition.from, transition.declared_on);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition<S> {
    /// The state the machine was in when the event fired
    pub from: S,
    /// The state the machine ended in
    pub to: S,
    /// The state whose handler was chosen (`from` or one of its ancestors)
    pub declared_on: S,
    /// When the transition completed
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of state transitions.
///
/// History is immutable - the `record` method returns a new history
/// with the transition added.
///
/// # Example
///
/// ```rust
/// use arbor::core::{StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let history = StateHistory::new()
///     .record(StateTransition {
///         from: "Locked",
///         to: "Unlocked",
///         declared_on: "Locked",
///         timestamp: Utc::now(),
///     })
///     .record(StateTransition {
///         from: "Unlocked",
///         to: "Locked",
///         declared_on: "Unlocked",
///         timestamp: Utc::now(),
///     });
///
/// assert_eq!(history.get_path(), vec![&"Locked", &"Unlocked", &"Locked"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory<S> {
    transitions: Vec<StateTransition<S>>,
}

impl<S: Clone> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone> StateHistory<S> {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Get the path of states traversed.
    ///
    /// Returns the `from` state of the first transition followed by the `to`
    /// state of each transition.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Time between the first and last recorded transition.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    pub fn transitions(&self) -> &[StateTransition<S>] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
