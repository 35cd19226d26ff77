//! Structural transitions and their resolved snapshots.

use super::action::TransitionAction;
use super::guard::Guard;
use super::state::{Event, State};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

type Resolver<S, E, C> = dyn Fn(&S, &E, &C) -> S + Send + Sync;

/// Where a transition leads.
///
/// Dynamic destinations are evaluated lazily, exactly once per `fire`, and
/// the result is frozen into the [`ResolvedTransition`] handed to actions and
/// listeners.
pub enum Destination<S, E, C> {
    /// Always the same state.
    Fixed(S),
    /// Computed from the current state, event and context.
    Dynamic(Arc<Resolver<S, E, C>>),
}

impl<S: State, E: Event, C> Destination<S, E, C> {
    pub fn dynamic<F>(resolver: F) -> Self
    where
        F: Fn(&S, &E, &C) -> S + Send + Sync + 'static,
    {
        Destination::Dynamic(Arc::new(resolver))
    }

    pub fn resolve(&self, state: &S, event: &E, context: &C) -> S {
        match self {
            Destination::Fixed(destination) => destination.clone(),
            Destination::Dynamic(resolver) => resolver(state, event, context),
        }
    }

    /// The destination if it is known without evaluation.
    pub fn fixed(&self) -> Option<&S> {
        match self {
            Destination::Fixed(destination) => Some(destination),
            Destination::Dynamic(_) => None,
        }
    }
}

impl<S: Clone, E, C> Clone for Destination<S, E, C> {
    fn clone(&self) -> Self {
        match self {
            Destination::Fixed(destination) => Destination::Fixed(destination.clone()),
            Destination::Dynamic(resolver) => Destination::Dynamic(Arc::clone(resolver)),
        }
    }
}

impl<S: fmt::Debug, E, C> fmt::Debug for Destination<S, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Fixed(destination) => f.debug_tuple("Fixed").field(destination).finish(),
            Destination::Dynamic(_) => f.write_str("Dynamic(<resolver>)"),
        }
    }
}

/// Immutable transition descriptor registered in the transition table.
pub struct Transition<S, E, C> {
    pub source: S,
    pub destination: Destination<S, E, C>,
    pub guard: Guard<S, E, C>,
    pub action: TransitionAction<S, E, C>,
}

impl<S: State, E: Event, C> Transition<S, E, C> {
    /// Unguarded transition between two fixed states.
    pub fn new(source: S, destination: S) -> Self {
        Transition {
            source,
            destination: Destination::Fixed(destination),
            guard: Guard::always(),
            action: TransitionAction::none(),
        }
    }

    /// Whether this transition is declared on `state` and its guard allows it.
    ///
    /// The guard sees the machine's *current* state, which may be a
    /// descendant of the declaring state.
    pub fn can_execute(&self, level: &S, current: &S, event: &E, context: &C) -> bool {
        if *level != self.source {
            return false;
        }
        self.guard.check(current, event, context)
    }

    /// Freeze the destination into a snapshot.
    pub fn snapshot(&self, current: &S, event: &E, context: &C) -> ResolvedTransition<S> {
        let destination = self.destination.resolve(current, event, context);
        ResolvedTransition::new(self.source.clone(), destination)
    }
}

impl<S: Clone, E, C> Clone for Transition<S, E, C> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            destination: self.destination.clone(),
            guard: self.guard.clone(),
            action: self.action.clone(),
        }
    }
}

impl<S: fmt::Debug, E, C> fmt::Debug for Transition<S, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .finish_non_exhaustive()
    }
}

/// Snapshot of a transition taken when it was chosen.
///
/// The destination is fixed and the guard no longer applies, so reading the
/// snapshot during the transition always gives the same answer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedTransition<S> {
    /// State that declared the transition. May be an ancestor of the state
    /// the machine was in when the event fired.
    pub source: S,
    /// Concrete destination state.
    pub destination: S,
}

impl<S: PartialEq> ResolvedTransition<S> {
    pub fn new(source: S, destination: S) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// A reentrant transition leaves and re-enters the same state without
    /// touching its ancestors.
    pub fn is_reentrant(&self) -> bool {
        self.source == self.destination
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Stopped,
        Playing,
        Paused,
    }

    #[test]
    fn can_execute_matches_level() {
        let transition: Transition<TestState, &str, ()> =
            Transition::new(TestState::Playing, TestState::Paused);

        assert!(transition.can_execute(&TestState::Playing, &TestState::Playing, &"pause", &()));
        assert!(!transition.can_execute(&TestState::Paused, &TestState::Paused, &"pause", &()));
    }

    #[test]
    fn can_execute_respects_guard() {
        let transition: Transition<TestState, &str, bool> = Transition {
            guard: Guard::on_context(|has_disc: &bool| *has_disc),
            ..Transition::new(TestState::Stopped, TestState::Playing)
        };

        assert!(transition.can_execute(&TestState::Stopped, &TestState::Stopped, &"play", &true));
        assert!(!transition.can_execute(&TestState::Stopped, &TestState::Stopped, &"play", &false));
    }

    #[test]
    fn dynamic_destination_is_frozen_in_snapshot() {
        let transition: Transition<TestState, &str, bool> = Transition {
            destination: Destination::dynamic(|_, _, paused: &bool| {
                if *paused {
                    TestState::Paused
                } else {
                    TestState::Playing
                }
            }),
            ..Transition::new(TestState::Stopped, TestState::Stopped)
        };

        let first = transition.snapshot(&TestState::Stopped, &"play", &true);
        let second = transition.snapshot(&TestState::Stopped, &"play", &false);

        assert_eq!(first.destination, TestState::Paused);
        assert_eq!(second.destination, TestState::Playing);
        assert!(transition.destination.fixed().is_none());
    }

    #[test]
    fn reentrant_snapshot() {
        assert!(ResolvedTransition::new(TestState::Paused, TestState::Paused).is_reentrant());
        assert!(!ResolvedTransition::new(TestState::Paused, TestState::Playing).is_reentrant());
    }

    #[test]
    fn snapshot_serializes() {
        let snapshot = ResolvedTransition::new(TestState::Stopped, TestState::Playing);
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ResolvedTransition<TestState> = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, back);
    }
}
