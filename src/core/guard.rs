//! Guard predicates for controlling state transitions.
//!
//! A guard decides whether a structurally matching transition may fire. It is
//! evaluated inside the machine's critical section, possibly once per
//! hierarchy level, so it should be fast and free of side effects.

use super::state::{Event, State};
use std::fmt;
use std::sync::Arc;

type Predicate<S, E, C> = dyn Fn(&S, &E, &C) -> bool + Send + Sync;

/// Predicate over `(current state, event, context)`.
///
/// # Example
///
/// ```rust
/// use arbor::core::Guard;
///
/// let has_disc = Guard::new(|_state: &&str, _event: &&str, disc: &bool| *disc);
///
/// assert!(has_disc.check(&"Stopped", &"play", &true));
/// assert!(!has_disc.check(&"Stopped", &"play", &false));
/// ```
pub struct Guard<S, E, C> {
    predicate: Option<Arc<Predicate<S, E, C>>>,
}

impl<S: State, E: Event, C> Guard<S, E, C> {
    /// Create a guard from a predicate function.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&S, &E, &C) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Some(Arc::new(predicate)),
        }
    }

    /// Create a guard that only looks at the context.
    pub fn on_context<F>(predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self::new(move |_, _, context| predicate(context))
    }

    /// Guard that allows every transition.
    pub fn always() -> Self {
        Guard { predicate: None }
    }

    /// Whether this guard is the always-true guard.
    pub fn is_always(&self) -> bool {
        self.predicate.is_none()
    }

    /// Evaluate the guard.
    pub fn check(&self, state: &S, event: &E, context: &C) -> bool {
        self.predicate
            .as_ref()
            .map_or(true, |predicate| predicate(state, event, context))
    }
}

impl<S: State, E: Event, C> Default for Guard<S, E, C> {
    fn default() -> Self {
        Self::always()
    }
}

impl<S, E, C> Clone for Guard<S, E, C> {
    fn clone(&self) -> Self {
        Guard {
            predicate: self.predicate.clone(),
        }
    }
}

impl<S, E, C> fmt::Debug for Guard<S, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.predicate {
            Some(_) => f.write_str("Guard(<predicate>)"),
            None => f.write_str("Guard(always)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        Stopped,
        Playing,
    }

    #[test]
    fn always_guard_allows_everything() {
        let guard: Guard<TestState, &str, ()> = Guard::always();

        assert!(guard.is_always());
        assert!(guard.check(&TestState::Stopped, &"play", &()));
        assert!(guard.check(&TestState::Playing, &"stop", &()));
    }

    #[test]
    fn guard_sees_state_event_and_context() {
        let guard = Guard::new(|s: &TestState, e: &&str, limit: &usize| {
            matches!(s, TestState::Stopped) && e.len() <= *limit
        });

        assert!(guard.check(&TestState::Stopped, &"play", &4));
        assert!(!guard.check(&TestState::Playing, &"play", &4));
        assert!(!guard.check(&TestState::Stopped, &"play", &3));
    }

    #[test]
    fn context_guard_reads_shared_flag() {
        let guard: Guard<TestState, &str, AtomicBool> = Guard::on_context(|c: &AtomicBool| c.load(Ordering::SeqCst));
        let flag = AtomicBool::new(false);

        assert!(!guard.check(&TestState::Stopped, &"play", &flag));
        flag.store(true, Ordering::SeqCst);
        assert!(guard.check(&TestState::Stopped, &"play", &flag));
    }

    #[test]
    fn cloned_guard_shares_predicate() {
        let guard = Guard::new(|_: &TestState, _: &&str, c: &i32| *c > 0);
        let cloned = guard.clone();

        assert_eq!(guard.check(&TestState::Stopped, &"x", &1), cloned.check(&TestState::Stopped, &"x", &1));
        assert!(!cloned.is_always());
    }
}
