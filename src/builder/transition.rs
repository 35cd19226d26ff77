//! Builder for constructing transitions.

use crate::builder::error::BuildError;
use crate::core::{Destination, Event, Guard, State, Transition, TransitionAction};

/// Builder for constructing transitions with a fluent API.
///
/// The source may be left out when the builder is handed to
/// [`StateBuilder::handle`](crate::builder::StateBuilder::handle), which
/// fills in the configured state.
pub struct TransitionBuilder<S, E, C> {
    from: Option<S>,
    to: Option<Destination<S, E, C>>,
    guard: Guard<S, E, C>,
    action: TransitionAction<S, E, C>,
}

impl<S: State, E: Event, C> TransitionBuilder<S, E, C> {
    pub fn new() -> Self {
        Self {
            from: None,
            to: None,
            guard: Guard::always(),
            action: TransitionAction::none(),
        }
    }

    /// Set the state that declares the transition.
    pub fn from(mut self, state: S) -> Self {
        self.from = Some(state);
        self
    }

    /// Set a fixed destination.
    pub fn to(mut self, state: S) -> Self {
        self.to = Some(Destination::Fixed(state));
        self
    }

    /// Compute the destination when the transition is taken.
    pub fn to_with<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&S, &E, &C) -> S + Send + Sync + 'static,
    {
        self.to = Some(Destination::dynamic(resolver));
        self
    }

    pub fn guard(mut self, guard: Guard<S, E, C>) -> Self {
        self.guard = guard;
        self
    }

    /// Add a guard using a closure.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&S, &E, &C) -> bool + Send + Sync + 'static,
    {
        self.guard = Guard::new(predicate);
        self
    }

    /// Set the action run between the exit and entrance cascades.
    pub fn action(mut self, action: TransitionAction<S, E, C>) -> Self {
        self.action = action;
        self
    }

    pub(crate) fn source(&self) -> Option<&S> {
        self.from.as_ref()
    }

    /// Build the transition.
    pub fn build(self) -> Result<Transition<S, E, C>, BuildError> {
        let source = self.from.ok_or(BuildError::MissingFromState)?;
        let destination = self.to.ok_or(BuildError::MissingToState)?;

        Ok(Transition {
            source,
            destination,
            guard: self.guard,
            action: self.action,
        })
    }
}

impl<S: State, E: Event, C> Default for TransitionBuilder<S, E, C> {
    fn default() -> Self {
        Self::new()
    }
}
