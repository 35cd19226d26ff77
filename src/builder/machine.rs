//! Builders for the state hierarchy and the machines built over it.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::core::{Action, Event, Guard, HsmError, State, Transition, TransitionAction};
use crate::machine::StateMachine;
use crate::scheduler::AsyncStateMachine;
use crate::structure::Structure;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::trace;

/// Builder for a [`Structure`] and the machines that share it.
///
/// Every machine built from the same builder reads the same structure, and
/// states configured after a machine was built are visible to it.
pub struct StateMachineBuilder<S, E, C> {
    structure: Structure<S, E, C>,
}

impl<S: State, E: Event, C> StateMachineBuilder<S, E, C> {
    pub fn new() -> Self {
        Self::from_structure(Structure::new())
    }

    /// Continue configuring an existing structure.
    pub fn from_structure(structure: Structure<S, E, C>) -> Self {
        Self { structure }
    }

    /// Start configuring `state`, registering it if needed.
    pub fn configure(&self, state: S) -> StateBuilder<S, E, C> {
        trace!(?state, "Configuring state");
        self.structure.get_or_create(state.clone());
        StateBuilder {
            structure: self.structure.clone(),
            state,
        }
    }

    pub fn structure(&self) -> Structure<S, E, C> {
        self.structure.clone()
    }

    /// See [`Structure::validate`].
    pub fn validate(&self) -> Validation<(), NonEmptyVec<HsmError>> {
        self.structure.validate()
    }

    pub fn build(&self, starting: S, context: C) -> StateMachine<S, E, C> {
        self.structure.build(starting, context)
    }

    pub fn build_async(&self, starting: S, context: C) -> AsyncStateMachine<S, E, C>
    where
        C: Send,
    {
        self.structure.build_async(starting, context)
    }
}

impl<S: State, E: Event, C> Default for StateMachineBuilder<S, E, C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent configuration of one state.
///
/// Fixed destinations named through this builder are registered as states,
/// so a machine assembled only through builders never meets an unknown fixed
/// destination.
pub struct StateBuilder<S, E, C> {
    structure: Structure<S, E, C>,
    state: S,
}

impl<S: State, E: Event, C> StateBuilder<S, E, C> {
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Place this state beneath `parent`, registering the parent if needed.
    ///
    /// Fails if `parent` is this state or one of its descendants.
    pub fn child_of(self, parent: S) -> Result<Self, HsmError> {
        self.structure.get_or_create(parent.clone());
        self.structure.set_parent(self.state.clone(), &parent)?;
        Ok(self)
    }

    pub fn on_entry(self, action: Action<S, E, C>) -> Self {
        self.structure.add_entrance_action(self.state.clone(), action);
        self
    }

    pub fn on_exit(self, action: Action<S, E, C>) -> Self {
        self.structure.add_exit_action(self.state.clone(), action);
        self
    }

    /// Register the transition built by `transition` for `event`.
    ///
    /// A builder without a source is declared on this state; one declared on
    /// another state is rejected.
    pub fn handle(self, event: E, transition: TransitionBuilder<S, E, C>) -> Result<Self, HsmError> {
        if let Some(source) = transition.source().filter(|source| **source != self.state) {
            return Err(BuildError::SourceMismatch {
                expected: format!("{:?}", self.state),
                found: format!("{source:?}"),
            }
            .into());
        }
        let transition = transition.from(self.state.clone()).build()?;
        Ok(self.register(event, transition))
    }

    /// Unguarded transition to `destination` on `event`.
    pub fn handle_to(self, event: E, destination: S) -> Self {
        let transition = Transition::new(self.state.clone(), destination);
        self.register(event, transition)
    }

    /// Transition to `destination` on `event` when `guard` passes.
    pub fn handle_when<F>(self, event: E, destination: S, guard: F) -> Self
    where
        F: Fn(&S, &E, &C) -> bool + Send + Sync + 'static,
    {
        let transition = Transition {
            guard: Guard::new(guard),
            ..Transition::new(self.state.clone(), destination)
        };
        self.register(event, transition)
    }

    /// Transition to `destination` on `event` running `action` between the
    /// exit and entrance cascades.
    pub fn handle_with(self, event: E, destination: S, action: TransitionAction<S, E, C>) -> Self {
        let transition = Transition {
            action,
            ..Transition::new(self.state.clone(), destination)
        };
        self.register(event, transition)
    }

    /// Reentrant transition: leave and re-enter this state on `event`.
    pub fn handle_self(self, event: E) -> Self {
        let transition = Transition::new(self.state.clone(), self.state.clone());
        self.register(event, transition)
    }

    fn register(self, event: E, transition: Transition<S, E, C>) -> Self {
        if let Some(destination) = transition.destination.fixed() {
            self.structure.get_or_create(destination.clone());
        }
        trace!(?event, source = ?self.state, "Registering transition");
        self.structure.add_transition(event, transition);
        self
    }
}
