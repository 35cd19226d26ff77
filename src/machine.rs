//! Synchronous hierarchical state machine.

use crate::core::{Event, HsmError, ResolvedTransition, State};
use crate::engine::{self, Listeners, TransitionListener};
use crate::structure::Structure;
use tracing::trace;

/// One running instance over a shared [`Structure`].
///
/// `fire` resolves and executes a transition in one call. The machine takes
/// `&mut self` for every mutation and does no locking of its own; wrap it in
/// an [`AsyncStateMachine`](crate::scheduler::AsyncStateMachine) to accept
/// events from many threads.
pub struct StateMachine<S, E, C> {
    structure: Structure<S, E, C>,
    state: S,
    context: C,
    listeners: Listeners<S, E, C>,
}

impl<S: State, E: Event, C> StateMachine<S, E, C> {
    pub fn new(structure: Structure<S, E, C>, starting: S, context: C) -> Self {
        Self {
            structure,
            state: starting,
            context,
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn structure(&self) -> &Structure<S, E, C> {
        &self.structure
    }

    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: TransitionListener<S, E, C> + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Move to `state` without running any action or notifying listeners.
    pub fn force_state(&mut self, state: S) {
        trace!(from = ?self.state, to = ?state, "Forcing state");
        self.state = state;
    }

    /// Process `event`.
    ///
    /// Returns the snapshot of the transition taken, or `None` when neither
    /// the current state nor any of its ancestors handles the event. In that
    /// case the state is unchanged.
    pub fn fire(&mut self, event: &E) -> Result<Option<ResolvedTransition<S>>, HsmError> {
        trace!(?event, state = ?self.state, "Event fired");

        // The structure lock is released before any callback runs.
        let plan = {
            let structure = self.structure.read();
            let Some(transition) = engine::resolve(&structure, event, &self.state, &self.context)?
            else {
                return Ok(None);
            };
            engine::plan(&structure, &transition, &self.state, event, &self.context)?
        };

        let transition = plan.execute(event, &mut self.state, &mut self.context, &self.listeners);
        trace!(to = ?self.state, "Finished transition");
        Ok(Some(transition))
    }
}
