//! Side-effecting callbacks run on state entry, state exit and mid-transition.

use super::state::{Event, State};
use super::transition::ResolvedTransition;
use std::fmt;
use std::sync::Arc;

type StateCallback<S, E, C> = dyn Fn(&S, &E, &ResolvedTransition<S>, &mut C) + Send + Sync;
type TransitionCallback<S, E, C> =
    dyn Fn(Option<&S>, &E, &ResolvedTransition<S>, &mut C) + Send + Sync;

/// Entrance or exit action attached to a state.
///
/// The action receives the state it is attached to, the event being
/// processed, the snapshot of the transition in progress and the machine's
/// context.
///
/// Actions run synchronously while the machine executes the transition. They
/// must not call `fire` on the same [`AsyncStateMachine`](crate::scheduler::AsyncStateMachine).
pub struct Action<S, E, C> {
    callback: Option<Arc<StateCallback<S, E, C>>>,
    priority: i32,
}

impl<S: State, E: Event, C> Action<S, E, C> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&S, &E, &ResolvedTransition<S>, &mut C) + Send + Sync + 'static,
    {
        Action {
            callback: Some(Arc::new(callback)),
            priority: 0,
        }
    }

    /// Attach a sort key. Structures built with
    /// [`Structure::with_action_order`](crate::structure::Structure::with_action_order)
    /// can order a state's actions by it; otherwise it is ignored.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Action that only touches the context.
    pub fn on_context<F>(callback: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        Self::new(move |_, _, _, context| callback(context))
    }

    /// Action that does nothing.
    pub fn none() -> Self {
        Action {
            callback: None,
            priority: 0,
        }
    }

    pub fn perform(&self, state: &S, event: &E, transition: &ResolvedTransition<S>, context: &mut C) {
        if let Some(callback) = &self.callback {
            callback(state, event, transition, context);
        }
    }

    /// Whether both handles refer to the same callback allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.callback, &other.callback) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<S, E, C> Clone for Action<S, E, C> {
    fn clone(&self) -> Self {
        Action {
            callback: self.callback.clone(),
            priority: self.priority,
        }
    }
}

impl<S: State, E: Event, C> Default for Action<S, E, C> {
    fn default() -> Self {
        Self::none()
    }
}

impl<S, E, C> fmt::Debug for Action<S, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.callback {
            Some(_) => write!(f, "Action(<callback>, priority {})", self.priority),
            None => f.write_str("Action(none)"),
        }
    }
}

/// Action run between the exit and entrance cascades of a transition.
///
/// At that point the machine sits in the common ancestor of the source and
/// destination, which is passed as the state argument. It is `None` when the
/// two states live in disjoint trees.
pub struct TransitionAction<S, E, C> {
    callback: Option<Arc<TransitionCallback<S, E, C>>>,
}

impl<S: State, E: Event, C> TransitionAction<S, E, C> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Option<&S>, &E, &ResolvedTransition<S>, &mut C) + Send + Sync + 'static,
    {
        TransitionAction {
            callback: Some(Arc::new(callback)),
        }
    }

    pub fn on_context<F>(callback: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        Self::new(move |_, _, _, context| callback(context))
    }

    pub fn none() -> Self {
        TransitionAction { callback: None }
    }

    pub fn perform(
        &self,
        ancestor: Option<&S>,
        event: &E,
        transition: &ResolvedTransition<S>,
        context: &mut C,
    ) {
        if let Some(callback) = &self.callback {
            callback(ancestor, event, transition, context);
        }
    }
}

impl<S, E, C> Clone for TransitionAction<S, E, C> {
    fn clone(&self) -> Self {
        TransitionAction {
            callback: self.callback.clone(),
        }
    }
}

impl<S: State, E: Event, C> Default for TransitionAction<S, E, C> {
    fn default() -> Self {
        Self::none()
    }
}

impl<S, E, C> fmt::Debug for TransitionAction<S, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.callback {
            Some(_) => f.write_str("TransitionAction(<callback>)"),
            None => f.write_str("TransitionAction(none)"),
        }
    }
}
