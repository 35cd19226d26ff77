//! Run long callbacks on a tokio blocking pool instead of inside the
//! execution lock.
//!
//! Every wrapper clones its arguments, including the context, and hands the
//! clone to [`Handle::spawn_blocking`]. The transition does not wait for the
//! offloaded work, and changes the callback makes to its copy of the context
//! are not seen by the machine. Share mutable results through the context
//! itself, e.g. an `Arc<Mutex<_>>` field.

use crate::core::{Action, Event, ResolvedTransition, State, TransitionAction};
use crate::engine::{TransitionListener, TransitionStage};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::trace;

/// Wrap `action` so it runs on `runtime`'s blocking pool.
pub fn offload_action<S, E, C>(runtime: Handle, action: Action<S, E, C>) -> Action<S, E, C>
where
    S: State,
    E: Event,
    C: Clone + Send + 'static,
{
    Action::new(move |state: &S, event: &E, transition: &ResolvedTransition<S>, context: &mut C| {
        let action = action.clone();
        let state = state.clone();
        let event = event.clone();
        let transition = transition.clone();
        let mut context = context.clone();
        trace!(?state, ?event, "Offloading action");
        drop(runtime.spawn_blocking(move || {
            action.perform(&state, &event, &transition, &mut context);
        }));
    })
}

/// Wrap a transition action so it runs on `runtime`'s blocking pool.
pub fn offload_transition_action<S, E, C>(
    runtime: Handle,
    action: TransitionAction<S, E, C>,
) -> TransitionAction<S, E, C>
where
    S: State,
    E: Event,
    C: Clone + Send + 'static,
{
    TransitionAction::new(
        move |ancestor: Option<&S>, event: &E, transition: &ResolvedTransition<S>, context: &mut C| {
            let action = action.clone();
            let ancestor = ancestor.cloned();
            let event = event.clone();
            let transition = transition.clone();
            let mut context = context.clone();
            trace!(?ancestor, ?event, "Offloading transition action");
            drop(runtime.spawn_blocking(move || {
                action.perform(ancestor.as_ref(), &event, &transition, &mut context);
            }));
        },
    )
}

/// Wrap `listener` so notifications are delivered on `runtime`'s blocking
/// pool.
///
/// Notifications for one transition may arrive out of stage order.
pub fn offload_listener<S, E, C, L>(runtime: Handle, listener: L) -> impl TransitionListener<S, E, C>
where
    S: State,
    E: Event,
    C: Clone + Send + 'static,
    L: TransitionListener<S, E, C> + 'static,
{
    let listener = Arc::new(listener);
    move |stage: TransitionStage, event: &E, transition: &ResolvedTransition<S>, context: &C| {
        let listener = Arc::clone(&listener);
        let event = event.clone();
        let transition = transition.clone();
        let context = context.clone();
        trace!(?stage, ?event, "Offloading listener notification");
        drop(runtime.spawn_blocking(move || {
            listener.on_transition(stage, &event, &transition, &context);
        }));
    }
}
