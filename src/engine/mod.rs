//! Transition engine: hierarchy-aware resolution and the
//! exit / action / enter protocol.
//!
//! Resolution walks from the current state up through its ancestors and
//! stops at the first level with a guard-passing transition for the event, so
//! a child's handler shadows its parent's. Execution is split in two steps:
//! [`plan`] reads the structure and collects every callback that will run,
//! then [`ExecutionPlan::execute`] runs them with the structure lock
//! released.

mod listener;

pub use listener::{HistoryListener, TransitionListener, TransitionStage};

use crate::core::{Action, Event, HsmError, ResolvedTransition, State, Transition, TransitionAction};
use crate::structure::{NodeId, StructureInner};
use std::sync::Arc;
use tracing::{trace, warn};

pub(crate) type Listeners<S, E, C> = Vec<Box<dyn TransitionListener<S, E, C>>>;

/// Find the transition `event` causes from `current`.
///
/// Returns `Ok(None)` when no level of the hierarchy handles the event.
/// More than one guard-passing transition on the first level that has any
/// is an [`HsmError::AmbiguousTransition`].
pub(crate) fn resolve<S: State, E: Event, C>(
    structure: &StructureInner<S, E, C>,
    event: &E,
    current: &S,
    context: &C,
) -> Result<Option<Arc<Transition<S, E, C>>>, HsmError> {
    let candidates = structure.table.transitions(event);
    if candidates.is_empty() {
        trace!(?event, "No transitions for event");
        return Ok(None);
    }

    let levels: Vec<&S> = match structure.registry.lookup(current) {
        Some(node) => structure
            .registry
            .chain_up(node, None)
            .into_iter()
            .map(|id| structure.registry.node(id).state())
            .collect(),
        None => vec![current],
    };

    for level in levels {
        trace!(state = ?level, "Looking for allowed transitions");
        let possible: Vec<&Arc<Transition<S, E, C>>> = candidates
            .iter()
            .filter(|t| t.can_execute(level, current, event, context))
            .collect();

        match possible.as_slice() {
            [] => continue,
            [transition] => return Ok(Some(Arc::clone(transition))),
            many => {
                warn!(count = many.len(), ?event, state = ?level, "Multiple transitions possible");
                return Err(HsmError::AmbiguousTransition {
                    event: format!("{event:?}"),
                    state: format!("{level:?}"),
                    count: many.len(),
                });
            }
        }
    }

    trace!(?event, "No transitions possible for event");
    Ok(None)
}

/// Callbacks of one hierarchy level taking part in a cascade.
struct Level<S, E, C> {
    state: S,
    actions: Vec<Action<S, E, C>>,
}

/// Everything needed to carry out one chosen transition.
pub(crate) struct ExecutionPlan<S, E, C> {
    transition: ResolvedTransition<S>,
    ancestor: Option<S>,
    exits: Vec<Level<S, E, C>>,
    action: TransitionAction<S, E, C>,
    entries: Vec<Level<S, E, C>>,
}

/// Snapshot `transition` and compute its exit and entrance cascades.
pub(crate) fn plan<S: State, E: Event, C>(
    structure: &StructureInner<S, E, C>,
    transition: &Transition<S, E, C>,
    current: &S,
    event: &E,
    context: &C,
) -> Result<ExecutionPlan<S, E, C>, HsmError> {
    let snapshot = transition.snapshot(current, event, context);
    let registry = &structure.registry;

    let Some(destination) = registry.lookup(&snapshot.destination) else {
        return Err(HsmError::UnknownDestination {
            destination: format!("{:?}", snapshot.destination),
        });
    };
    let origin = registry.lookup(current);
    let ancestor = origin.and_then(|node| registry.common_ancestor(node, destination));
    trace!(
        ?current,
        destination = ?snapshot.destination,
        ancestor = ?ancestor.map(|id| registry.node(id).state()),
        "Computed common ancestor"
    );

    let (exit_nodes, entry_nodes): (Vec<NodeId>, Vec<NodeId>) = if snapshot.is_reentrant() {
        (origin.into_iter().collect(), vec![destination])
    } else {
        let exits = origin
            .map(|node| registry.chain_up(node, ancestor))
            .unwrap_or_default();
        let mut entries = registry.chain_up(destination, ancestor);
        entries.reverse();
        (exits, entries)
    };

    let exits = exit_nodes
        .into_iter()
        .map(|id| {
            let node = registry.node(id);
            Level {
                state: node.state().clone(),
                actions: node.exit_actions().to_vec(),
            }
        })
        .collect();
    let entries = entry_nodes
        .into_iter()
        .map(|id| {
            let node = registry.node(id);
            Level {
                state: node.state().clone(),
                actions: node.entrance_actions().to_vec(),
            }
        })
        .collect();

    Ok(ExecutionPlan {
        transition: snapshot,
        ancestor: ancestor.map(|id| registry.node(id).state().clone()),
        exits,
        action: transition.action.clone(),
        entries,
    })
}

impl<S: State, E: Event, C> ExecutionPlan<S, E, C> {
    /// Run the transition: notify `Before`, exit up to the common ancestor,
    /// notify `Between`, run the transition action, enter down to the
    /// destination, notify `After`.
    pub(crate) fn execute(
        self,
        event: &E,
        state: &mut S,
        context: &mut C,
        listeners: &Listeners<S, E, C>,
    ) -> ResolvedTransition<S> {
        let ExecutionPlan {
            transition,
            ancestor,
            exits,
            action,
            entries,
        } = self;

        trace!(from = ?state, to = ?transition.destination, "Notifying listeners before transition");
        notify(listeners, TransitionStage::Before, event, &transition, context);

        for level in &exits {
            trace!(state = ?level.state, "Performing exit actions");
            for exit in &level.actions {
                exit.perform(&level.state, event, &transition, context);
            }
        }

        trace!(ancestor = ?ancestor, "Notifying listeners between transition");
        notify(listeners, TransitionStage::Between, event, &transition, context);

        trace!(ancestor = ?ancestor, "Performing transition action");
        action.perform(ancestor.as_ref(), event, &transition, context);

        *state = transition.destination.clone();

        for level in &entries {
            trace!(state = ?level.state, "Performing entrance actions");
            for entrance in &level.actions {
                entrance.perform(&level.state, event, &transition, context);
            }
        }

        trace!(to = ?transition.destination, "Notifying listeners after transition");
        notify(listeners, TransitionStage::After, event, &transition, context);

        transition
    }
}

fn notify<S, E, C>(
    listeners: &Listeners<S, E, C>,
    stage: TransitionStage,
    event: &E,
    transition: &ResolvedTransition<S>,
    context: &C,
) {
    for listener in listeners {
        listener.on_transition(stage, event, transition, context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Guard;
    use crate::structure::Structure;

    type TestStructure = Structure<&'static str, &'static str, bool>;

    fn dvd() -> TestStructure {
        let structure = Structure::new();
        structure.add_transition(
            "play",
            Transition {
                guard: Guard::on_context(|has_disc: &bool| *has_disc),
                ..Transition::new("Stopped", "Playing")
            },
        );
        structure.add_transition("stop", Transition::new("Active", "Stopped"));
        structure.set_parent("Playing", &"Active").unwrap();
        structure.set_parent("Paused", &"Active").unwrap();
        structure.add_transition("pause", Transition::new("Playing", "Paused"));
        structure.add_transition("play", Transition::new("Paused", "Playing"));
        structure
    }

    fn resolved(structure: &TestStructure, event: &'static str, current: &'static str, ctx: bool) -> Option<(&'static str, &'static str)> {
        let inner = structure.read();
        resolve(&inner, &event, &current, &ctx)
            .unwrap()
            .map(|t| (t.source, *t.destination.fixed().unwrap()))
    }

    #[test]
    fn guard_failure_means_unhandled() {
        let structure = dvd();
        assert_eq!(resolved(&structure, "play", "Stopped", false), None);
        assert_eq!(resolved(&structure, "play", "Stopped", true), Some(("Stopped", "Playing")));
    }

    #[test]
    fn ancestor_handles_event_for_child() {
        let structure = dvd();
        assert_eq!(resolved(&structure, "stop", "Playing", false), Some(("Active", "Stopped")));
        assert_eq!(resolved(&structure, "stop", "Stopped", false), None);
    }

    #[test]
    fn unknown_event_and_unknown_state_are_unhandled() {
        let structure = dvd();
        assert_eq!(resolved(&structure, "eject", "Playing", false), None);
        assert_eq!(resolved(&structure, "play", "Nowhere", true), None);
    }

    #[test]
    fn child_guard_failure_falls_back_to_parent() {
        let structure = dvd();
        structure.add_transition(
            "stop",
            Transition {
                guard: Guard::on_context(|flag: &bool| *flag),
                ..Transition::new("Paused", "Paused")
            },
        );

        assert_eq!(resolved(&structure, "stop", "Paused", true), Some(("Paused", "Paused")));
        assert_eq!(resolved(&structure, "stop", "Paused", false), Some(("Active", "Stopped")));
    }

    #[test]
    fn two_passing_guards_on_one_level_are_ambiguous() {
        let structure = dvd();
        structure.add_transition("pause", Transition::new("Playing", "Stopped"));

        let inner = structure.read();
        let result = resolve(&inner, &"pause", &"Playing", &false);
        assert!(matches!(
            result,
            Err(HsmError::AmbiguousTransition { count: 2, .. })
        ));
    }

    #[test]
    fn plan_rejects_unknown_destination() {
        let structure = dvd();
        structure.add_transition("eject", Transition::new("Stopped", "Ejected"));

        let inner = structure.read();
        let transition = resolve(&inner, &"eject", &"Stopped", &false).unwrap().unwrap();
        let result = plan(&inner, &transition, &"Stopped", &"eject", &false);
        assert!(matches!(result, Err(HsmError::UnknownDestination { .. })));
    }

    #[test]
    fn plan_cascades_stop_at_common_ancestor() {
        let structure = dvd();
        let inner = structure.read();

        let transition = resolve(&inner, &"pause", &"Playing", &false).unwrap().unwrap();
        let sibling = plan(&inner, &transition, &"Playing", &"pause", &false).unwrap();
        assert_eq!(sibling.ancestor, Some("Active"));
        assert_eq!(sibling.exits.iter().map(|l| l.state).collect::<Vec<_>>(), vec!["Playing"]);
        assert_eq!(sibling.entries.iter().map(|l| l.state).collect::<Vec<_>>(), vec!["Paused"]);

        let transition = resolve(&inner, &"stop", &"Paused", &false).unwrap().unwrap();
        let disjoint = plan(&inner, &transition, &"Paused", &"stop", &false).unwrap();
        assert_eq!(disjoint.ancestor, None);
        assert_eq!(
            disjoint.exits.iter().map(|l| l.state).collect::<Vec<_>>(),
            vec!["Paused", "Active"]
        );
        assert_eq!(disjoint.entries.iter().map(|l| l.state).collect::<Vec<_>>(), vec!["Stopped"]);
    }
}
