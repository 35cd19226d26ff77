//! Transition table: the registered transitions of each event.

use crate::core::{Event, State, Transition};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct TransitionTable<S, E, C> {
    transitions: HashMap<E, Vec<Arc<Transition<S, E, C>>>>,
}

impl<S: State, E: Event, C> Default for TransitionTable<S, E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State, E: Event, C> TransitionTable<S, E, C> {
    pub fn new() -> Self {
        Self {
            transitions: HashMap::new(),
        }
    }

    pub fn add_transition(&mut self, event: E, transition: Transition<S, E, C>) {
        self.transitions
            .entry(event)
            .or_default()
            .push(Arc::new(transition));
    }

    /// Transitions registered for `event`, in registration order.
    pub fn transitions(&self, event: &E) -> &[Arc<Transition<S, E, C>>] {
        self.transitions
            .get(event)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every registered `(event, transition)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (&E, &Transition<S, E, C>)> {
        self.transitions
            .iter()
            .flat_map(|(event, list)| list.iter().map(move |t| (event, t.as_ref())))
    }

    pub fn len(&self) -> usize {
        self.transitions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
