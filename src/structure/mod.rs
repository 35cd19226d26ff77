//! Shared state machine structure: the hierarchy registry and the
//! transition table.
//!
//! A [`Structure`] is built once and then shared, read-mostly, by any number
//! of machines, including concurrently running
//! [`AsyncStateMachine`](crate::scheduler::AsyncStateMachine)s. Both halves
//! sit behind one coarse `RwLock`; firing only takes the read side, and the
//! lock is released before any entry, exit or transition action runs.

mod registry;
mod table;

pub use registry::{ActionOrder, InternalState, NodeId, Registry};
pub use table::TransitionTable;

use crate::core::{Action, Event, HsmError, State, Transition};
use crate::machine::StateMachine;
use crate::scheduler::AsyncStateMachine;
use parking_lot::{RwLock, RwLockReadGuard};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub(crate) struct StructureInner<S, E, C> {
    pub(crate) registry: Registry<S, E, C>,
    pub(crate) table: TransitionTable<S, E, C>,
}

/// Cheaply cloneable handle to a shared `(Registry, TransitionTable)` pair.
pub struct Structure<S, E, C> {
    inner: Arc<RwLock<StructureInner<S, E, C>>>,
}

impl<S, E, C> Clone for Structure<S, E, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: State, E: Event, C> Default for Structure<S, E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E, C> fmt::Debug for Structure<S, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structure").finish_non_exhaustive()
    }
}

impl<S: State, E: Event, C> Structure<S, E, C> {
    pub fn new() -> Self {
        Self::from_registry(Registry::new())
    }

    /// Structure whose states keep their entrance actions sorted by
    /// `entrance` and their exit actions sorted by `exit`.
    ///
    /// Actions that compare equal run in the order they were added.
    pub fn with_action_order<F, G>(entrance: F, exit: G) -> Self
    where
        F: Fn(&Action<S, E, C>, &Action<S, E, C>) -> Ordering + Send + Sync + 'static,
        G: Fn(&Action<S, E, C>, &Action<S, E, C>) -> Ordering + Send + Sync + 'static,
    {
        Self::from_registry(Registry::with_action_order(Arc::new(entrance), Arc::new(exit)))
    }

    /// [`with_action_order`](Self::with_action_order) with one comparator for both lists.
    pub fn with_sorted_actions<F>(order: F) -> Self
    where
        F: Fn(&Action<S, E, C>, &Action<S, E, C>) -> Ordering + Send + Sync + 'static,
    {
        let order: ActionOrder<S, E, C> = Arc::new(order);
        Self::from_registry(Registry::with_action_order(Arc::clone(&order), order))
    }

    fn from_registry(registry: Registry<S, E, C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StructureInner {
                registry,
                table: TransitionTable::new(),
            })),
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, StructureInner<S, E, C>> {
        self.inner.read()
    }

    /// Register `state` if it is not known yet.
    pub fn get_or_create(&self, state: S) {
        self.inner.write().registry.get_or_create(state);
    }

    pub fn contains(&self, state: &S) -> bool {
        self.read().registry.lookup(state).is_some()
    }

    /// Link `child` beneath an already registered `parent`.
    pub fn set_parent(&self, child: S, parent: &S) -> Result<(), HsmError> {
        self.inner.write().registry.set_parent(child, parent)
    }

    pub fn add_entrance_action(&self, state: S, action: Action<S, E, C>) {
        self.inner.write().registry.add_entrance_action(state, action);
    }

    pub fn add_exit_action(&self, state: S, action: Action<S, E, C>) {
        self.inner.write().registry.add_exit_action(state, action);
    }

    /// Register a transition for `event`. The source state is registered too.
    pub fn add_transition(&self, event: E, transition: Transition<S, E, C>) {
        let mut inner = self.inner.write();
        inner.registry.get_or_create(transition.source.clone());
        inner.table.add_transition(event, transition);
    }

    /// Transitions registered for `event`.
    pub fn transitions(&self, event: &E) -> Vec<Arc<Transition<S, E, C>>> {
        self.read().table.transitions(event).to_vec()
    }

    pub fn parent_of(&self, state: &S) -> Option<S> {
        let inner = self.read();
        let id = inner.registry.lookup(state)?;
        let parent = inner.registry.node(id).parent()?;
        Some(inner.registry.node(parent).state().clone())
    }

    pub fn children_of(&self, state: &S) -> Vec<S> {
        let inner = self.read();
        let Some(id) = inner.registry.lookup(state) else {
            return Vec::new();
        };
        inner
            .registry
            .node(id)
            .children()
            .iter()
            .map(|child| inner.registry.node(*child).state().clone())
            .collect()
    }

    /// Whether `candidate` is a strict ancestor of `state`.
    pub fn is_ancestor(&self, state: &S, candidate: &S) -> bool {
        let inner = self.read();
        match (inner.registry.lookup(state), inner.registry.lookup(candidate)) {
            (Some(node), Some(candidate)) => inner.registry.is_ancestor(node, candidate),
            _ => false,
        }
    }

    /// Whether `candidate` is a strict descendant of `state`.
    pub fn is_descendant(&self, state: &S, candidate: &S) -> bool {
        let inner = self.read();
        match (inner.registry.lookup(state), inner.registry.lookup(candidate)) {
            (Some(node), Some(candidate)) => inner.registry.is_descendant(node, candidate),
            _ => false,
        }
    }

    /// Deepest state shared by the hierarchies of `a` and `b`.
    pub fn common_ancestor(&self, a: &S, b: &S) -> Option<S> {
        let inner = self.read();
        let a = inner.registry.lookup(a)?;
        let b = inner.registry.lookup(b)?;
        let ancestor = inner.registry.common_ancestor(a, b)?;
        Some(inner.registry.node(ancestor).state().clone())
    }

    /// Check the structure for transitions that can never complete.
    ///
    /// Every transition with a fixed destination that has no registered
    /// state is reported; all problems are collected, not just the first.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<HsmError>> {
        let inner = self.read();
        let checks: Vec<Validation<(), NonEmptyVec<HsmError>>> = inner
            .table
            .iter()
            .map(|(event, transition)| match transition.destination.fixed() {
                Some(destination) if inner.registry.lookup(destination).is_none() => {
                    Validation::fail(HsmError::configuration(format!(
                        "Transition [{:?}] on [{event:?}] leads to unregistered state [{destination:?}]",
                        transition.source
                    )))
                }
                _ => Validation::success(()),
            })
            .collect();

        Validation::all_vec(checks).map(|_| ())
    }

    /// Create a synchronous machine over this structure.
    pub fn build(&self, starting: S, context: C) -> StateMachine<S, E, C> {
        StateMachine::new(self.clone(), starting, context)
    }

    /// Create an asynchronous machine over this structure.
    pub fn build_async(&self, starting: S, context: C) -> AsyncStateMachine<S, E, C>
    where
        C: Send,
    {
        AsyncStateMachine::new(self.build(starting, context))
    }
}
