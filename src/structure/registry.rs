//! Hierarchy registry: the arena of internal state nodes.
//!
//! Nodes are created lazily on first reference and live as long as the
//! registry. Parent and child links are arena indices, so the tree never
//! holds owning cycles, and `set_parent` rejects links that would close a
//! cycle.

use crate::core::{Action, Event, HsmError, State};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Comparator deciding the order in which a state's actions run.
pub type ActionOrder<S, E, C> = Arc<dyn Fn(&Action<S, E, C>, &Action<S, E, C>) -> Ordering + Send + Sync>;

/// Index of a node in the registry arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One state in the hierarchy with its entrance and exit actions.
#[derive(Debug)]
pub struct InternalState<S, E, C> {
    state: S,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    entrance_actions: Vec<Action<S, E, C>>,
    exit_actions: Vec<Action<S, E, C>>,
}

impl<S: State, E: Event, C> InternalState<S, E, C> {
    fn new(state: S) -> Self {
        Self {
            state,
            parent: None,
            children: Vec::new(),
            entrance_actions: Vec::new(),
            exit_actions: Vec::new(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn entrance_actions(&self) -> &[Action<S, E, C>] {
        &self.entrance_actions
    }

    pub fn exit_actions(&self) -> &[Action<S, E, C>] {
        &self.exit_actions
    }
}

/// Add `action` unless the same allocation is already present.
///
/// With an order, the action goes after every action that does not compare
/// greater, so equal keys keep insertion order.
fn insert_action<S: State, E: Event, C>(
    actions: &mut Vec<Action<S, E, C>>,
    action: Action<S, E, C>,
    order: Option<&ActionOrder<S, E, C>>,
) {
    if actions.iter().any(|existing| existing.ptr_eq(&action)) {
        return;
    }
    match order {
        Some(order) => {
            let at = actions.partition_point(|existing| order(existing, &action) != Ordering::Greater);
            actions.insert(at, action);
        }
        None => actions.push(action),
    }
}

/// Owner of every [`InternalState`] of a structure.
pub struct Registry<S, E, C> {
    index: HashMap<S, NodeId>,
    nodes: Vec<InternalState<S, E, C>>,
    entrance_order: Option<ActionOrder<S, E, C>>,
    exit_order: Option<ActionOrder<S, E, C>>,
}

impl<S: fmt::Debug, E, C> fmt::Debug for Registry<S, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("nodes", &self.nodes.len())
            .field("sorted_entrance", &self.entrance_order.is_some())
            .field("sorted_exit", &self.exit_order.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: State, E: Event, C> Default for Registry<S, E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State, E: Event, C> Registry<S, E, C> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            nodes: Vec::new(),
            entrance_order: None,
            exit_order: None,
        }
    }

    /// Registry whose nodes keep their entrance and exit actions sorted.
    pub fn with_action_order(entrance: ActionOrder<S, E, C>, exit: ActionOrder<S, E, C>) -> Self {
        Self {
            entrance_order: Some(entrance),
            exit_order: Some(exit),
            ..Self::new()
        }
    }

    /// Look up the node for `state`, creating it if needed.
    pub fn get_or_create(&mut self, state: S) -> NodeId {
        if let Some(id) = self.index.get(&state) {
            return *id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(InternalState::new(state.clone()));
        self.index.insert(state, id);
        id
    }

    pub fn lookup(&self, state: &S) -> Option<NodeId> {
        self.index.get(state).copied()
    }

    /// Node for `id`, or `None` if the id belongs to another registry.
    pub fn get(&self, id: NodeId) -> Option<&InternalState<S, E, C>> {
        self.nodes.get(id.0)
    }

    /// Ids handed out by this registry are always in range.
    pub(crate) fn node(&self, id: NodeId) -> &InternalState<S, E, C> {
        &self.nodes[id.0]
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(InternalState::parent)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Make `parent` the parent of `child`.
    ///
    /// The parent must already be registered; the child is created if needed.
    /// A child that already had a parent is detached from it first. Links
    /// that would make a state its own ancestor are rejected.
    pub fn set_parent(&mut self, child: S, parent: &S) -> Result<(), HsmError> {
        let Some(parent_id) = self.lookup(parent) else {
            return Err(HsmError::configuration(format!(
                "Unknown parent state [{parent:?}] for state [{child:?}]"
            )));
        };
        let child_id = self.get_or_create(child);

        if child_id == parent_id || self.is_ancestor(parent_id, child_id) {
            return Err(HsmError::configuration(format!(
                "Making [{:?}] the parent of [{:?}] would create a cycle",
                self.node(parent_id).state,
                self.node(child_id).state
            )));
        }

        if let Some(previous) = self.nodes[child_id.0].parent {
            self.nodes[previous.0].children.retain(|id| *id != child_id);
        }
        self.nodes[child_id.0].parent = Some(parent_id);
        let children = &mut self.nodes[parent_id.0].children;
        if !children.contains(&child_id) {
            children.push(child_id);
        }
        Ok(())
    }

    pub fn add_entrance_action(&mut self, state: S, action: Action<S, E, C>) {
        let id = self.get_or_create(state);
        insert_action(&mut self.nodes[id.0].entrance_actions, action, self.entrance_order.as_ref());
    }

    pub fn add_exit_action(&mut self, state: S, action: Action<S, E, C>) {
        let id = self.get_or_create(state);
        insert_action(&mut self.nodes[id.0].exit_actions, action, self.exit_order.as_ref());
    }

    /// Whether `candidate` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, node: NodeId, candidate: NodeId) -> bool {
        let mut current = self.parent_of(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// Whether `candidate` is a strict descendant of `node`.
    pub fn is_descendant(&self, node: NodeId, candidate: NodeId) -> bool {
        let mut pending: Vec<NodeId> = self.get(node).map(|n| n.children.clone()).unwrap_or_default();
        while let Some(id) = pending.pop() {
            if id == candidate {
                return true;
            }
            pending.extend_from_slice(&self.node(id).children);
        }
        false
    }

    /// Deepest state that both `a` and `b` sit beneath.
    ///
    /// If one node is an ancestor of the other, that ancestor is the answer.
    /// Otherwise the chain above `b` is walked until a level that is also an
    /// ancestor of `a` is found. `None` means the nodes are in disjoint trees.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        if self.is_ancestor(a, b) {
            return Some(b);
        }
        if self.is_ancestor(b, a) {
            return Some(a);
        }
        let mut level = self.parent_of(b);
        while let Some(id) = level {
            if self.is_ancestor(a, id) {
                return Some(id);
            }
            level = self.parent_of(id);
        }
        None
    }

    /// Nodes from `from` up to, but excluding, `stop`. Child first.
    ///
    /// With `stop == None` the walk ends at the root.
    pub fn chain_up(&self, from: NodeId, stop: Option<NodeId>) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.get(from).map(|_| from);
        while let Some(id) = current {
            if Some(id) == stop {
                break;
            }
            chain.push(id);
            current = self.parent_of(id);
        }
        chain
    }
}
