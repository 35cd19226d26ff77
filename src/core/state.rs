//! Identifier traits for states and events.
//!
//! States and events are opaque to the engine: it only needs to compare,
//! hash, clone and print them. Both traits are blanket-implemented, so plain
//! enums, `&'static str` or `String` work out of the box.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state machine states.
///
/// # Required Traits
///
/// - `Clone`: states are copied into transition snapshots and history
/// - `Eq` + `Hash`: states key the hierarchy registry
/// - `Debug`: states are rendered into errors and trace logs
/// - `Send` + `Sync`: a structure may be shared by machines on many threads
///
/// # Example
///
/// ```rust
/// use arbor::core::State;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Player {
///     Stopped,
///     Active,
///     Playing,
/// }
///
/// fn assert_state<S: State>(_: &S) {}
/// assert_state(&Player::Playing);
/// assert_state(&"Locked");
/// ```
pub trait State: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> State for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Trait for events that trigger transitions.
///
/// Events key the transition table, so the bounds match [`State`].
pub trait Event: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Event for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}
