//! Core value types shared by the engine, machines and builders.
//!
//! - State and event identifiers via the `State` and `Event` traits
//! - Guard predicates and entry/exit/transition actions
//! - Structural transitions and their resolved snapshots
//! - Immutable transition history
//! - The crate error type

mod action;
mod error;
mod guard;
mod history;
mod state;
mod transition;

pub use action::{Action, TransitionAction};
pub use error::HsmError;
pub use guard::Guard;
pub use history::{StateHistory, StateTransition};
pub use state::{Event, State};
pub use transition::{Destination, ResolvedTransition, Transition};
