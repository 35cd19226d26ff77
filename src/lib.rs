//! Arbor: a hierarchical state machine engine
//!
//! States form a forest: every state may have a parent, and an event that a
//! state does not handle is offered to its ancestors. Taking a transition
//! exits states up to the deepest ancestor shared with the destination, runs
//! the transition action, then enters states down to the destination.
//!
//! # Core Concepts
//!
//! - **Structure**: the state hierarchy and the transition table, shared by
//!   every machine built over it
//! - **Guards**: predicates over the current state, the event and the context
//! - **Actions**: entry and exit callbacks on states, plus a callback on the
//!   transition itself
//! - **Machines**: [`StateMachine`] processes events on the caller's thread;
//!   [`AsyncStateMachine`] serializes events from many threads through one
//!   worker
//!
//! # Example
//!
//! ```rust
//! use arbor::builder::StateMachineBuilder;
//! use arbor::core::Action;
//!
//! let builder = StateMachineBuilder::<&str, &str, Vec<String>>::new();
//! builder.configure("Stopped").handle_to("play", "Playing");
//! builder.configure("Active").handle_to("stop", "Stopped");
//! builder
//!     .configure("Playing")
//!     .child_of("Active")
//!     .unwrap()
//!     .on_entry(Action::on_context(|log: &mut Vec<String>| log.push("spinning".into())))
//!     .handle_to("pause", "Paused");
//! builder
//!     .configure("Paused")
//!     .child_of("Active")
//!     .unwrap()
//!     .handle_to("play", "Playing");
//!
//! let mut player = builder.build("Stopped", Vec::new());
//! player.fire(&"play").unwrap();
//! player.fire(&"pause").unwrap();
//!
//! // "stop" is declared on the parent of Paused.
//! player.fire(&"stop").unwrap();
//! assert_eq!(player.state(), &"Stopped");
//! assert_eq!(player.context(), &vec!["spinning"]);
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod machine;
pub mod scheduler;
pub mod signal;
pub mod structure;

// Re-export commonly used types
pub use builder::{StateBuilder, StateMachineBuilder, TransitionBuilder};
pub use core::{
    Action, Event, Guard, HsmError, ResolvedTransition, State, StateHistory, StateTransition,
    Transition, TransitionAction,
};
pub use engine::{HistoryListener, TransitionListener, TransitionStage};
pub use machine::StateMachine;
pub use scheduler::{AsyncStateMachine, TaskHandle};
pub use signal::Signal;
pub use structure::Structure;
