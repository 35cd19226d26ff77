//! Builder API for ergonomic state machine construction.
//!
//! [`StateMachineBuilder::configure`] hands out a [`StateBuilder`] per state;
//! its fluent methods place the state in the hierarchy, attach entry and
//! exit actions and register the transitions it declares.
//!
//! # Example
//!
//! ```
//! use arbor::builder::{StateMachineBuilder, TransitionBuilder};
//!
//! let builder = StateMachineBuilder::<&str, &str, u32>::new();
//! builder
//!     .configure("Locked")
//!     .handle("coin", TransitionBuilder::new().to("Unlocked").when(|_, _, coins: &u32| *coins > 0))
//!     .unwrap();
//! builder.configure("Unlocked").handle_to("push", "Locked");
//!
//! let mut machine = builder.build("Locked", 1);
//! machine.fire(&"coin").unwrap();
//! assert_eq!(machine.state(), &"Unlocked");
//! ```

pub mod error;
pub mod machine;
pub mod transition;

pub use error::BuildError;
pub use machine::{StateBuilder, StateMachineBuilder};
pub use transition::TransitionBuilder;
