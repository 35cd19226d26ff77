//! Errors raised while configuring or running a state machine.

use thiserror::Error;

/// Errors that can occur when configuring or firing a state machine.
///
/// An event that no state handles is not an error: `fire` returns `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HsmError {
    #[error("Invalid state machine configuration: {message}")]
    Configuration { message: String },

    #[error("Multiple [{count}] transitions possible for event [{event}] in state [{state}]")]
    AmbiguousTransition {
        event: String,
        state: String,
        count: usize,
    },

    #[error("No internal state found for destination state [{destination}]")]
    UnknownDestination { destination: String },

    #[error(
        "fire was called from within a synchronous action or listener; \
         use submit, inject or an offloaded callback instead"
    )]
    Reentrancy,

    #[error("State machine worker failed: {reason}")]
    WorkerFailure { reason: String },

    #[error("Event task was cancelled before it ran")]
    Cancelled,

    #[error("State machine worker is already running")]
    AlreadyRunning,
}

impl HsmError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        HsmError::Configuration {
            message: message.into(),
        }
    }
}
