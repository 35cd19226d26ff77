//! Build errors for transition and state builders.

use crate::core::HsmError;
use thiserror::Error;

/// Errors that can occur when assembling a transition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Transition source state not specified. Call .from(state)")]
    MissingFromState,

    #[error("Transition destination not specified. Call .to(state) or .to_with(resolver)")]
    MissingToState,

    #[error("Transition declared on [{found}] was handed to the builder of [{expected}]")]
    SourceMismatch { expected: String, found: String },
}

impl From<BuildError> for HsmError {
    fn from(err: BuildError) -> Self {
        HsmError::configuration(err.to_string())
    }
}
