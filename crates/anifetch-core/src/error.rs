//! Core domain errors.

use thiserror::Error;

/// Core domain errors for anifetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Caller input failed validation. Caller-correctable.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown task kind.
    #[error("Unknown task kind: {0}")]
    UnknownKind(String),

    /// Invalid lifecycle transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },
}

impl CoreError {
    /// Shorthand for building an `InvalidRequest`.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}
