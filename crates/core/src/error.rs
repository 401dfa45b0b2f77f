//! Errors raised by domain rules, independent of any store.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// A domain rule refused an input or a transition.
///
/// Store and transport failures never appear here; adapters report those
/// through their own error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input: blank names, non-positive quantities and the like.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A state the model must never hold was about to be recorded.
    #[error("invariant broken: {0}")]
    InvariantViolation(String),

    /// Text that does not parse as the expected identifier.
    #[error("malformed identifier: {0}")]
    InvalidId(String),

    /// The transition is not allowed from the current state.
    #[error("state conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
