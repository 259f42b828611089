//! Error types for graphvote-core.

use thiserror::Error;

/// Result type for graphvote-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when parsing vote model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Unknown vote stance.
    #[error("invalid vote status: {0:?}")]
    InvalidStatus(String),

    /// Unknown vote tier.
    #[error("invalid vote tier: {0:?}")]
    InvalidTier(String),

    /// Unknown entity kind.
    #[error("invalid entity kind: {0:?}")]
    InvalidKind(String),
}
