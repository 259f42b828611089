//! Error types for the voting engine.

use graphvote_core::{EntityKind, VoteTier};
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the vote server or wiring controllers.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The request never produced a response (connection refused, timed out, dropped).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("Server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The server answered with something we cannot use.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The entity kind has no such tier.
    #[error("{kind} nodes do not support {tier} voting")]
    UnsupportedTier { kind: EntityKind, tier: VoteTier },

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<graphvote_core::Error> for Error {
    fn from(e: graphvote_core::Error) -> Self {
        Error::InvalidResponse(e.to_string())
    }
}
