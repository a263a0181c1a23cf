//! Error taxonomy for CIPILOT.

use crate::completion::CompletionError;

/// CIPILOT errors.
///
/// Expected negative outcomes (tests already passing, no failure located,
/// nothing changed) are not errors and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum CipilotError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to invoke command `{command}`: {reason}")]
    Command { command: String, reason: String },

    #[error("git error: {0}")]
    GitError(String),

    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("malformed plan: {0}")]
    MalformedPlan(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CIPILOT operations.
pub type Result<T> = std::result::Result<T, CipilotError>;
