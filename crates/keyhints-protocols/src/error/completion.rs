//! Completion-engine errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Completion request timed out after {0} ms")]
    Timeout(u64),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Failed to parse completion response: {0}")]
    Parse(String),

    #[error("Completion request was cancelled")]
    Cancelled,

    #[error("No completion engine for: {0}")]
    UnknownEngine(String),
}

impl From<serde_json::Error> for CompletionError {
    fn from(err: serde_json::Error) -> Self {
        CompletionError::Parse(err.to_string())
    }
}
