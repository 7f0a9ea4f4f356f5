//! Top-level protocol error type.

use thiserror::Error;

use super::{CompletionError, HintError, KernelError, TransportError};

/// Top-level protocol error type.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Hint error: {0}")]
    Hint(#[from] HintError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_error_from() {
        let err = ProtocolError::from(CompletionError::Cancelled);
        assert!(err.to_string().contains("Completion error"));
    }

    #[test]
    fn test_hint_error_from() {
        let err = ProtocolError::from(HintError::NotActive);
        assert!(err.to_string().contains("Hint error"));
    }

    #[test]
    fn test_transport_error_from() {
        let err = ProtocolError::from(TransportError::Closed);
        assert!(err.to_string().contains("Transport error"));
    }

    #[test]
    fn test_kernel_error_from() {
        let err = ProtocolError::from(KernelError::Timeout);
        assert!(err.to_string().contains("Kernel error"));
    }

    #[test]
    fn test_validation_error() {
        let err = ProtocolError::Validation("mode index".to_string());
        assert!(err.to_string().contains("Validation error"));
        assert!(err.to_string().contains("mode index"));
    }

    #[test]
    fn test_serialization_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err = ProtocolError::from(json_err);
        assert!(err.to_string().contains("Serialization error"));
    }
}
