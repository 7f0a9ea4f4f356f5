//! Kernel lifecycle and registry errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("Completer not found: {0}")]
    NotFound(String),

    #[error("Completer already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Invalid kernel state: {0}")]
    InvalidState(String),

    #[error("Kernel hook failed: {0}")]
    HookFailed(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Shutdown timed out")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = KernelError::NotFound("omni".to_string());
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("omni"));
    }

    #[test]
    fn test_already_registered_error() {
        let err = KernelError::AlreadyRegistered("tabs".to_string());
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_invalid_state_error() {
        let err = KernelError::InvalidState("Stopped".to_string());
        assert_eq!(err.to_string(), "Invalid kernel state: Stopped");
    }

    #[test]
    fn test_timeout_error() {
        assert!(KernelError::Timeout.to_string().contains("timed out"));
    }
}
