//! Frame transport errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,

    #[error("No port registered for frame {0}")]
    UnknownFrame(u64),

    #[error("Message serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_closed() {
        let err = TransportError::Closed;
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn test_transport_error_unknown_frame() {
        let err = TransportError::UnknownFrame(3);
        assert!(err.to_string().contains("frame 3"));
    }

    #[test]
    fn test_transport_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = TransportError::from(json_err);
        assert!(err.to_string().contains("serialization"));
    }
}
