//! Hint-mode errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HintError {
    #[error("Unknown frame: {0}")]
    UnknownFrame(u64),

    #[error("Hint mode is not active")]
    NotActive,

    #[error("Descriptor {local_index} is out of range for frame {frame_id}")]
    DescriptorOutOfRange { frame_id: u64, local_index: usize },

    #[error("Invalid link hint mode index: {0}")]
    InvalidMode(usize),

    #[error("Link action failed: {0}")]
    ActionFailed(String),
}
