//! Frame transport protocol.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::hint::{FrameId, HintMessage, TabId};

/// Delivers hint-coordination messages between frames and the tab coordinator.
///
/// Implementations must preserve ordering per sender/receiver pair. Nothing is
/// promised about ordering across different frames.
#[async_trait]
pub trait FrameTransport: Send + Sync {
    /// Send a message from a frame to its tab coordinator.
    async fn send_to_tab(
        &self,
        tab_id: TabId,
        from: FrameId,
        message: HintMessage,
    ) -> Result<(), TransportError>;

    /// Send a message to one frame.
    async fn send_to_frame(
        &self,
        tab_id: TabId,
        frame_id: FrameId,
        message: HintMessage,
    ) -> Result<(), TransportError>;
}
