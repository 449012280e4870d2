use async_trait::async_trait;
use meshcall_core::ClientFrame;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("signaling channel closed")]
    Closed,

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outbound half of the room channel.
///
/// Delivery is reliable and ordered per sender; the channel stamps the sender id,
/// so frames never carry it themselves.
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    async fn emit(&self, frame: ClientFrame) -> Result<(), TransportError>;
}
