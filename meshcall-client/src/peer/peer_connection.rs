use crate::media::MediaHandle;
use anyhow::Result;
use async_trait::async_trait;
use meshcall_core::{IceCandidate, ParticipantId, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One bidirectional media connection to a remote participant.
///
/// Every method may suspend; callers must not assume the connection is still
/// wanted when the call returns.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Events a connection raises on its own, outside any negotiation step.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// A local ICE candidate that has to reach the remote side.
    CandidateGenerated(ParticipantId, IceCandidate),

    /// Remote media arrived (or gained a track).
    RemoteStream(ParticipantId, MediaHandle),

    /// The pairing can no longer carry media.
    Failed(ParticipantId, String),
}

#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// `local_media` is attached as-is; implementations must not clone the tracks.
    async fn create(
        &self,
        remote_id: ParticipantId,
        local_media: MediaHandle,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Arc<dyn PeerConnection>>;
}
