use anyhow::Result;
use async_trait::async_trait;
use meshcall_client::{ConnectionEvent, ConnectionFactory, MediaHandle, PeerConnection};
use meshcall_core::{IceCandidate, ParticipantId, SdpType, SessionDescription};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateOffer,
    CreateAnswer,
    SetLocal(SdpType),
    SetRemote(SdpType),
    AddIce(String),
    Close,
}

/// Records every call and raises one local candidate per local description.
pub struct MockConnection {
    local_id: ParticipantId,
    remote_id: ParticipantId,
    events: mpsc::Sender<ConnectionEvent>,
    calls: Mutex<Vec<Call>>,
}

impl MockConnection {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn has(&self, call: &Call) -> bool {
        self.calls().contains(call)
    }

    pub fn is_closed(&self) -> bool {
        self.has(&Call::Close)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

/// The candidate a participant's connection advertises.
pub fn candidate_of(id: &ParticipantId) -> String {
    format!("candidate:{}", id)
}

#[async_trait]
impl PeerConnection for MockConnection {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record(Call::CreateOffer);
        Ok(SessionDescription::offer(format!("offer from {}", self.local_id)))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.record(Call::CreateAnswer);
        Ok(SessionDescription::answer(format!("answer from {}", self.local_id)))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(Call::SetLocal(desc.sdp_type));
        let _ = self
            .events
            .send(ConnectionEvent::CandidateGenerated(
                self.remote_id.clone(),
                IceCandidate::new(candidate_of(&self.local_id)),
            ))
            .await;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(Call::SetRemote(desc.sdp_type));
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.record(Call::AddIce(candidate.candidate));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record(Call::Close);
        Ok(())
    }
}

pub struct MockFactory {
    local_id: ParticipantId,
    connections: Mutex<HashMap<ParticipantId, Arc<MockConnection>>>,
}

impl MockFactory {
    pub fn new(local_id: ParticipantId) -> Self {
        Self {
            local_id,
            connections: Mutex::new(HashMap::new()),
        }
    }

    pub fn connection(&self, remote_id: &ParticipantId) -> Option<Arc<MockConnection>> {
        self.connections.lock().unwrap().get(remote_id).cloned()
    }
}

#[async_trait]
impl ConnectionFactory for MockFactory {
    async fn create(
        &self,
        remote_id: ParticipantId,
        _local_media: MediaHandle,
        events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Arc<dyn PeerConnection>> {
        let connection = Arc::new(MockConnection {
            local_id: self.local_id.clone(),
            remote_id: remote_id.clone(),
            events,
            calls: Mutex::new(Vec::new()),
        });
        self.connections
            .lock()
            .unwrap()
            .insert(remote_id, connection.clone());
        Ok(connection)
    }
}
