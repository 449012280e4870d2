use crate::media::MediaHandle;
use crate::peer::{ConnectionEvent, ConnectionFactory, PeerConnection};
use crate::signaling::{SignalingTransport, TransportError};
use anyhow::{Result, bail};
use async_trait::async_trait;
use meshcall_core::{
    ClientFrame, IceCandidate, ParticipantId, SdpType, SessionDescription, SignalPayload,
};
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

#[derive(Default)]
pub struct MockConnection {
    calls: Mutex<Vec<Call>>,
    reject_remote: bool,
}

impl MockConnection {
    /// A connection whose `set_remote_description` always fails.
    pub fn rejecting_remote() -> Self {
        Self {
            reject_remote: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.calls().contains(&Call::Close)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PeerConnection for MockConnection {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record(Call::CreateOffer);
        Ok(SessionDescription::offer("mock-offer"))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.record(Call::CreateAnswer);
        Ok(SessionDescription::answer("mock-answer"))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(Call::SetLocal(desc.sdp_type));
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(Call::SetRemote(desc.sdp_type));
        if self.reject_remote {
            bail!("incompatible description");
        }
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

/// Hands out `MockConnection`s and remembers them by remote id.
#[derive(Default)]
pub struct MockFactory {
    connections: Mutex<HashMap<ParticipantId, Arc<MockConnection>>>,
    attached_media: Mutex<Vec<MediaHandle>>,
    fail_for: Mutex<Vec<ParticipantId>>,
    reject_remote_for: Mutex<Vec<ParticipantId>>,
}

impl MockFactory {
    pub fn connection(&self, remote_id: &str) -> Arc<MockConnection> {
        self.connections
            .lock()
            .unwrap()
            .get(&ParticipantId::from(remote_id))
            .cloned()
            .unwrap_or_else(|| panic!("no connection created for {}", remote_id))
    }

    pub fn attached_media(&self) -> Vec<MediaHandle> {
        self.attached_media.lock().unwrap().clone()
    }

    pub fn fail_for(&self, remote_id: &str) {
        self.fail_for
            .lock()
            .unwrap()
            .push(ParticipantId::from(remote_id));
    }

    pub fn reject_remote_for(&self, remote_id: &str) {
        self.reject_remote_for
            .lock()
            .unwrap()
            .push(ParticipantId::from(remote_id));
    }
}

#[async_trait]
impl ConnectionFactory for MockFactory {
    async fn create(
        &self,
        remote_id: ParticipantId,
        local_media: MediaHandle,
        _events: mpsc::Sender<ConnectionEvent>,
    ) -> Result<Arc<dyn PeerConnection>> {
        if self.fail_for.lock().unwrap().contains(&remote_id) {
            bail!("no transport for {}", remote_id);
        }
        self.attached_media.lock().unwrap().push(local_media);
        let connection = if self.reject_remote_for.lock().unwrap().contains(&remote_id) {
            Arc::new(MockConnection::rejecting_remote())
        } else {
            Arc::new(MockConnection::default())
        };
        self.connections
            .lock()
            .unwrap()
            .insert(remote_id, connection.clone());
        Ok(connection)
    }
}

#[derive(Default)]
pub struct RecordingTransport {
    frames: Mutex<Vec<ClientFrame>>,
}

impl RecordingTransport {
    pub fn frames(&self) -> Vec<ClientFrame> {
        self.frames.lock().unwrap().clone()
    }

    /// Every signal sent so far, with its recipient.
    pub fn payloads(&self) -> Vec<(ParticipantId, SignalPayload)> {
        self.frames()
            .into_iter()
            .filter_map(|f| match f {
                ClientFrame::Signal { to, message } => {
                    Some((to, SignalPayload::decode(&message).unwrap()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn signals_to(&self, recipient: &str) -> Vec<SignalPayload> {
        self.frames()
            .into_iter()
            .filter_map(|f| match f {
                ClientFrame::Signal { to, message } if to.as_str() == recipient => {
                    Some(SignalPayload::decode(&message).unwrap())
                }
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SignalingTransport for RecordingTransport {
    async fn emit(&self, frame: ClientFrame) -> Result<(), TransportError> {
        self.frames.lock().unwrap().push(frame);
        Ok(())
    }
}
