use async_trait::async_trait;
use meshcall_client::{SignalingTransport, TransportError};
use meshcall_core::{ChatMessage, ClientFrame, ParticipantId, ServerFrame};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Default)]
struct RelayState {
    peers: HashMap<ParticipantId, mpsc::Sender<ServerFrame>>,
    members: Vec<ParticipantId>,
}

/// In-memory stand-in for the relay server: one room, frames delivered in order.
#[derive(Clone, Default)]
pub struct MockRelay {
    state: Arc<Mutex<RelayState>>,
}

impl MockRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a participant and queues its `connect` frame.
    pub fn connect(&self) -> (ParticipantId, Arc<RelayTransport>, mpsc::Receiver<ServerFrame>) {
        let id = ParticipantId::generate();
        let (tx, rx) = mpsc::channel(1024);
        tx.try_send(ServerFrame::Connect { id: id.clone() }).unwrap();

        self.state.lock().unwrap().peers.insert(id.clone(), tx);

        let transport = Arc::new(RelayTransport {
            id: id.clone(),
            relay: self.clone(),
        });
        (id, transport, rx)
    }

    pub fn disconnect(&self, id: &ParticipantId) {
        let mut state = self.state.lock().unwrap();
        state.peers.remove(id);
        state.members.retain(|m| m != id);
        Self::broadcast(&state, ServerFrame::UserLeft { id: id.clone() });
    }

    /// Deliver an arbitrary frame to one participant.
    pub fn inject(&self, to: &ParticipantId, frame: ServerFrame) {
        let state = self.state.lock().unwrap();
        if let Some(tx) = state.peers.get(to) {
            tx.try_send(frame).unwrap();
        }
    }

    fn broadcast(state: &RelayState, frame: ServerFrame) {
        for member in &state.members {
            if let Some(tx) = state.peers.get(member) {
                let _ = tx.try_send(frame.clone());
            }
        }
    }

    fn route(&self, from: &ParticipantId, frame: ClientFrame) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if !state.peers.contains_key(from) {
            return Err(TransportError::Closed);
        }

        match frame {
            ClientFrame::JoinCall { room } => {
                if !state.members.contains(from) {
                    state.members.push(from.clone());
                }
                if let Some(tx) = state.peers.get(from) {
                    let _ = tx.try_send(ServerFrame::JoinedRoom { room });
                }
                let members = state.members.clone();
                Self::broadcast(
                    &state,
                    ServerFrame::UserJoined {
                        id: from.clone(),
                        members,
                    },
                );
            }
            ClientFrame::Signal { to, message } => {
                if let Some(tx) = state.peers.get(&to) {
                    let _ = tx.try_send(ServerFrame::Signal {
                        from: from.clone(),
                        message,
                    });
                }
            }
            ClientFrame::ChatMessage { text, sender } => {
                Self::broadcast(
                    &state,
                    ServerFrame::ChatMessage(ChatMessage {
                        text,
                        sender,
                        from: from.clone(),
                    }),
                );
            }
        }
        Ok(())
    }
}

pub struct RelayTransport {
    id: ParticipantId,
    relay: MockRelay,
}

#[async_trait]
impl SignalingTransport for RelayTransport {
    async fn emit(&self, frame: ClientFrame) -> Result<(), TransportError> {
        self.relay.route(&self.id, frame)
    }
}
