use dashmap::DashMap;
use meshcall_core::{ChatMessage, ClientFrame, ParticipantId, RoomHandle, ServerFrame};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct RelayInner {
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<ServerFrame>>,
    /// Members per room, in join order.
    rooms: DashMap<RoomHandle, Vec<ParticipantId>>,
    membership: DashMap<ParticipantId, RoomHandle>,
}

/// Room-scoped relay: membership broadcasts, point-to-point signal forwarding
/// and chat fan-out. Payloads are never inspected.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                peers: DashMap::new(),
                rooms: DashMap::new(),
                membership: DashMap::new(),
            }),
        }
    }

    /// Registers a socket and tells it its id.
    pub fn connect(&self, tx: mpsc::UnboundedSender<ServerFrame>) -> ParticipantId {
        let id = ParticipantId::generate();
        info!("Participant {} connected", id);

        let _ = tx.send(ServerFrame::Connect { id: id.clone() });
        self.inner.peers.insert(id.clone(), tx);
        id
    }

    pub fn disconnect(&self, id: &ParticipantId) {
        self.leave_room(id);
        self.inner.peers.remove(id);
        info!("Participant {} disconnected", id);
    }

    pub fn handle(&self, from: &ParticipantId, frame: ClientFrame) {
        match frame {
            ClientFrame::JoinCall { room } => self.join(from, room),
            ClientFrame::Signal { to, message } => self.forward_signal(from, to, message),
            ClientFrame::ChatMessage { text, sender } => self.broadcast_chat(from, text, sender),
        }
    }

    pub fn room_of(&self, id: &ParticipantId) -> Option<RoomHandle> {
        self.inner.membership.get(id).map(|r| r.value().clone())
    }

    pub fn members(&self, room: &RoomHandle) -> Vec<ParticipantId> {
        self.inner
            .rooms
            .get(room)
            .map(|m| m.value().clone())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.inner.rooms.len()
    }

    fn join(&self, id: &ParticipantId, room: RoomHandle) {
        if self.room_of(id).as_ref() == Some(&room) {
            debug!("{} is already in {}", id, room);
            return;
        }
        self.leave_room(id);

        let members = {
            let mut members = self.inner.rooms.entry(room.clone()).or_default();
            members.push(id.clone());
            members.clone()
        };
        self.inner.membership.insert(id.clone(), room.clone());
        info!("{} joined {} ({} member(s))", id, room, members.len());

        self.send(id, ServerFrame::JoinedRoom { room });
        for member in &members {
            self.send(
                member,
                ServerFrame::UserJoined {
                    id: id.clone(),
                    members: members.clone(),
                },
            );
        }
    }

    fn leave_room(&self, id: &ParticipantId) {
        let Some((_, room)) = self.inner.membership.remove(id) else {
            return;
        };

        let remaining = match self.inner.rooms.get_mut(&room) {
            Some(mut members) => {
                members.retain(|m| m != id);
                members.clone()
            }
            None => Vec::new(),
        };

        if remaining.is_empty() {
            self.inner.rooms.remove_if(&room, |_, m| m.is_empty());
            debug!("Room {} is empty, dropping it", room);
        }

        for member in &remaining {
            self.send(member, ServerFrame::UserLeft { id: id.clone() });
        }
    }

    fn forward_signal(&self, from: &ParticipantId, to: ParticipantId, message: String) {
        if !self.inner.peers.contains_key(&to) {
            warn!("Signal from {} to disconnected participant {}", from, to);
            return;
        }
        self.send(
            &to,
            ServerFrame::Signal {
                from: from.clone(),
                message,
            },
        );
    }

    fn broadcast_chat(&self, from: &ParticipantId, text: String, sender: String) {
        let Some(room) = self.room_of(from) else {
            warn!("Chat from {} outside any room, dropping", from);
            return;
        };

        let chat = ChatMessage {
            text,
            sender,
            from: from.clone(),
        };
        for member in self.members(&room) {
            self.send(&member, ServerFrame::ChatMessage(chat.clone()));
        }
    }

    fn send(&self, to: &ParticipantId, frame: ServerFrame) {
        match self.inner.peers.get(to) {
            Some(peer) => {
                if peer.send(frame).is_err() {
                    debug!("Socket for {} already closed", to);
                }
            }
            None => warn!("Attempted to send to disconnected participant {}", to),
        }
    }
}
