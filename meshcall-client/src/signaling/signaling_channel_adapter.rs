use crate::signaling::{SignalingTransport, TransportError};
use meshcall_core::{
    ChatMessage, ClientFrame, ParticipantId, RoomHandle, ServerFrame, SignalError, SignalPayload,
    SignalingMessage,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub type MessageHandler = Box<dyn Fn(&ParticipantId, &str) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEvent {
    /// Members already in the room when the local participant joined.
    Snapshot(Vec<ParticipantId>),
    Joined(ParticipantId),
    Left(ParticipantId),
}

#[derive(Debug)]
pub enum ChannelEvent {
    Connected(ParticipantId),
    RoomJoined(RoomHandle),
    Membership(MembershipEvent),
    Signal(SignalingMessage),
    Malformed {
        sender_id: ParticipantId,
        error: SignalError,
    },
    Chat(ChatMessage),
}

/// Cloneable outbound side handed to every negotiation worker.
#[derive(Clone)]
pub struct SignalSender {
    transport: Arc<dyn SignalingTransport>,
}

impl SignalSender {
    pub fn new(transport: Arc<dyn SignalingTransport>) -> Self {
        Self { transport }
    }

    /// Fire-and-forget: failures are logged, never returned.
    pub async fn send(&self, recipient_id: &ParticipantId, payload: &SignalPayload) {
        let message = match payload.encode() {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize {} signal: {}", payload.kind(), e);
                return;
            }
        };

        let frame = ClientFrame::Signal {
            to: recipient_id.clone(),
            message,
        };
        if let Err(e) = self.transport.emit(frame).await {
            warn!("Failed to send {} signal to {}: {}", payload.kind(), recipient_id, e);
        }
    }
}

pub struct SignalingChannelAdapter {
    sender: SignalSender,
    local_id: Option<ParticipantId>,
    handlers: Vec<MessageHandler>,
}

impl SignalingChannelAdapter {
    pub fn new(transport: Arc<dyn SignalingTransport>) -> Self {
        Self {
            sender: SignalSender::new(transport),
            local_id: None,
            handlers: Vec::new(),
        }
    }

    pub fn local_id(&self) -> Option<&ParticipantId> {
        self.local_id.as_ref()
    }

    pub fn sender(&self) -> SignalSender {
        self.sender.clone()
    }

    pub async fn send(&self, recipient_id: &ParticipantId, payload: &SignalPayload) {
        self.sender.send(recipient_id, payload).await;
    }

    /// Observe every inbound signal as `(sender_id, raw_payload)`, before decoding.
    pub fn on_message<F>(&mut self, handler: F)
    where
        F: Fn(&ParticipantId, &str) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    pub async fn join(&self, room: RoomHandle) -> Result<(), TransportError> {
        self.sender
            .transport
            .emit(ClientFrame::JoinCall { room })
            .await
    }

    pub async fn send_chat(&self, text: String, sender: String) -> Result<(), TransportError> {
        self.sender
            .transport
            .emit(ClientFrame::ChatMessage { text, sender })
            .await
    }

    /// Classify one transport frame. `None` means the frame was dropped.
    pub fn accept(&mut self, frame: ServerFrame) -> Option<ChannelEvent> {
        match frame {
            ServerFrame::Connect { id } => {
                debug!("Signaling channel assigned id {}", id);
                self.local_id = Some(id.clone());
                Some(ChannelEvent::Connected(id))
            }

            ServerFrame::JoinedRoom { room } => Some(ChannelEvent::RoomJoined(room)),

            ServerFrame::UserJoined { id, members } => {
                let Some(local_id) = &self.local_id else {
                    warn!("user-joined for {} before connect, dropping", id);
                    return None;
                };

                if &id == local_id {
                    let snapshot = members.into_iter().filter(|m| m != local_id).collect();
                    Some(ChannelEvent::Membership(MembershipEvent::Snapshot(snapshot)))
                } else {
                    Some(ChannelEvent::Membership(MembershipEvent::Joined(id)))
                }
            }

            ServerFrame::UserLeft { id } => {
                if self.local_id.as_ref() == Some(&id) {
                    return None;
                }
                Some(ChannelEvent::Membership(MembershipEvent::Left(id)))
            }

            ServerFrame::Signal { from, message } => self.accept_signal(from, message),

            ServerFrame::ChatMessage(chat) => Some(ChannelEvent::Chat(chat)),
        }
    }

    fn accept_signal(&self, sender_id: ParticipantId, raw: String) -> Option<ChannelEvent> {
        let Some(local_id) = &self.local_id else {
            warn!("Signal from {} before connect, dropping", sender_id);
            return None;
        };

        for handler in &self.handlers {
            handler(&sender_id, &raw);
        }

        if &sender_id == local_id {
            debug!("Dropping self-addressed signal");
            return None;
        }

        match SignalPayload::decode(&raw) {
            Ok(payload) => Some(ChannelEvent::Signal(SignalingMessage {
                sender_id,
                recipient_id: local_id.clone(),
                payload,
            })),
            Err(error) => {
                error!("Malformed signal from {}: {}", sender_id, error);
                Some(ChannelEvent::Malformed { sender_id, error })
            }
        }
    }
}
