use crate::model::{ParticipantId, RoomHandle};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub sender: String,
    pub from: ParticipantId,
}

/// Room channel events pushed by the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ServerFrame {
    Connect {
        id: ParticipantId,
    },
    JoinedRoom {
        room: RoomHandle,
    },
    /// Sent to every member, the newcomer included; `members` lists the whole room.
    UserJoined {
        id: ParticipantId,
        members: Vec<ParticipantId>,
    },
    UserLeft {
        id: ParticipantId,
    },
    /// `message` is the raw JSON of a `SignalPayload`.
    Signal {
        from: ParticipantId,
        message: String,
    },
    ChatMessage(ChatMessage),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientFrame {
    JoinCall { room: RoomHandle },
    Signal { to: ParticipantId, message: String },
    ChatMessage { text: String, sender: String },
}
