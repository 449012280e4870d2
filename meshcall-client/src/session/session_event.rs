use crate::media::MediaHandle;
use meshcall_core::{ChatMessage, ParticipantId, RoomHandle};

/// What the view layer needs to know to render a call.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Connected(ParticipantId),
    RoomJoined(RoomHandle),
    ParticipantJoined(ParticipantId),
    ParticipantLeft(ParticipantId),
    /// First stream from a participant, or a replacement for the previous one.
    RemoteStream {
        id: ParticipantId,
        stream: MediaHandle,
    },
    /// The pairing is dead; the participant stays in the room without media.
    PairingFailed {
        id: ParticipantId,
        reason: String,
    },
    Chat(ChatMessage),
    Ended,
}
