mod participant;
mod room;
mod signaling;

pub use participant::ParticipantId;
pub use room::{RoomHandle, RoomHandleError};
pub use signaling::{
    IceCandidate, IceServerConfig, SdpType, SessionDescription, SignalError, SignalPayload,
    SignalingMessage,
};
