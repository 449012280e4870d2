use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub body: String,
}

impl SessionDescription {
    pub fn offer(body: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            body: body.into(),
        }
    }

    pub fn answer(body: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }
}

/// Negotiation payload as it travels inside a `signal` frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SignalPayload {
    Sdp { sdp: SessionDescription },
    Ice { ice: IceCandidate },
}

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("payload has no `kind` field")]
    MissingKind,

    #[error("unrecognized signal kind `{0}`")]
    UnknownKind(String),

    #[error("malformed `{kind}` payload: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode signal: {0}")]
    Encode(#[source] serde_json::Error),
}

impl SignalPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            SignalPayload::Sdp { .. } => "sdp",
            SignalPayload::Ice { .. } => "ice",
        }
    }

    pub fn decode(raw: &str) -> Result<Self, SignalError> {
        let value: serde_json::Value = serde_json::from_str(raw).map_err(SignalError::InvalidJson)?;

        let kind = match value.get("kind").and_then(|k| k.as_str()) {
            Some(kind @ ("sdp" | "ice")) => kind.to_owned(),
            Some(other) => return Err(SignalError::UnknownKind(other.to_owned())),
            None => return Err(SignalError::MissingKind),
        };

        serde_json::from_value(value).map_err(|source| SignalError::InvalidPayload { kind, source })
    }

    pub fn encode(&self) -> Result<String, SignalError> {
        serde_json::to_string(self).map_err(SignalError::Encode)
    }
}

/// A decoded payload together with the routing metadata supplied by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalingMessage {
    pub sender_id: ParticipantId,
    pub recipient_id: ParticipantId,
    pub payload: SignalPayload,
}

impl SignalingMessage {
    /// Only messages addressed to `local` and not originating from it are applied.
    pub fn is_deliverable_to(&self, local: &ParticipantId) -> bool {
        &self.recipient_id == local && &self.sender_id != local
    }
}
