use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomHandleError {
    #[error("room handle is empty")]
    Empty,
}

/// Shared identifier grouping the participants of one call, usually the page URL.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(try_from = "String", into = "String")]
pub struct RoomHandle(String);

impl RoomHandle {
    pub fn new(raw: &str) -> Result<Self, RoomHandleError> {
        let normalized = raw.trim().trim_end_matches('/');
        if normalized.is_empty() {
            return Err(RoomHandleError::Empty);
        }
        Ok(Self(normalized.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomHandle {
    type Error = RoomHandleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<RoomHandle> for String {
    fn from(room: RoomHandle) -> Self {
        room.0
    }
}

impl fmt::Display for RoomHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
