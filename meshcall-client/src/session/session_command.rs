use meshcall_core::RoomHandle;
use thiserror::Error;
use tokio::sync::mpsc;

/// Local user actions fed into the session loop.
#[derive(Debug)]
pub enum SessionCommand {
    Join(RoomHandle),
    SendChat(String),
    SetAudioEnabled(bool),
    SetVideoEnabled(bool),
    /// Local call termination.
    Leave,
}

#[derive(Debug, Error)]
#[error("session has ended")]
pub struct SessionClosed;

#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { tx }
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionClosed> {
        self.tx.send(cmd).await.map_err(|_| SessionClosed)
    }

    pub async fn join(&self, room: RoomHandle) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Join(room)).await
    }

    pub async fn send_chat(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(SessionCommand::SendChat(text.into())).await
    }

    pub async fn set_audio_enabled(&self, enabled: bool) -> Result<(), SessionClosed> {
        self.send(SessionCommand::SetAudioEnabled(enabled)).await
    }

    pub async fn set_video_enabled(&self, enabled: bool) -> Result<(), SessionClosed> {
        self.send(SessionCommand::SetVideoEnabled(enabled)).await
    }

    pub async fn leave(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Leave).await
    }
}
