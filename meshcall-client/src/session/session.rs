use crate::media::{LocalMediaSource, TrackKind};
use crate::peer::{ConnectionEvent, ConnectionFactory, PeerInput};
use crate::room::RoomMembershipTracker;
use crate::session::{SessionCommand, SessionConfig, SessionEvent, SessionHandle};
use crate::signaling::{ChannelEvent, SignalingChannelAdapter, SignalingTransport};
use meshcall_core::{ParticipantId, RoomHandle, ServerFrame, SignalPayload, SignalingMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 32;
const CONNECTION_EVENT_BUFFER: usize = 256;

/// One participant's view of a call.
///
/// Owns the signaling adapter and the membership tracker; everything that
/// touches the registry runs inside [`Session::run`], one event at a time.
pub struct Session {
    config: SessionConfig,
    adapter: SignalingChannelAdapter,
    tracker: RoomMembershipTracker,
    local_media: LocalMediaSource,
    room: Option<RoomHandle>,
    frames: mpsc::Receiver<ServerFrame>,
    commands: mpsc::Receiver<SessionCommand>,
    connection_events: mpsc::Receiver<ConnectionEvent>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn SignalingTransport>,
        frames: mpsc::Receiver<ServerFrame>,
        factory: Arc<dyn ConnectionFactory>,
        local_media: LocalMediaSource,
    ) -> (Self, SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (connection_tx, connection_rx) = mpsc::channel(CONNECTION_EVENT_BUFFER);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let adapter = SignalingChannelAdapter::new(transport);
        let tracker = RoomMembershipTracker::new(
            factory,
            adapter.sender(),
            local_media.handle().clone(),
            connection_tx,
            event_tx.clone(),
        );

        let session = Self {
            config,
            adapter,
            tracker,
            local_media,
            room: None,
            frames,
            commands: command_rx,
            connection_events: connection_rx,
            events: event_tx,
        };

        (session, SessionHandle::new(command_tx), event_rx)
    }

    pub fn local_id(&self) -> Option<&ParticipantId> {
        self.adapter.local_id()
    }

    pub fn room(&self) -> Option<&RoomHandle> {
        self.room.as_ref()
    }

    pub fn tracker(&self) -> &RoomMembershipTracker {
        &self.tracker
    }

    pub fn adapter_mut(&mut self) -> &mut SignalingChannelAdapter {
        &mut self.adapter
    }

    pub async fn run(mut self) {
        info!("Session started as {}", self.config.display_name);

        loop {
            tokio::select! {
                frame = self.frames.recv() => {
                    match frame {
                        Some(frame) => self.handle_frame(frame).await,
                        None => {
                            warn!("Signaling channel closed");
                            break;
                        }
                    }
                }

                command = self.commands.recv() => {
                    match command {
                        Some(SessionCommand::Leave) | None => break,
                        Some(command) => self.handle_command(command).await,
                    }
                }

                Some(event) = self.connection_events.recv() => {
                    self.handle_connection_event(event).await;
                }
            }
        }

        self.leave().await;
    }

    pub async fn handle_frame(&mut self, frame: ServerFrame) {
        let Some(event) = self.adapter.accept(frame) else {
            return;
        };

        match event {
            ChannelEvent::Connected(id) => {
                info!("Connected to signaling server as {}", id);
                self.emit(SessionEvent::Connected(id));
            }
            ChannelEvent::RoomJoined(room) => {
                info!("Joined room {}", room);
                self.room = Some(room.clone());
                self.emit(SessionEvent::RoomJoined(room));
            }
            ChannelEvent::Membership(membership) => self.tracker.apply(membership).await,
            ChannelEvent::Signal(message) => self.route_signal(message),
            ChannelEvent::Malformed { sender_id, error } => {
                self.tracker
                    .fail_pairing(&sender_id, error.to_string())
                    .await;
            }
            ChannelEvent::Chat(chat) => self.emit(SessionEvent::Chat(chat)),
        }
    }

    fn route_signal(&self, message: SignalingMessage) {
        let Some(local_id) = self.adapter.local_id() else {
            return;
        };
        if !message.is_deliverable_to(local_id) {
            debug!(
                "Signal for {} is not addressed to us, dropping",
                message.recipient_id
            );
            return;
        }

        let SignalingMessage {
            sender_id, payload, ..
        } = message;
        let kind = payload.kind();

        if !self.tracker.registry().contains(&sender_id) {
            warn!("{} signal from unknown participant {}, dropping", kind, sender_id);
            return;
        }
        if !self
            .tracker
            .dispatch(&sender_id, PeerInput::Signal(payload))
        {
            debug!("Pairing with {} is closed, dropping {} signal", sender_id, kind);
        }
    }

    async fn handle_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::CandidateGenerated(remote_id, candidate) => {
                let open = self
                    .tracker
                    .registry()
                    .get(&remote_id)
                    .is_some_and(|entry| entry.is_open());
                if !open {
                    return;
                }
                self.adapter
                    .send(&remote_id, &SignalPayload::Ice { ice: candidate })
                    .await;
            }
            ConnectionEvent::RemoteStream(remote_id, stream) => {
                let Some(entry) = self.tracker.registry_mut().get_mut(&remote_id) else {
                    return;
                };
                entry.set_remote_stream(stream.clone());
                self.emit(SessionEvent::RemoteStream {
                    id: remote_id,
                    stream,
                });
            }
            ConnectionEvent::Failed(remote_id, reason) => {
                self.tracker.fail_pairing(&remote_id, reason).await;
            }
        }
    }

    pub async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Join(room) => {
                if self.room.as_ref() == Some(&room) {
                    debug!("Already in {}, ignoring join", room);
                    return;
                }
                if let Some(previous) = self.room.take() {
                    info!("Leaving {} for {}", previous, room);
                    for remote_id in self.tracker.clear().await {
                        self.emit(SessionEvent::ParticipantLeft(remote_id));
                    }
                }
                if let Err(e) = self.adapter.join(room.clone()).await {
                    warn!("Failed to join {}: {}", room, e);
                }
            }
            SessionCommand::SendChat(text) => {
                let sender = self.config.display_name.clone();
                if let Err(e) = self.adapter.send_chat(text, sender).await {
                    warn!("Failed to send chat message: {}", e);
                }
            }
            SessionCommand::SetAudioEnabled(enabled) => {
                self.local_media
                    .handle()
                    .set_enabled(TrackKind::Audio, enabled);
            }
            SessionCommand::SetVideoEnabled(enabled) => {
                self.local_media
                    .handle()
                    .set_enabled(TrackKind::Video, enabled);
            }
            SessionCommand::Leave => self.leave().await,
        }
    }

    /// Closes every pairing and stops local capture.
    pub async fn leave(&mut self) {
        info!("Leaving call");
        self.tracker.clear().await;
        self.local_media.handle().stop();
        self.room = None;
        self.emit(SessionEvent::Ended);
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
