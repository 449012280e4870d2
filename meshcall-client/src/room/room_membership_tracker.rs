use crate::media::MediaHandle;
use crate::peer::{
    ConnectionEvent, ConnectionFactory, PeerConnectionRegistry, PeerInput,
};
use crate::session::SessionEvent;
use crate::signaling::{MembershipEvent, SignalSender};
use meshcall_core::ParticipantId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Turns membership changes into registry entries.
///
/// The participant that joins is always the one that offers: members from the
/// join snapshot get an offer straight away, later arrivals wait passively for
/// theirs. This keeps two sides from offering to each other at once.
pub struct RoomMembershipTracker {
    registry: PeerConnectionRegistry,
    factory: Arc<dyn ConnectionFactory>,
    signals: SignalSender,
    local_media: MediaHandle,
    connection_events: mpsc::Sender<ConnectionEvent>,
    session_events: mpsc::UnboundedSender<SessionEvent>,
}

impl RoomMembershipTracker {
    pub fn new(
        factory: Arc<dyn ConnectionFactory>,
        signals: SignalSender,
        local_media: MediaHandle,
        connection_events: mpsc::Sender<ConnectionEvent>,
        session_events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            registry: PeerConnectionRegistry::new(),
            factory,
            signals,
            local_media,
            connection_events,
            session_events,
        }
    }

    pub fn registry(&self) -> &PeerConnectionRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut PeerConnectionRegistry {
        &mut self.registry
    }

    pub async fn apply(&mut self, event: MembershipEvent) {
        match event {
            MembershipEvent::Snapshot(members) => self.on_snapshot(members).await,
            MembershipEvent::Joined(remote_id) => self.on_joined(remote_id).await,
            MembershipEvent::Left(remote_id) => self.on_left(&remote_id).await,
        }
    }

    /// Members present when we joined, in delivered order. We offer to each.
    pub async fn on_snapshot(&mut self, members: Vec<ParticipantId>) {
        info!("Joined room with {} existing member(s)", members.len());

        for remote_id in members {
            if self.registry.contains(&remote_id) {
                debug!("Already tracking {}, skipping", remote_id);
                continue;
            }
            if self.open_entry(remote_id.clone()).await {
                self.dispatch(&remote_id, PeerInput::StartOffer);
            }
        }
    }

    /// A newcomer will offer to us; we only prepare the entry.
    pub async fn on_joined(&mut self, remote_id: ParticipantId) {
        if self.registry.contains(&remote_id) {
            debug!("Duplicate join for {}, ignoring", remote_id);
            return;
        }
        info!("Participant {} joined", remote_id);
        self.open_entry(remote_id).await;
    }

    pub async fn on_left(&mut self, remote_id: &ParticipantId) {
        let Some(mut entry) = self.registry.remove(remote_id) else {
            debug!("Leave for unknown participant {}, ignoring", remote_id);
            return;
        };

        info!("Participant {} left", remote_id);
        entry.close().await;
        let _ = self
            .session_events
            .send(SessionEvent::ParticipantLeft(remote_id.clone()));
    }

    /// Close one pairing but keep its entry until the participant actually leaves.
    pub async fn fail_pairing(&mut self, remote_id: &ParticipantId, reason: String) {
        let Some(entry) = self.registry.get_mut(remote_id) else {
            return;
        };
        if !entry.is_open() {
            return;
        }

        entry.close().await;
        let _ = self.session_events.send(SessionEvent::PairingFailed {
            id: remote_id.clone(),
            reason,
        });
    }

    /// Room leave: every pairing is closed and forgotten. Returns the ids that were dropped.
    pub async fn clear(&mut self) -> Vec<ParticipantId> {
        let mut dropped = Vec::new();
        for mut entry in self.registry.drain() {
            entry.close().await;
            dropped.push(entry.remote_id().clone());
        }
        dropped
    }

    pub(crate) fn dispatch(&self, remote_id: &ParticipantId, input: PeerInput) -> bool {
        match self.registry.get(remote_id) {
            Some(entry) => entry.dispatch(input),
            None => false,
        }
    }

    async fn open_entry(&mut self, remote_id: ParticipantId) -> bool {
        let entry = match self.registry.create(remote_id.clone()) {
            Ok(entry) => entry,
            Err(e) => {
                error!("{}", e);
                debug_assert!(false, "{}", e);
                return false;
            }
        };

        let _ = self
            .session_events
            .send(SessionEvent::ParticipantJoined(remote_id.clone()));

        let created = self
            .factory
            .create(
                remote_id.clone(),
                self.local_media.clone(),
                self.connection_events.clone(),
            )
            .await;

        match created {
            Ok(connection) => {
                entry.attach(
                    connection,
                    self.signals.clone(),
                    self.connection_events.clone(),
                );
                true
            }
            Err(e) => {
                error!("Failed to create connection for {}: {:#}", remote_id, e);
                entry.mark_closed();
                let _ = self.session_events.send(SessionEvent::PairingFailed {
                    id: remote_id,
                    reason: format!("{:#}", e),
                });
                false
            }
        }
    }
}
