use crate::media::MediaHandle;
use crate::peer::peer_worker::spawn_worker;
use crate::peer::{
    ConnectionEvent, NegotiationState, NegotiationStateMachine, PeerConnection, PeerInput,
};
use crate::signaling::SignalSender;
use meshcall_core::ParticipantId;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::warn;

struct PeerLink {
    connection: Arc<dyn PeerConnection>,
    inbox: mpsc::UnboundedSender<PeerInput>,
    worker: JoinHandle<()>,
}

/// Registry-side view of one pairing.
///
/// The pending ICE queue lives with the state machine inside the worker task;
/// the entry keeps the shared state cell, the remote stream and the handles
/// needed to tear everything down.
pub struct PeerConnectionEntry {
    remote_id: ParticipantId,
    state: Arc<watch::Sender<NegotiationState>>,
    remote_stream: Option<MediaHandle>,
    link: Option<PeerLink>,
}

impl PeerConnectionEntry {
    pub(crate) fn new(remote_id: ParticipantId) -> Self {
        Self {
            remote_id,
            state: Arc::new(watch::Sender::new(NegotiationState::Idle)),
            remote_stream: None,
            link: None,
        }
    }

    pub fn remote_id(&self) -> &ParticipantId {
        &self.remote_id
    }

    pub fn state(&self) -> NegotiationState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<NegotiationState> {
        self.state.subscribe()
    }

    pub fn remote_stream(&self) -> Option<&MediaHandle> {
        self.remote_stream.as_ref()
    }

    pub(crate) fn set_remote_stream(&mut self, stream: MediaHandle) {
        self.remote_stream = Some(stream);
    }

    /// True while a connection is attached and not yet torn down.
    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    pub(crate) fn attach(
        &mut self,
        connection: Arc<dyn PeerConnection>,
        signals: SignalSender,
        events: mpsc::Sender<ConnectionEvent>,
    ) {
        let machine = NegotiationStateMachine::new(
            self.remote_id.clone(),
            connection.clone(),
            signals,
            self.state.clone(),
        );
        let (inbox, inbox_rx) = mpsc::unbounded_channel();
        let worker = spawn_worker(machine, inbox_rx, events);

        self.link = Some(PeerLink {
            connection,
            inbox,
            worker,
        });
    }

    /// Queue an input for the worker. Returns false if the pairing no longer accepts input.
    pub(crate) fn dispatch(&self, input: PeerInput) -> bool {
        if self.state() == NegotiationState::Closed {
            return false;
        }
        match &self.link {
            Some(link) => link.inbox.send(input).is_ok(),
            None => false,
        }
    }

    pub(crate) fn mark_closed(&self) {
        self.state.send_replace(NegotiationState::Closed);
    }

    /// Cancels any suspended negotiation step and releases the connection.
    pub(crate) async fn close(&mut self) {
        self.mark_closed();

        let Some(link) = self.link.take() else {
            return;
        };
        link.worker.abort();
        if let Err(e) = link.connection.close().await {
            warn!("Failed to close connection to {}: {:#}", self.remote_id, e);
        }
    }
}
