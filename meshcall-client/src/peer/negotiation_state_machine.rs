use crate::peer::{NegotiationError, NegotiationState, PeerConnection};
use crate::signaling::SignalSender;
use meshcall_core::{IceCandidate, ParticipantId, SdpType, SessionDescription, SignalPayload};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Drives offer/answer/ICE for one remote participant.
///
/// The state cell is shared with the registry entry. Teardown flips it to
/// `Closed` from outside, and every step re-checks it after each await so a
/// continuation that resumes on a closed pairing has no effect.
pub struct NegotiationStateMachine {
    remote_id: ParticipantId,
    connection: Arc<dyn PeerConnection>,
    signals: SignalSender,
    state: Arc<watch::Sender<NegotiationState>>,
    pending_ice_candidates: VecDeque<IceCandidate>,
    remote_description_set: bool,
}

impl NegotiationStateMachine {
    pub fn new(
        remote_id: ParticipantId,
        connection: Arc<dyn PeerConnection>,
        signals: SignalSender,
        state: Arc<watch::Sender<NegotiationState>>,
    ) -> Self {
        Self {
            remote_id,
            connection,
            signals,
            state,
            pending_ice_candidates: VecDeque::new(),
            remote_description_set: false,
        }
    }

    pub fn remote_id(&self) -> &ParticipantId {
        &self.remote_id
    }

    pub fn state(&self) -> NegotiationState {
        *self.state.borrow()
    }

    pub fn pending_ice_candidates(&self) -> &VecDeque<IceCandidate> {
        &self.pending_ice_candidates
    }

    fn is_closed(&self) -> bool {
        self.state() == NegotiationState::Closed
    }

    /// Never resurrects a closed pairing.
    fn transition(&self, to: NegotiationState) {
        let remote_id = &self.remote_id;
        self.state.send_if_modified(|current| {
            if *current == NegotiationState::Closed || *current == to {
                return false;
            }
            debug!("Pairing {}: {} -> {}", remote_id, current, to);
            *current = to;
            true
        });
    }

    /// Local trigger for `Idle -> OfferSent`.
    pub async fn start_offer(&mut self) -> Result<(), NegotiationError> {
        if self.state() != NegotiationState::Idle {
            warn!(
                "Not offering to {}: pairing is {}",
                self.remote_id,
                self.state()
            );
            return Ok(());
        }

        let offer = self
            .connection
            .create_offer()
            .await
            .map_err(NegotiationError::local("offer"))?;
        if self.is_closed() {
            return Ok(());
        }

        self.connection
            .set_local_description(offer.clone())
            .await
            .map_err(NegotiationError::local("local offer description"))?;
        if self.is_closed() {
            return Ok(());
        }

        self.transition(NegotiationState::OfferSent);
        info!("Sending offer to {}", self.remote_id);
        self.signals
            .send(&self.remote_id, &SignalPayload::Sdp { sdp: offer })
            .await;
        Ok(())
    }

    pub async fn handle(&mut self, payload: SignalPayload) -> Result<(), NegotiationError> {
        if self.is_closed() {
            debug!("Pairing {} closed, dropping {} signal", self.remote_id, payload.kind());
            return Ok(());
        }

        match payload {
            SignalPayload::Sdp { sdp } => match sdp.sdp_type {
                SdpType::Offer => self.accept_offer(sdp).await,
                SdpType::Answer => self.accept_answer(sdp).await,
            },
            SignalPayload::Ice { ice } => {
                self.accept_candidate(ice).await;
                Ok(())
            }
        }
    }

    async fn accept_offer(&mut self, offer: SessionDescription) -> Result<(), NegotiationError> {
        match self.state() {
            NegotiationState::Idle | NegotiationState::OfferSent => {}
            other => {
                warn!("Ignoring offer from {} while {}", self.remote_id, other);
                return Ok(());
            }
        }

        info!("Received offer from {}", self.remote_id);
        self.connection
            .set_remote_description(offer)
            .await
            .map_err(NegotiationError::NegotiationRejected)?;
        if self.is_closed() {
            return Ok(());
        }
        self.remote_description_set = true;

        let drained = self.drain_pending_candidates().await;
        if self.is_closed() {
            return Ok(());
        }

        let answer = self
            .connection
            .create_answer()
            .await
            .map_err(NegotiationError::local("answer"))?;
        if self.is_closed() {
            return Ok(());
        }

        self.connection
            .set_local_description(answer.clone())
            .await
            .map_err(NegotiationError::local("local answer description"))?;
        if self.is_closed() {
            return Ok(());
        }

        // Candidates that raced ahead count the same as ones arriving after the answer.
        self.transition(if drained > 0 {
            NegotiationState::Connected
        } else {
            NegotiationState::AnswerPending
        });

        info!("Sending answer to {}", self.remote_id);
        self.signals
            .send(&self.remote_id, &SignalPayload::Sdp { sdp: answer })
            .await;
        Ok(())
    }

    async fn accept_answer(&mut self, answer: SessionDescription) -> Result<(), NegotiationError> {
        if self.state() != NegotiationState::OfferSent {
            warn!(
                "Ignoring stale answer from {} while {}",
                self.remote_id,
                self.state()
            );
            return Ok(());
        }

        info!("Received answer from {}", self.remote_id);
        self.connection
            .set_remote_description(answer)
            .await
            .map_err(NegotiationError::NegotiationRejected)?;
        if self.is_closed() {
            return Ok(());
        }
        self.remote_description_set = true;

        self.drain_pending_candidates().await;
        self.transition(NegotiationState::Connected);
        Ok(())
    }

    async fn accept_candidate(&mut self, candidate: IceCandidate) {
        if !self.remote_description_set {
            debug!(
                "Queueing ICE candidate from {} until its description arrives",
                self.remote_id
            );
            self.pending_ice_candidates.push_back(candidate);
            return;
        }

        if self.add_candidate(candidate).await && self.state() == NegotiationState::AnswerPending {
            self.transition(NegotiationState::Connected);
        }
    }

    /// Applies queued candidates in arrival order. Returns how many were accepted.
    async fn drain_pending_candidates(&mut self) -> usize {
        let mut applied = 0;
        while let Some(candidate) = self.pending_ice_candidates.pop_front() {
            if self.is_closed() {
                self.pending_ice_candidates.clear();
                break;
            }
            if self.add_candidate(candidate).await {
                applied += 1;
            }
        }
        applied
    }

    async fn add_candidate(&self, candidate: IceCandidate) -> bool {
        match self.connection.add_ice_candidate(candidate).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to add ICE candidate from {}: {:#}", self.remote_id, e);
                false
            }
        }
    }

    /// Terminal. Queued candidates are discarded; the registry entry owns the
    /// connection and releases it.
    pub fn abandon(&mut self) {
        self.state.send_replace(NegotiationState::Closed);
        self.pending_ice_candidates.clear();
    }
}
