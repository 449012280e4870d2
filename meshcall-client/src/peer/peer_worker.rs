use crate::peer::{ConnectionEvent, NegotiationState, NegotiationStateMachine};
use meshcall_core::SignalPayload;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

#[derive(Debug)]
pub enum PeerInput {
    StartOffer,
    Signal(SignalPayload),
}

/// Inputs for one pairing are applied strictly in arrival order; different
/// pairings run in separate tasks and interleave at their suspension points.
pub(crate) fn spawn_worker(
    machine: NegotiationStateMachine,
    inbox: mpsc::UnboundedReceiver<PeerInput>,
    events: mpsc::Sender<ConnectionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(run(machine, inbox, events))
}

async fn run(
    mut machine: NegotiationStateMachine,
    mut inbox: mpsc::UnboundedReceiver<PeerInput>,
    events: mpsc::Sender<ConnectionEvent>,
) {
    while let Some(input) = inbox.recv().await {
        let result = match input {
            PeerInput::StartOffer => machine.start_offer().await,
            PeerInput::Signal(payload) => machine.handle(payload).await,
        };

        if let Err(e) = result {
            let remote_id = machine.remote_id().clone();
            error!("Negotiation with {} failed: {}", remote_id, e);
            // The session tears the connection down when it sees `Failed`.
            machine.abandon();
            let _ = events
                .send(ConnectionEvent::Failed(remote_id, e.to_string()))
                .await;
            break;
        }

        if machine.state() == NegotiationState::Closed {
            break;
        }
    }

    debug!("Negotiation worker for {} finished", machine.remote_id());
}
