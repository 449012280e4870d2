use meshcall_client::SessionEvent;
use meshcall_core::{SdpType, ServerFrame};

use crate::integration::init_tracing;
use crate::utils::{Call, MockRelay, TestParticipant, eventually};

#[tokio::test]
async fn test_malformed_signal_is_isolated() {
    init_tracing();
    let relay = MockRelay::new();

    let mut alice = TestParticipant::join(&relay, "alice").await;
    let bob = TestParticipant::join(&relay, "bob").await;
    let carol = TestParticipant::join(&relay, "carol").await;

    let alice_to_bob = alice.connection_to(&bob.id).await;
    let alice_to_carol = alice.connection_to(&carol.id).await;
    eventually("alice to answer carol", || {
        alice_to_carol.has(&Call::SetLocal(SdpType::Answer))
    })
    .await;

    relay.inject(
        &alice.id,
        ServerFrame::Signal {
            from: bob.id.clone(),
            message: r#"{"kind":"sdp","sdp":{"type":"pranswer"}}"#.to_owned(),
        },
    );

    let bob_id = bob.id.clone();
    alice
        .wait_for_event(|e| matches!(e, SessionEvent::PairingFailed { id, .. } if id == &bob_id))
        .await;

    assert!(alice_to_bob.is_closed());
    assert!(!alice_to_carol.is_closed());

    // Later signals from bob are dropped without reopening the pairing.
    let calls_before = alice_to_bob.calls().len();
    relay.inject(
        &alice.id,
        ServerFrame::Signal {
            from: bob.id.clone(),
            message: r#"{"kind":"ice","ice":{"candidate":"candidate:late"}}"#.to_owned(),
        },
    );
    alice.handle.send_chat("still here").await.unwrap();
    alice
        .wait_for_event(|e| matches!(e, SessionEvent::Chat(_)))
        .await;
    assert_eq!(alice_to_bob.calls().len(), calls_before);
}
