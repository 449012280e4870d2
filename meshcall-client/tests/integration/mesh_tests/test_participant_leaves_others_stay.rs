use meshcall_client::SessionEvent;
use meshcall_core::SdpType;

use crate::integration::init_tracing;
use crate::utils::{Call, MockRelay, TestParticipant, eventually};

#[tokio::test]
async fn test_participant_leaves_others_stay() {
    init_tracing();
    let relay = MockRelay::new();

    let mut alice = TestParticipant::join(&relay, "alice").await;
    let mut bob = TestParticipant::join(&relay, "bob").await;
    let carol = TestParticipant::join(&relay, "carol").await;

    let bob_to_alice = bob.connection_to(&alice.id).await;
    eventually("bob and alice to pair", || {
        bob_to_alice.has(&Call::SetRemote(SdpType::Answer))
    })
    .await;
    let alice_to_carol = alice.connection_to(&carol.id).await;
    let bob_to_carol = bob.connection_to(&carol.id).await;

    relay.disconnect(&carol.id);

    let carol_id = carol.id.clone();
    for p in [&mut alice, &mut bob] {
        p.wait_for_event(|e| matches!(e, SessionEvent::ParticipantLeft(id) if id == &carol_id))
            .await;
    }

    assert!(alice_to_carol.is_closed());
    assert!(bob_to_carol.is_closed());
    assert!(!bob_to_alice.is_closed());
    assert!(!alice.connection_to(&bob.id).await.is_closed());
}
