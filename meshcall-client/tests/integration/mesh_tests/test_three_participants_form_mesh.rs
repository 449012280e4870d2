use meshcall_client::SessionEvent;
use meshcall_core::SdpType;

use crate::integration::init_tracing;
use crate::utils::{Call, MockRelay, TestParticipant, candidate_of, eventually};

/// Asserts one completed pairing: `late` offered, `early` answered, candidates crossed.
async fn assert_paired(early: &TestParticipant, late: &TestParticipant) {
    let offerer = late.connection_to(&early.id).await;
    let answerer = early.connection_to(&late.id).await;

    let early_candidate = Call::AddIce(candidate_of(&early.id));
    let late_candidate = Call::AddIce(candidate_of(&late.id));

    eventually("offerer to apply answer and candidate", || {
        offerer.has(&Call::SetRemote(SdpType::Answer)) && offerer.has(&early_candidate)
    })
    .await;
    eventually("answerer to answer and apply candidate", || {
        answerer.has(&Call::CreateAnswer) && answerer.has(&late_candidate)
    })
    .await;

    assert!(!offerer.has(&Call::CreateAnswer));
    assert!(!answerer.has(&Call::CreateOffer));

    // Remote candidates are only applied once a remote description exists.
    for conn in [&offerer, &answerer] {
        let calls = conn.calls();
        let remote_at = calls
            .iter()
            .position(|c| matches!(c, Call::SetRemote(_)))
            .unwrap();
        let first_ice = calls
            .iter()
            .position(|c| matches!(c, Call::AddIce(_)))
            .unwrap();
        assert!(remote_at < first_ice);
    }
}

#[tokio::test]
async fn test_three_participants_form_mesh() {
    init_tracing();
    let relay = MockRelay::new();

    let mut alice = TestParticipant::join(&relay, "alice").await;
    let mut bob = TestParticipant::join(&relay, "bob").await;
    let carol = TestParticipant::join(&relay, "carol").await;

    assert_paired(&alice, &bob).await;
    assert_paired(&alice, &carol).await;
    assert_paired(&bob, &carol).await;

    let bob_id = bob.id.clone();
    alice
        .wait_for_event(|e| matches!(e, SessionEvent::ParticipantJoined(id) if id == &bob_id))
        .await;
    let carol_id = carol.id.clone();
    bob.wait_for_event(|e| matches!(e, SessionEvent::ParticipantJoined(id) if id == &carol_id))
        .await;

    // Nobody pairs with themselves.
    for p in [&alice, &bob, &carol] {
        assert!(p.factory.connection(&p.id).is_none());
    }
}
