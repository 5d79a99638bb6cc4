use parley_client::{NegotiationConfig, NegotiationState};
use parley_core::{IceCandidate, MessageKind, SdpKind, SessionDescription, SignalMessage};

use crate::integration::{create_test_session, init_tracing};

fn candidate(name: &str) -> IceCandidate {
    IceCandidate {
        candidate: name.to_owned(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
    }
}

#[tokio::test]
async fn test_remote_offer_is_answered() {
    init_tracing();

    let t = create_test_session(NegotiationConfig::default());

    t.session
        .handle_remote_description(SessionDescription::offer("remote-offer"))
        .await
        .unwrap();

    assert_eq!(
        t.transport.calls().await,
        vec![
            "set-remote:remote-offer",
            "create-answer",
            "set-local:answer-1"
        ]
    );
    let sent = t.sink.sent().await;
    assert!(matches!(
        &sent[..],
        [SignalMessage::SessionDescription { description, .. }] if description.kind == SdpKind::Answer
    ));
    assert_eq!(t.session.state().await, NegotiationState::Stable);
}

#[tokio::test]
async fn test_answer_completes_pending_offer() {
    init_tracing();

    let t = create_test_session(NegotiationConfig::default());
    t.session.negotiation_needed().await.unwrap();

    t.session
        .handle_remote_description(SessionDescription::answer("remote-answer"))
        .await
        .unwrap();

    assert_eq!(t.session.state().await, NegotiationState::Stable);
    assert_eq!(
        t.session.remote_description().await,
        Some(SessionDescription::answer("remote-answer"))
    );
    // Only the offer went out; an answer is applied, never answered.
    assert_eq!(t.sink.count(MessageKind::SessionDescription).await, 1);
}

#[tokio::test]
async fn test_stray_answer_is_ignored() {
    init_tracing();

    let t = create_test_session(NegotiationConfig::default());

    t.session
        .handle_remote_description(SessionDescription::answer("stray"))
        .await
        .unwrap();

    assert!(t.transport.calls().await.is_empty());
    assert_eq!(t.session.state().await, NegotiationState::Idle);
}

#[tokio::test]
async fn test_early_candidates_are_buffered_then_flushed_in_order() {
    init_tracing();

    let t = create_test_session(NegotiationConfig::default());

    t.session.handle_remote_candidate(candidate("c1")).await.unwrap();
    t.session.handle_remote_candidate(candidate("c2")).await.unwrap();
    assert_eq!(t.session.buffered_candidates().await, 2);
    assert!(t.transport.calls().await.is_empty());

    t.session
        .handle_remote_description(SessionDescription::offer("remote-offer"))
        .await
        .unwrap();
    t.session.handle_remote_candidate(candidate("c3")).await.unwrap();

    assert_eq!(t.session.buffered_candidates().await, 0);
    assert_eq!(
        t.transport.calls().await,
        vec![
            "set-remote:remote-offer",
            "candidate:c1",
            "candidate:c2",
            "create-answer",
            "set-local:answer-1",
            "candidate:c3",
        ]
    );
}

#[tokio::test]
async fn test_local_candidates_are_forwarded_to_room() {
    init_tracing();

    let t = create_test_session(NegotiationConfig::default());

    t.session
        .send_local_candidate(candidate("local"))
        .await
        .unwrap();

    let sent = t.sink.sent().await;
    assert!(matches!(
        &sent[..],
        [SignalMessage::ConnectivityCandidate { candidate, room }]
            if candidate.candidate == "local" && room.as_str() == "call:test"
    ));
}
