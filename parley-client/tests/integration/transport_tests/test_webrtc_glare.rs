use parley_client::{NegotiationConfig, NegotiationSession, NegotiationState, PeerTransport};
use parley_core::{MessageKind, RoomId, SdpKind, SignalMessage};
use std::sync::Arc;

use super::create_endpoint;
use crate::integration::init_tracing;
use crate::utils::RecordingSink;

#[tokio::test]
async fn test_rollback_withdraws_local_offer() {
    init_tracing();

    let a = create_endpoint().await;
    let b = create_endpoint().await;
    a.transport.open_data_channel().await.unwrap();
    b.transport.open_data_channel().await.unwrap();

    let offer_a = a.transport.create_offer().await.unwrap();
    a.transport.set_local_description(offer_a.clone()).await.unwrap();
    let offer_b = b.transport.create_offer().await.unwrap();
    b.transport.set_local_description(offer_b).await.unwrap();

    b.transport.rollback().await.unwrap();

    b.transport.set_remote_description(offer_a).await.unwrap();
    let answer = b.transport.create_answer().await.unwrap();
    b.transport.set_local_description(answer.clone()).await.unwrap();
    a.transport.set_remote_description(answer).await.unwrap();

    a.transport.close().await.unwrap();
    b.transport.close().await.unwrap();
}

#[tokio::test]
async fn test_rollback_without_local_offer_is_a_no_op() {
    init_tracing();

    let a = create_endpoint().await;
    a.transport.rollback().await.unwrap();
    a.transport.close().await.unwrap();
}

#[tokio::test]
async fn test_polite_session_answers_colliding_offer() {
    init_tracing();

    let impolite = create_endpoint().await;
    let polite = create_endpoint().await;
    impolite.transport.open_data_channel().await.unwrap();
    polite.transport.open_data_channel().await.unwrap();

    let sink = Arc::new(RecordingSink::new());
    let session = NegotiationSession::new(
        RoomId::from("call:glare"),
        NegotiationConfig::default().polite(true),
        polite.transport.clone(),
        sink.clone(),
    );
    assert!(session.negotiation_needed().await.unwrap());
    assert_eq!(session.state().await, NegotiationState::OfferPending);

    let their_offer = impolite.transport.create_offer().await.unwrap();
    impolite
        .transport
        .set_local_description(their_offer.clone())
        .await
        .unwrap();

    session.handle_remote_description(their_offer).await.unwrap();
    assert_eq!(session.state().await, NegotiationState::Stable);

    let answer = sink
        .sent()
        .await
        .into_iter()
        .filter_map(|m| match m {
            SignalMessage::SessionDescription { description, .. }
                if description.kind == SdpKind::Answer =>
            {
                Some(description)
            }
            _ => None,
        })
        .next()
        .expect("answer sent");
    assert_eq!(sink.count(MessageKind::SessionDescription).await, 2);

    impolite
        .transport
        .set_remote_description(answer)
        .await
        .unwrap();

    session.close(false).await;
    impolite.transport.close().await.unwrap();
}
