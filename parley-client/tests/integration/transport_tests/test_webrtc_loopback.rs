use bytes::Bytes;
use parley_client::{PeerTransport, TransportEvent};
use parley_core::{ChunkFrame, SdpKind};

use super::{create_endpoint, pump_events, wait_for};
use crate::integration::init_tracing;

#[tokio::test]
async fn test_offer_answer_opens_channel_and_delivers_chunks() {
    init_tracing();

    let a = create_endpoint().await;
    let b = create_endpoint().await;

    a.transport.open_data_channel().await.unwrap();

    let offer = a.transport.create_offer().await.unwrap();
    assert_eq!(offer.kind, SdpKind::Offer);
    a.transport.set_local_description(offer.clone()).await.unwrap();
    b.transport.set_remote_description(offer).await.unwrap();

    let answer = b.transport.create_answer().await.unwrap();
    assert_eq!(answer.kind, SdpKind::Answer);
    b.transport.set_local_description(answer.clone()).await.unwrap();
    a.transport.set_remote_description(answer).await.unwrap();

    // Both sides hold a remote description now, so candidates can be applied directly.
    let mut a_events = pump_events(a.events, b.transport.clone());
    let mut b_events = pump_events(b.events, a.transport.clone());

    wait_for(&mut a_events, |e| {
        matches!(e, TransportEvent::DataChannelOpen).then_some(())
    })
    .await;
    wait_for(&mut b_events, |e| {
        matches!(e, TransportEvent::DataChannelOpen).then_some(())
    })
    .await;

    let chunks: Vec<ChunkFrame> = (0..3u32)
        .map(|seq| ChunkFrame::new(seq, vec![seq as u8 + 1; 1_000 + seq as usize]))
        .collect();
    for chunk in &chunks {
        a.transport
            .send_data(Bytes::from(chunk.encode().unwrap()))
            .await
            .unwrap();
    }

    let mut received = Vec::new();
    while received.len() < chunks.len() {
        let bytes = wait_for(&mut b_events, |e| match e {
            TransportEvent::Message(bytes) => Some(bytes),
            _ => None,
        })
        .await;
        received.push(ChunkFrame::decode(&bytes).unwrap());
    }
    // The channel is unordered.
    received.sort_by_key(|frame| frame.seq);
    assert_eq!(received, chunks);

    a.transport.close().await.unwrap();
    b.transport.close().await.unwrap();
}

#[tokio::test]
async fn test_send_before_channel_exists_fails() {
    init_tracing();

    let a = create_endpoint().await;
    assert!(a.transport.send_data(Bytes::from_static(b"x")).await.is_err());
    a.transport.close().await.unwrap();
}
