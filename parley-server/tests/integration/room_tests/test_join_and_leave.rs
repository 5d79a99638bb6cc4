use parley_core::{ConnectionId, MessageKind, RoomId, SignalMessage};
use parley_server::{Delivery, DispatchTable, ServerConfig};

use crate::integration::{create_test_hub, create_test_hub_with, init_tracing};
use crate::utils::{chat, connect, join, send};

#[tokio::test]
async fn test_join_notifies_all_members_including_joiner() {
    init_tracing();

    let (hub, signaling, _rx) = create_test_hub();
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    connect(&hub, a, "a").await.unwrap();
    connect(&hub, b, "b").await.unwrap();

    join(&hub, a, "lobby").await.unwrap();
    signaling.clear().await;
    join(&hub, b, "lobby").await.unwrap();

    let expected = SignalMessage::MemberJoined {
        room: RoomId::from("lobby"),
        connection_id: b,
    };
    assert_eq!(signaling.messages_for(a).await, vec![expected.clone()]);
    assert_eq!(signaling.messages_for(b).await, vec![expected]);
}

#[tokio::test]
async fn test_joining_twice_is_idempotent() {
    init_tracing();

    let (hub, signaling, _rx) = create_test_hub();
    let a = ConnectionId::new();
    connect(&hub, a, "a").await.unwrap();

    join(&hub, a, "lobby").await.unwrap();
    join(&hub, a, "lobby").await.unwrap();

    assert_eq!(
        signaling.of_kind_for(a, MessageKind::MemberJoined).await.len(),
        1
    );
    send(&hub, a, chat("a", "once", "lobby")).await.unwrap();
    assert_eq!(
        signaling.of_kind_for(a, MessageKind::ChatMessage).await.len(),
        1
    );
}

#[tokio::test]
async fn test_leave_stops_delivery_and_discards_empty_room() {
    init_tracing();

    let (hub, signaling, _rx) = create_test_hub();
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    connect(&hub, a, "a").await.unwrap();
    connect(&hub, b, "b").await.unwrap();
    join(&hub, a, "lobby").await.unwrap();
    join(&hub, b, "lobby").await.unwrap();

    send(&hub, b, SignalMessage::LeaveRoom { room: RoomId::from("lobby") })
        .await
        .unwrap();
    signaling.clear().await;
    send(&hub, a, chat("a", "still here?", "lobby")).await.unwrap();

    assert!(signaling.messages_for(b).await.is_empty());

    send(&hub, a, SignalMessage::LeaveRoom { room: RoomId::from("lobby") })
        .await
        .unwrap();
    assert_eq!(hub.stats().await.unwrap().rooms, 0);
}

#[tokio::test]
async fn test_join_notice_can_be_disabled() {
    init_tracing();

    let config = ServerConfig {
        dispatch: DispatchTable::default().with_join_notice(None),
        ..ServerConfig::default()
    };
    let (hub, signaling, _rx) = create_test_hub_with(config);
    let a = ConnectionId::new();
    connect(&hub, a, "a").await.unwrap();
    join(&hub, a, "quiet").await.unwrap();

    assert!(
        signaling
            .of_kind_for(a, MessageKind::MemberJoined)
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_join_notice_excluding_joiner() {
    init_tracing();

    let config = ServerConfig {
        dispatch: DispatchTable::default().with_join_notice(Some(Delivery::ExcludeSender)),
        ..ServerConfig::default()
    };
    let (hub, signaling, _rx) = create_test_hub_with(config);
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    connect(&hub, a, "a").await.unwrap();
    connect(&hub, b, "b").await.unwrap();
    join(&hub, a, "lobby").await.unwrap();
    join(&hub, b, "lobby").await.unwrap();

    assert_eq!(
        signaling.recipients_of(MessageKind::MemberJoined).await,
        vec![a]
    );
}
