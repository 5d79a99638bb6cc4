use anyhow::{Context, Result};
use parley_core::{ConnectionId, RoomId, SignalMessage};
use parley_server::HubHandle;

/// Timeout for a single frame over a real WebSocket (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 5000;

/// Registers `id` under `name` and waits until the hub has processed it.
pub async fn connect(hub: &HubHandle, id: ConnectionId, name: &str) -> Result<()> {
    hub.connect(id, Some(name.to_owned()))
        .await
        .context("Failed to send Connect")?;
    settle(hub).await
}

pub async fn join(hub: &HubHandle, id: ConnectionId, room: &str) -> Result<()> {
    hub.inbound(
        id,
        SignalMessage::JoinRoom {
            room: RoomId::from(room),
        },
    )
    .await
    .context("Failed to send JoinRoom")?;
    settle(hub).await
}

pub async fn send(hub: &HubHandle, id: ConnectionId, message: SignalMessage) -> Result<()> {
    hub.inbound(id, message)
        .await
        .context("Failed to send inbound message")?;
    settle(hub).await
}

/// Everything sent before this call has been handled once it returns.
pub async fn settle(hub: &HubHandle) -> Result<()> {
    hub.stats().await.map(|_| ())
}

pub fn chat(name: &str, text: &str, room: &str) -> SignalMessage {
    SignalMessage::ChatMessage {
        name: name.to_owned(),
        text: text.to_owned(),
        room: RoomId::from(room),
    }
}
