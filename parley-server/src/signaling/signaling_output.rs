use async_trait::async_trait;
use parley_core::{ConnectionId, SignalMessage};

/// Outbound side of the relay: how the hub reaches a connection.
///
/// Implementations must not block; delivery is fire-and-forget.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Deliver one frame to one connection. Unknown connections are ignored.
    async fn send(&self, connection_id: ConnectionId, msg: SignalMessage);

    /// Deliver the same frame to several connections.
    async fn send_many(&self, targets: &[ConnectionId], msg: SignalMessage) {
        for target in targets {
            self.send(*target, msg.clone()).await;
        }
    }
}
