use parley_core::{ConnectionId, SignalMessage};
use serde::Serialize;
use tokio::sync::oneshot;

/// Everything that mutates relay state goes through the hub as one of these.
#[derive(Debug)]
pub enum HubCommand {
    /// A socket was upgraded; its outbound sink is already registered.
    Connect {
        connection_id: ConnectionId,
        display_name: Option<String>,
    },

    /// A decoded frame from a connected client.
    Inbound {
        connection_id: ConnectionId,
        message: SignalMessage,
    },

    /// The socket is gone.
    Disconnect { connection_id: ConnectionId },

    Stats { reply: oneshot::Sender<HubStats> },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub connections: usize,
    pub rooms: usize,
}
