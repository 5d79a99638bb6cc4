use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use parley_core::{ConnectionId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

struct SignalingInner {
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
}

/// Per-connection WebSocket sinks, shared by the socket tasks and the hub.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
        }
    }

    pub fn add_peer(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(connection_id, tx);
    }

    pub fn remove_peer(&self, connection_id: &ConnectionId) {
        self.inner.peers.remove(connection_id);
    }

    fn send_text(&self, connection_id: ConnectionId, json: &str) {
        let Some(peer) = self.inner.peers.get(&connection_id) else {
            debug!(
                "Attempted to send signal to disconnected connection {:?}",
                connection_id
            );
            return;
        };
        if let Err(e) = peer.send(Message::Text(json.to_owned().into())) {
            error!("Failed to send WS message to {:?}: {:?}", connection_id, e);
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send(&self, connection_id: ConnectionId, msg: SignalMessage) {
        match msg.to_json() {
            Ok(json) => self.send_text(connection_id, &json),
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }

    async fn send_many(&self, targets: &[ConnectionId], msg: SignalMessage) {
        let json = match msg.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize signal message: {}", e);
                return;
            }
        };
        for target in targets {
            self.send_text(*target, &json);
        }
    }
}
