use async_trait::async_trait;
use parley_core::{ConnectionId, MessageKind, SignalMessage};
use parley_server::SignalingOutput;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// One frame the hub handed to the signaling layer.
#[derive(Debug, Clone)]
pub struct SentSignal {
    pub to: ConnectionId,
    pub message: SignalMessage,
}

/// Mock SignalingOutput that captures all outgoing signals.
#[derive(Clone)]
pub struct MockSignalingOutput {
    tx: mpsc::UnboundedSender<SentSignal>,
    /// All captured signals (for verification).
    signals: Arc<Mutex<Vec<SentSignal>>>,
}

impl MockSignalingOutput {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SentSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            signals: Arc::new(Mutex::new(Vec::new())),
        };
        (signaling, rx)
    }

    /// Every message delivered to `to`, in delivery order.
    pub async fn messages_for(&self, to: ConnectionId) -> Vec<SignalMessage> {
        self.signals
            .lock()
            .await
            .iter()
            .filter(|s| s.to == to)
            .map(|s| s.message.clone())
            .collect()
    }

    /// Messages of one kind delivered to `to`.
    pub async fn of_kind_for(&self, to: ConnectionId, kind: MessageKind) -> Vec<SignalMessage> {
        self.messages_for(to)
            .await
            .into_iter()
            .filter(|m| m.kind() == kind)
            .collect()
    }

    /// Recipients of every message of `kind`, in delivery order.
    pub async fn recipients_of(&self, kind: MessageKind) -> Vec<ConnectionId> {
        self.signals
            .lock()
            .await
            .iter()
            .filter(|s| s.message.kind() == kind)
            .map(|s| s.to)
            .collect()
    }

    pub async fn clear(&self) {
        self.signals.lock().await.clear();
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send(&self, to: ConnectionId, message: SignalMessage) {
        tracing::debug!("[MockSignaling] {} to {:?}", message.kind(), to);

        let sent = SentSignal { to, message };
        self.signals.lock().await.push(sent.clone());
        let _ = self.tx.send(sent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::RoomId;

    #[tokio::test]
    async fn test_mock_signaling_captures_messages() {
        let (signaling, mut rx) = MockSignalingOutput::new();
        let id = ConnectionId::new();

        signaling
            .send(id, SignalMessage::LeaveRoom { room: RoomId::from("r") })
            .await;

        let sent = rx.recv().await.unwrap();
        assert_eq!(sent.to, id);
        assert_eq!(signaling.messages_for(id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_default_send_many_fans_out() {
        let (signaling, _rx) = MockSignalingOutput::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        signaling
            .send_many(&[a, b], SignalMessage::CloseNotice { room: RoomId::from("r") })
            .await;

        assert_eq!(
            signaling.recipients_of(MessageKind::CloseNotice).await,
            vec![a, b]
        );
    }
}
