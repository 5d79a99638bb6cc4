use crate::error::ClientError;
use async_trait::async_trait;
use parley_core::SignalMessage;

/// Outbound half of the signaling channel, as seen by a negotiation session.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send(&self, message: SignalMessage) -> Result<(), ClientError>;
}
