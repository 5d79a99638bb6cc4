use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use parley_core::{IceCandidate, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::transport::TransportEvent;

/// The peer connection primitives a negotiation session drives.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Discards a pending local offer.
    async fn rollback(&self) -> Result<()>;

    /// Creates the data channel. Opening it raises [`TransportEvent::NegotiationNeeded`].
    async fn open_data_channel(&self) -> Result<()>;

    /// Writes one binary frame to the open data channel.
    async fn send_data(&self, data: Bytes) -> Result<()>;

    /// Detaches every handler, then closes the channel and the connection.
    async fn close(&self) -> Result<()>;
}

/// Builds one transport per call.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>>;
}
