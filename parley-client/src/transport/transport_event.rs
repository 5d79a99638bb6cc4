use bytes::Bytes;
use parley_core::IceCandidate;

/// Events the peer transport raises for the peer driver.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The local description must be regenerated (new channel or track).
    NegotiationNeeded,

    /// Trickle ICE: a local candidate to forward through signaling.
    CandidateGenerated(IceCandidate),

    /// The data channel is open and ready for writes.
    DataChannelOpen,

    /// One binary frame from the data channel.
    Message(Bytes),

    DataChannelClosed,

    /// The connection failed, dropped or was closed.
    Disconnected,
}
