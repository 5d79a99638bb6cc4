mod config;
mod error;
pub mod negotiation;
pub mod peer;
pub mod signaling;
pub mod transfer;
pub mod transport;

pub use config::*;
pub use error::*;
pub use negotiation::{NegotiationSession, NegotiationState};
pub use peer::{DriverCommand, PeerDriver, PeerEvent};
pub use signaling::{SignalSink, SignalingClient};
pub use transfer::{FileReceiver, FileSender, ReceivedFile, TransferProgress};
pub use transport::{
    PeerTransport, TransportEvent, TransportFactory, WebRtcTransport, WebRtcTransportFactory,
};
