use parley_core::ProtocolError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failures of the signaling connection.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid signaling url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to reach signaling server: {0}")]
    Connect(#[from] tungstenite::Error),

    #[error("signaling connection closed")]
    ChannelClosed,

    #[error("unexpected handshake frame: {0}")]
    Handshake(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// A negotiation step that was abandoned. The session keeps its last stable state.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("{step} failed: {cause:#}")]
    Transport {
        step: &'static str,
        cause: anyhow::Error,
    },

    #[error(transparent)]
    Signaling(#[from] ClientError),
}

impl NegotiationError {
    pub(crate) fn transport(step: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |cause| Self::Transport { step, cause }
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("chunk arrived before file metadata")]
    MissingMetadata,

    #[error("received {received} bytes, more than the declared {declared}")]
    Overflow { declared: u64, received: u64 },

    #[error("channel closed after {received} of {declared} bytes")]
    Incomplete { declared: u64, received: u64 },

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("file has {0} chunks, more than a transfer can number")]
    TooLarge(u64),

    #[error(transparent)]
    Frame(#[from] ProtocolError),

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] anyhow::Error),

    #[error(transparent)]
    Signaling(#[from] ClientError),
}
