use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};

/// A single binary frame on the data channel.
///
/// The channel is unordered, so every chunk carries its position in the blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkFrame {
    pub seq: u32,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

impl ChunkFrame {
    pub fn new(seq: u32, payload: Vec<u8>) -> Self {
        Self { seq, payload }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(postcard::to_allocvec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(postcard::from_bytes(bytes)?)
    }
}
