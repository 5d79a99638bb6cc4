use crate::error::TransferError;
use crate::transfer::{TransferProgress, digest_hex};
use parley_core::{ChunkFrame, FileMetadata};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// A completed, verified transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    pub metadata: FileMetadata,
    pub data: Vec<u8>,
}

struct Incoming {
    metadata: FileMetadata,
    chunks: BTreeMap<u32, Vec<u8>>,
    received: u64,
}

impl Incoming {
    fn new(metadata: FileMetadata) -> Self {
        Self {
            metadata,
            chunks: BTreeMap::new(),
            received: 0,
        }
    }

    fn assemble(self) -> Result<ReceivedFile, TransferError> {
        let mut data = Vec::with_capacity(self.received as usize);
        for chunk in self.chunks.into_values() {
            data.extend_from_slice(&chunk);
        }

        if let Some(expected) = &self.metadata.digest {
            let actual = digest_hex(&data);
            if !expected.eq_ignore_ascii_case(&actual) {
                return Err(TransferError::DigestMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        info!(
            "Received '{}' ({} bytes)",
            self.metadata.name, self.metadata.size
        );
        Ok(ReceivedFile {
            metadata: self.metadata,
            data,
        })
    }
}

/// Reassembles one transfer at a time. Metadata opens a transfer; the transfer completes
/// exactly when the running byte count reaches the declared size.
#[derive(Default)]
pub struct FileReceiver {
    current: Option<Incoming>,
}

impl FileReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    pub fn metadata(&self) -> Option<&FileMetadata> {
        self.current.as_ref().map(|c| &c.metadata)
    }

    pub fn progress(&self) -> Option<TransferProgress> {
        self.current
            .as_ref()
            .map(|c| TransferProgress::new(c.received, c.metadata.size))
    }

    /// Starts a transfer. A zero-byte file completes right away.
    pub fn on_metadata(
        &mut self,
        metadata: FileMetadata,
    ) -> Result<Option<ReceivedFile>, TransferError> {
        if let Some(previous) = self.current.take() {
            warn!(
                "Abandoning '{}' after {} of {} bytes",
                previous.metadata.name, previous.received, previous.metadata.size
            );
        }

        debug!("Expecting '{}' ({} bytes)", metadata.name, metadata.size);
        let incoming = Incoming::new(metadata);
        if incoming.metadata.size == 0 {
            return incoming.assemble().map(Some);
        }
        self.current = Some(incoming);
        Ok(None)
    }

    /// Consumes one binary frame from the data channel.
    pub fn on_frame(&mut self, bytes: &[u8]) -> Result<Option<ReceivedFile>, TransferError> {
        let Some(incoming) = self.current.as_mut() else {
            return Err(TransferError::MissingMetadata);
        };
        let frame = ChunkFrame::decode(bytes)?;

        if incoming.chunks.contains_key(&frame.seq) {
            debug!("Duplicate chunk {} ignored", frame.seq);
            return Ok(None);
        }

        let received = incoming.received + frame.payload.len() as u64;
        let declared = incoming.metadata.size;
        if received > declared {
            self.current = None;
            return Err(TransferError::Overflow { declared, received });
        }

        incoming.received = received;
        incoming.chunks.insert(frame.seq, frame.payload);

        if received < declared {
            return Ok(None);
        }
        match self.current.take() {
            Some(done) => done.assemble().map(Some),
            None => Ok(None),
        }
    }

    /// The data channel closed. Fails if a transfer was still open.
    pub fn on_channel_closed(&mut self) -> Result<(), TransferError> {
        match self.current.take() {
            Some(incoming) => Err(TransferError::Incomplete {
                declared: incoming.metadata.size,
                received: incoming.received,
            }),
            None => Ok(()),
        }
    }
}
