use crate::error::TransferError;
use crate::transfer::TransferProgress;
use crate::transport::PeerTransport;
use bytes::Bytes;
use parley_core::ChunkFrame;
use parley_core::utils::CHUNK_SIZE;
use std::io::Cursor;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

/// Splits a blob into fixed-size, sequence-numbered frames, read strictly in offset order.
pub struct FileSender {
    reader: Box<dyn AsyncRead + Send + Sync + Unpin>,
    chunk_size: usize,
    total: u64,
    offset: u64,
    next_seq: u32,
}

impl FileSender {
    /// `total` must be the exact number of bytes `reader` yields.
    pub fn new(reader: impl AsyncRead + Send + Sync + Unpin + 'static, total: u64) -> Self {
        Self {
            reader: Box::new(reader),
            chunk_size: CHUNK_SIZE,
            total,
            offset: 0,
            next_seq: 0,
        }
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        let total = data.len() as u64;
        Self::new(Cursor::new(data), total)
    }

    pub async fn open(path: &Path) -> Result<Self, TransferError> {
        let file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();
        Ok(Self::new(file, total))
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn chunk_count(&self) -> u64 {
        self.total.div_ceil(self.chunk_size as u64)
    }

    pub fn progress(&self) -> TransferProgress {
        TransferProgress::new(self.offset, self.total)
    }

    /// Reads the next chunk; `None` once the offset reaches the total size.
    pub async fn next_frame(&mut self) -> Result<Option<ChunkFrame>, TransferError> {
        if self.offset >= self.total {
            return Ok(None);
        }
        if self.next_seq == u32::MAX {
            return Err(TransferError::TooLarge(self.chunk_count()));
        }

        let len = (self.total - self.offset).min(self.chunk_size as u64) as usize;
        let mut payload = vec![0u8; len];
        self.reader.read_exact(&mut payload).await?;

        let frame = ChunkFrame::new(self.next_seq, payload);
        self.next_seq += 1;
        self.offset += len as u64;
        Ok(Some(frame))
    }

    /// Writes every remaining chunk to the data channel. Any read or write failure aborts
    /// the transfer.
    pub async fn send_all(
        &mut self,
        transport: &dyn PeerTransport,
        mut on_progress: impl FnMut(TransferProgress),
    ) -> Result<u64, TransferError> {
        info!(
            "Sending {} bytes in {} chunk(s)",
            self.total,
            self.chunk_count()
        );

        while let Some(frame) = self.next_frame().await? {
            let seq = frame.seq;
            transport.send_data(Bytes::from(frame.encode()?)).await?;
            debug!("Sent chunk {}", seq);
            on_progress(self.progress());
        }

        Ok(self.offset)
    }
}
