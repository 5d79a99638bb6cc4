use crate::error::TransferError;
use parley_core::FileMetadata;
use parley_core::utils::CHUNK_SIZE;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

pub fn digest_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Metadata for an in-memory blob, digest included.
pub fn describe_bytes(name: impl Into<String>, data: &[u8]) -> FileMetadata {
    FileMetadata::new(name, data.len() as u64).with_digest(digest_hex(data))
}

/// Metadata for a file on disk. Reads the whole file once to hash it.
pub async fn describe_file(path: &Path) -> Result<FileMetadata, TransferError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_owned());

    let mut file = File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut size = 0u64;
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }

    Ok(FileMetadata::new(name, size).with_digest(format!("{:x}", hasher.finalize())))
}
