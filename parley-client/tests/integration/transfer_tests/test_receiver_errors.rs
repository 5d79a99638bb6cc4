use parley_client::transfer::describe_bytes;
use parley_client::{FileReceiver, TransferError};
use parley_core::{ChunkFrame, FileMetadata};

use crate::integration::init_tracing;

fn frame(seq: u32, payload: &[u8]) -> Vec<u8> {
    ChunkFrame::new(seq, payload.to_vec()).encode().unwrap()
}

#[tokio::test]
async fn test_chunk_before_metadata_is_detected() {
    init_tracing();

    let mut receiver = FileReceiver::new();

    assert!(matches!(
        receiver.on_frame(&frame(0, b"early")),
        Err(TransferError::MissingMetadata)
    ));
}

#[tokio::test]
async fn test_overflow_past_declared_size() {
    init_tracing();

    let mut receiver = FileReceiver::new();
    receiver.on_metadata(FileMetadata::new("small", 4)).unwrap();

    let err = receiver.on_frame(&frame(0, b"too many bytes")).unwrap_err();

    assert!(matches!(
        err,
        TransferError::Overflow {
            declared: 4,
            received: 14
        }
    ));
    assert!(receiver.is_idle());
}

#[tokio::test]
async fn test_channel_closed_mid_transfer_is_incomplete() {
    init_tracing();

    let mut receiver = FileReceiver::new();
    receiver.on_metadata(FileMetadata::new("half", 10)).unwrap();
    receiver.on_frame(&frame(0, b"hello")).unwrap();

    assert!(matches!(
        receiver.on_channel_closed(),
        Err(TransferError::Incomplete {
            declared: 10,
            received: 5
        })
    ));
    assert!(receiver.on_channel_closed().is_ok());
}

#[tokio::test]
async fn test_digest_mismatch_is_reported() {
    init_tracing();

    let mut receiver = FileReceiver::new();
    let metadata = describe_bytes("signed", b"expected");
    receiver.on_metadata(metadata).unwrap();

    assert!(matches!(
        receiver.on_frame(&frame(0, b"tampered")),
        Err(TransferError::DigestMismatch { .. })
    ));
}

#[tokio::test]
async fn test_undecodable_frame_keeps_transfer_open() {
    init_tracing();

    let mut receiver = FileReceiver::new();
    receiver.on_metadata(FileMetadata::new("ok", 2)).unwrap();

    assert!(matches!(
        receiver.on_frame(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
        Err(TransferError::Frame(_))
    ));
    let file = receiver.on_frame(&frame(0, b"ok")).unwrap().unwrap();
    assert_eq!(file.data, b"ok");
}

#[tokio::test]
async fn test_new_metadata_replaces_unfinished_transfer() {
    init_tracing();

    let mut receiver = FileReceiver::new();
    receiver.on_metadata(FileMetadata::new("first", 10)).unwrap();
    receiver.on_frame(&frame(0, b"abc")).unwrap();

    receiver.on_metadata(FileMetadata::new("second", 3)).unwrap();
    let file = receiver.on_frame(&frame(0, b"xyz")).unwrap().unwrap();

    assert_eq!(file.metadata.name, "second");
    assert_eq!(file.data, b"xyz");
}
