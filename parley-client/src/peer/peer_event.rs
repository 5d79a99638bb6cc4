use crate::error::TransferError;
use crate::transfer::{FileSender, ReceivedFile, TransferProgress};
use parley_core::{ConnectionId, FileMetadata, PresenceEntry, RoomId};

/// What the application asks the driver to do.
pub enum DriverCommand {
    JoinRoom(RoomId),
    Chat { room: RoomId, text: String },
    Call { target: ConnectionId },
    /// Queued until the data channel is open.
    SendFile {
        metadata: FileMetadata,
        sender: FileSender,
    },
    Hangup,
}

/// What the driver reports back to the application.
#[derive(Debug)]
pub enum PeerEvent {
    Presence(Vec<PresenceEntry>),
    MemberJoined {
        room: RoomId,
        connection_id: ConnectionId,
    },
    Chat {
        name: String,
        text: String,
        room: RoomId,
    },
    /// A negotiation session now exists for `room`. `peer` is only known to the caller.
    CallStarted {
        room: RoomId,
        peer: Option<ConnectionId>,
    },
    ChannelOpen,
    FileOffered(FileMetadata),
    ReceiveProgress(TransferProgress),
    SendProgress(TransferProgress),
    FileSent { bytes: u64 },
    FileReceived(ReceivedFile),
    TransferFailed(TransferError),
    Closed,
}
