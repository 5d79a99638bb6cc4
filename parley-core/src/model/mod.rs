mod chunk;
mod connection;
mod file;
mod presence;
mod room;
mod signaling;

pub use chunk::ChunkFrame;
pub use connection::ConnectionId;
pub use file::FileMetadata;
pub use presence::PresenceEntry;
pub use room::RoomId;
pub use signaling::{
    IceCandidate, IceServerConfig, MessageKind, SdpKind, SessionDescription, SignalMessage,
};
