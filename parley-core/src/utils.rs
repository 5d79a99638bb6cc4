pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Size of every chunk but the last one of a file transfer.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Lifetime of an unacknowledged data channel message before the stack gives up on it.
pub const DEFAULT_MAX_PACKET_LIFE_TIME_MS: u16 = 1000;

pub const DEFAULT_DATA_CHANNEL_LABEL: &str = "data-channel";

/// Display name given to a connection that did not announce one.
pub fn guest_name(id: &crate::ConnectionId) -> String {
    format!("guest-{}", id.short())
}
