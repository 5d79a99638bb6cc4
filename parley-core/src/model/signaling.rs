use crate::error::ProtocolError;
use crate::model::connection::ConnectionId;
use crate::model::file::FileMetadata;
use crate::model::presence::PresenceEntry;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

/// Every frame exchanged over the signaling socket.
///
/// Frames are adjacently tagged: `{"op": "chat-message", "d": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum SignalMessage {
    /// Server → client, first frame after the upgrade.
    Welcome { connection_id: ConnectionId },
    /// Server → client, STUN/TURN servers the endpoint should use.
    IceConfig { ice_servers: Vec<IceServerConfig> },
    JoinRoom { room: RoomId },
    LeaveRoom { room: RoomId },
    /// Server → room members after a join.
    MemberJoined {
        room: RoomId,
        connection_id: ConnectionId,
    },
    ChatMessage {
        name: String,
        text: String,
        room: RoomId,
    },
    CallRequest { target: ConnectionId },
    /// Server → caller once both parties of a call share a room.
    JoinedSignalRoom { room: RoomId, peer: ConnectionId },
    PresenceUpdate { entries: Vec<PresenceEntry> },
    SessionDescription {
        description: SessionDescription,
        room: RoomId,
    },
    ConnectivityCandidate {
        candidate: IceCandidate,
        room: RoomId,
    },
    CloseNotice { room: RoomId },
    FileMetadata {
        metadata: FileMetadata,
        room: RoomId,
    },
    LogLine { text: String, room: RoomId },
}

impl SignalMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Welcome { .. } => MessageKind::Welcome,
            Self::IceConfig { .. } => MessageKind::IceConfig,
            Self::JoinRoom { .. } => MessageKind::JoinRoom,
            Self::LeaveRoom { .. } => MessageKind::LeaveRoom,
            Self::MemberJoined { .. } => MessageKind::MemberJoined,
            Self::ChatMessage { .. } => MessageKind::ChatMessage,
            Self::CallRequest { .. } => MessageKind::CallRequest,
            Self::JoinedSignalRoom { .. } => MessageKind::JoinedSignalRoom,
            Self::PresenceUpdate { .. } => MessageKind::PresenceUpdate,
            Self::SessionDescription { .. } => MessageKind::SessionDescription,
            Self::ConnectivityCandidate { .. } => MessageKind::ConnectivityCandidate,
            Self::CloseNotice { .. } => MessageKind::CloseNotice,
            Self::FileMetadata { .. } => MessageKind::FileMetadata,
            Self::LogLine { .. } => MessageKind::LogLine,
        }
    }

    /// Target room carried by the frame, if its kind addresses a room.
    pub fn room(&self) -> Option<&RoomId> {
        match self {
            Self::JoinRoom { room }
            | Self::LeaveRoom { room }
            | Self::MemberJoined { room, .. }
            | Self::ChatMessage { room, .. }
            | Self::JoinedSignalRoom { room, .. }
            | Self::SessionDescription { room, .. }
            | Self::ConnectivityCandidate { room, .. }
            | Self::CloseNotice { room }
            | Self::FileMetadata { room, .. }
            | Self::LogLine { room, .. } => Some(room),
            Self::Welcome { .. }
            | Self::IceConfig { .. }
            | Self::CallRequest { .. }
            | Self::PresenceUpdate { .. } => None,
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    Welcome,
    IceConfig,
    JoinRoom,
    LeaveRoom,
    MemberJoined,
    ChatMessage,
    CallRequest,
    JoinedSignalRoom,
    PresenceUpdate,
    SessionDescription,
    ConnectivityCandidate,
    CloseNotice,
    FileMetadata,
    LogLine,
}

impl MessageKind {
    pub const ALL: [MessageKind; 14] = [
        Self::Welcome,
        Self::IceConfig,
        Self::JoinRoom,
        Self::LeaveRoom,
        Self::MemberJoined,
        Self::ChatMessage,
        Self::CallRequest,
        Self::JoinedSignalRoom,
        Self::PresenceUpdate,
        Self::SessionDescription,
        Self::ConnectivityCandidate,
        Self::CloseNotice,
        Self::FileMetadata,
        Self::LogLine,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::IceConfig => "ice-config",
            Self::JoinRoom => "join-room",
            Self::LeaveRoom => "leave-room",
            Self::MemberJoined => "member-joined",
            Self::ChatMessage => "chat-message",
            Self::CallRequest => "call-request",
            Self::JoinedSignalRoom => "joined-signal-room",
            Self::PresenceUpdate => "presence-update",
            Self::SessionDescription => "session-description",
            Self::ConnectivityCandidate => "connectivity-candidate",
            Self::CloseNotice => "close-notice",
            Self::FileMetadata => "file-metadata",
            Self::LogLine => "log-line",
        }
    }

    /// Kinds only the server may emit. A client sending one is treated as unknown input.
    pub fn is_server_only(self) -> bool {
        matches!(
            self,
            Self::Welcome
                | Self::IceConfig
                | Self::MemberJoined
                | Self::JoinedSignalRoom
                | Self::PresenceUpdate
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
