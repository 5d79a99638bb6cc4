use parley_core::IceServerConfig;
use parley_core::utils::{
    DEFAULT_DATA_CHANNEL_LABEL, DEFAULT_MAX_PACKET_LIFE_TIME_MS, DEFAULT_STUN_ADDR,
};

/// Peer connection settings
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub channel_label: String,
    pub ordered: bool,
    /// Retransmission window for a data channel message; there is no retry count.
    pub max_packet_life_time_ms: u16,
    /// Gather 127.0.0.1 candidates as well. Only useful when both peers share a host.
    pub include_loopback_candidates: bool,
}

impl TransportConfig {
    /// Replaces the ICE servers, e.g. with the ones the relay announced.
    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        if !ice_servers.is_empty() {
            self.ice_servers = ice_servers;
        }
        self
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_ADDR)],
            channel_label: DEFAULT_DATA_CHANNEL_LABEL.to_owned(),
            ordered: false,
            max_packet_life_time_ms: DEFAULT_MAX_PACKET_LIFE_TIME_MS,
            include_loopback_candidates: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NegotiationConfig {
    /// A polite peer rolls back its own pending offer when offers collide.
    pub polite: bool,
    /// Leave the signaling room when the session closes (room-per-call).
    pub leave_room_on_close: bool,
    /// Echo negotiation diagnostics to the room as `log-line` frames.
    pub echo_diagnostics: bool,
    pub diagnostic_name: String,
}

impl NegotiationConfig {
    pub fn polite(mut self, polite: bool) -> Self {
        self.polite = polite;
        self
    }
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            polite: false,
            leave_room_on_close: true,
            echo_diagnostics: false,
            diagnostic_name: "peer".to_owned(),
        }
    }
}
