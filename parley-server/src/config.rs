use crate::hub::DispatchTable;
use parley_core::IceServerConfig;
use parley_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use std::net::SocketAddr;

/// Relay settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Handed to every client in its `ice-config` frame.
    pub ice_servers: Vec<IceServerConfig>,
    pub dispatch: DispatchTable,
    /// Capacity of the hub command channel.
    pub command_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
                username: None,
                credential: None,
            }],
            dispatch: DispatchTable::default(),
            command_buffer: 1024,
        }
    }
}
