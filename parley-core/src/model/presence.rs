use crate::model::connection::ConnectionId;
use serde::{Deserialize, Serialize};

/// One row of the presence list pushed to every client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresenceEntry {
    pub connection_id: ConnectionId,
    pub display_name: String,
}

impl PresenceEntry {
    pub fn new(connection_id: ConnectionId, display_name: impl Into<String>) -> Self {
        Self {
            connection_id,
            display_name: display_name.into(),
        }
    }
}
