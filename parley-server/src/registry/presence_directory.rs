use parley_core::{ConnectionId, PresenceEntry};

/// Live users in the order they connected.
#[derive(Debug, Default)]
pub struct PresenceDirectory {
    entries: Vec<PresenceEntry>,
}

impl PresenceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering an id twice renames it in place.
    pub fn register(&mut self, connection_id: ConnectionId, display_name: impl Into<String>) {
        let display_name = display_name.into();
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.connection_id == connection_id)
        {
            Some(entry) => entry.display_name = display_name,
            None => self
                .entries
                .push(PresenceEntry::new(connection_id, display_name)),
        }
    }

    pub fn unregister(&mut self, connection_id: ConnectionId) -> Option<PresenceEntry> {
        let idx = self
            .entries
            .iter()
            .position(|entry| entry.connection_id == connection_id)?;
        Some(self.entries.remove(idx))
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.connection_id == connection_id)
    }

    pub fn display_name(&self, connection_id: ConnectionId) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.connection_id == connection_id)
            .map(|entry| entry.display_name.as_str())
    }

    pub fn snapshot(&self) -> Vec<PresenceEntry> {
        self.entries.clone()
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.entries.iter().map(|entry| entry.connection_id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
