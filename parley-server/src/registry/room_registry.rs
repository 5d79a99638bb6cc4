use parley_core::{ConnectionId, RoomId};
use std::collections::{HashMap, HashSet};

/// Room membership, indexed both ways so a disconnect can leave every room at once.
///
/// Empty rooms are discarded: a room exists only while it has members.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
    memberships: HashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the connection was already a member.
    pub fn join(&mut self, connection_id: ConnectionId, room: &RoomId) -> bool {
        let added = self
            .rooms
            .entry(room.clone())
            .or_default()
            .insert(connection_id);

        if added {
            self.memberships
                .entry(connection_id)
                .or_default()
                .insert(room.clone());
        }
        added
    }

    /// Returns `false` when the connection was not a member.
    pub fn leave(&mut self, connection_id: ConnectionId, room: &RoomId) -> bool {
        let Some(members) = self.rooms.get_mut(room) else {
            return false;
        };
        let removed = members.remove(&connection_id);
        if members.is_empty() {
            self.rooms.remove(room);
        }

        if let Some(joined) = self.memberships.get_mut(&connection_id) {
            joined.remove(room);
            if joined.is_empty() {
                self.memberships.remove(&connection_id);
            }
        }
        removed
    }

    /// Drops the connection from all of its rooms and returns them.
    pub fn remove_everywhere(&mut self, connection_id: ConnectionId) -> Vec<RoomId> {
        let Some(joined) = self.memberships.remove(&connection_id) else {
            return Vec::new();
        };

        let mut left: Vec<RoomId> = joined.into_iter().collect();
        left.sort();
        for room in &left {
            let Some(members) = self.rooms.get_mut(room) else {
                continue;
            };
            members.remove(&connection_id);
            if members.is_empty() {
                self.rooms.remove(room);
            }
        }
        left
    }

    /// Resolves who a broadcast from `sender` into `room` reaches.
    ///
    /// An unknown or empty room yields no recipients.
    pub fn broadcast_targets(
        &self,
        room: &RoomId,
        sender: ConnectionId,
        exclude_sender: bool,
    ) -> Vec<ConnectionId> {
        let Some(members) = self.rooms.get(room) else {
            return Vec::new();
        };
        let mut targets: Vec<ConnectionId> = members
            .iter()
            .copied()
            .filter(|id| !exclude_sender || *id != sender)
            .collect();
        targets.sort();
        targets
    }

    pub fn members(&self, room: &RoomId) -> HashSet<ConnectionId> {
        self.rooms.get(room).cloned().unwrap_or_default()
    }

    pub fn is_member(&self, connection_id: ConnectionId, room: &RoomId) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|members| members.contains(&connection_id))
    }

    pub fn rooms_of(&self, connection_id: ConnectionId) -> HashSet<RoomId> {
        self.memberships
            .get(&connection_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
