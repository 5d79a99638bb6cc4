use crate::registry::{PresenceDirectory, RoomRegistry};
use parley_core::{ConnectionId, RoomId};

/// Allocates one fresh two-party room per call.
#[derive(Debug, Default)]
pub struct CallRouter {
    next_call: u64,
}

impl CallRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts caller and callee into a new room, or returns `None` if the callee is not
    /// connected. Nobody is notified here.
    pub fn request_call(
        &mut self,
        caller: ConnectionId,
        callee: ConnectionId,
        presence: &PresenceDirectory,
        rooms: &mut RoomRegistry,
    ) -> Option<RoomId> {
        if caller == callee || !presence.contains(callee) || !presence.contains(caller) {
            return None;
        }

        let room = Self::room_for(caller, callee, self.next_call);
        self.next_call += 1;

        rooms.join(caller, &room);
        rooms.join(callee, &room);
        Some(room)
    }

    /// `call:<low id>:<high id>:<sequence>`; the pair is unordered, the sequence makes
    /// every call distinct.
    fn room_for(a: ConnectionId, b: ConnectionId, seq: u64) -> RoomId {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        RoomId::new(format!("call:{low}:{high}:{seq}"))
    }
}
