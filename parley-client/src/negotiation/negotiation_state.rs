use parley_core::{IceCandidate, SessionDescription};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    /// A local offer is being produced or awaits its answer.
    OfferPending,
    Stable,
    /// Terminal. Every further input is ignored.
    Closed,
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::OfferPending => "offer-pending",
            Self::Stable => "stable",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Mutable half of a negotiation session.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub phase: NegotiationState,
    pub negotiation_in_progress: bool,
    pub local_description: Option<SessionDescription>,
    pub remote_description: Option<SessionDescription>,
    /// Remote candidates that arrived before any remote description.
    pub pending_candidates: Vec<IceCandidate>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: NegotiationState::Idle,
            negotiation_in_progress: false,
            local_description: None,
            remote_description: None,
            pending_candidates: Vec::new(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.phase == NegotiationState::Closed
    }

    /// Phase to fall back to when a step is abandoned.
    pub fn settled_phase(&self) -> NegotiationState {
        if self.remote_description.is_some() {
            NegotiationState::Stable
        } else {
            NegotiationState::Idle
        }
    }

    pub fn clear(&mut self) {
        self.negotiation_in_progress = false;
        self.local_description = None;
        self.remote_description = None;
        self.pending_candidates.clear();
    }
}
