use crate::config::NegotiationConfig;
use crate::error::NegotiationError;
use crate::negotiation::NegotiationState;
use crate::negotiation::negotiation_state::SessionState;
use crate::signaling::SignalSink;
use crate::transport::PeerTransport;
use parley_core::{IceCandidate, RoomId, SdpKind, SessionDescription, SignalMessage};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// One call's offer/answer exchange, addressed to a single signaling room.
///
/// The state lock is only ever held between transport calls, never across one. That
/// keeps the `negotiation_in_progress` guard honest when two triggers race: the second
/// caller sees the flag set by the first and backs off.
pub struct NegotiationSession {
    room: RoomId,
    config: NegotiationConfig,
    transport: Arc<dyn PeerTransport>,
    signaling: Arc<dyn SignalSink>,
    state: Mutex<SessionState>,
}

impl NegotiationSession {
    pub fn new(
        room: RoomId,
        config: NegotiationConfig,
        transport: Arc<dyn PeerTransport>,
        signaling: Arc<dyn SignalSink>,
    ) -> Self {
        Self {
            room,
            config,
            transport,
            signaling,
            state: Mutex::new(SessionState::new()),
        }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn transport(&self) -> &Arc<dyn PeerTransport> {
        &self.transport
    }

    pub async fn state(&self) -> NegotiationState {
        self.state.lock().await.phase
    }

    pub async fn local_description(&self) -> Option<SessionDescription> {
        self.state.lock().await.local_description.clone()
    }

    pub async fn remote_description(&self) -> Option<SessionDescription> {
        self.state.lock().await.remote_description.clone()
    }

    pub async fn buffered_candidates(&self) -> usize {
        self.state.lock().await.pending_candidates.len()
    }

    /// Produces and sends an offer unless one is already being produced.
    ///
    /// Returns whether this call sent an offer.
    pub async fn negotiation_needed(&self) -> Result<bool, NegotiationError> {
        {
            let mut st = self.state.lock().await;
            if st.is_closed() {
                return Ok(false);
            }
            if st.negotiation_in_progress {
                debug!("Negotiation already running in '{}'", self.room);
                return Ok(false);
            }
            st.negotiation_in_progress = true;
            st.phase = NegotiationState::OfferPending;
        }

        let result = self.send_offer().await;

        let mut st = self.state.lock().await;
        st.negotiation_in_progress = false;
        match result {
            Ok(offer) => {
                if st.phase == NegotiationState::OfferPending {
                    st.local_description = Some(offer);
                }
                Ok(true)
            }
            Err(e) => {
                if st.phase == NegotiationState::OfferPending {
                    st.phase = st.settled_phase();
                }
                drop(st);
                self.report("offer", &e).await;
                Err(e)
            }
        }
    }

    async fn send_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let offer = self
            .transport
            .create_offer()
            .await
            .map_err(NegotiationError::transport("create offer"))?;
        self.transport
            .set_local_description(offer.clone())
            .await
            .map_err(NegotiationError::transport("set local offer"))?;
        self.signaling
            .send(SignalMessage::SessionDescription {
                description: offer.clone(),
                room: self.room.clone(),
            })
            .await?;

        info!("Sent offer to room '{}'", self.room);
        Ok(offer)
    }

    pub async fn handle_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        match description.kind {
            SdpKind::Offer => self.accept_offer(description).await,
            SdpKind::Answer => self.accept_answer(description).await,
        }
    }

    async fn accept_offer(&self, offer: SessionDescription) -> Result<(), NegotiationError> {
        let collision = {
            let st = self.state.lock().await;
            if st.is_closed() {
                return Ok(());
            }
            st.negotiation_in_progress || st.phase == NegotiationState::OfferPending
        };

        if collision {
            if !self.config.polite {
                self.diagnostic("ignoring colliding remote offer").await;
                return Ok(());
            }
            self.diagnostic("rolling back local offer for remote offer").await;
            if let Err(e) = self
                .transport
                .rollback()
                .await
                .map_err(NegotiationError::transport("rollback"))
            {
                self.report("rollback", &e).await;
                return Err(e);
            }
            let mut st = self.state.lock().await;
            st.local_description = None;
            st.phase = st.settled_phase();
        }

        match self.answer(offer).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.settle().await;
                self.report("answer", &e).await;
                Err(e)
            }
        }
    }

    async fn answer(&self, offer: SessionDescription) -> Result<(), NegotiationError> {
        self.transport
            .set_remote_description(offer.clone())
            .await
            .map_err(NegotiationError::transport("set remote offer"))?;
        self.state.lock().await.remote_description = Some(offer);
        self.flush_candidates().await;

        let answer = self
            .transport
            .create_answer()
            .await
            .map_err(NegotiationError::transport("create answer"))?;
        self.transport
            .set_local_description(answer.clone())
            .await
            .map_err(NegotiationError::transport("set local answer"))?;
        self.signaling
            .send(SignalMessage::SessionDescription {
                description: answer.clone(),
                room: self.room.clone(),
            })
            .await?;

        let mut st = self.state.lock().await;
        if !st.is_closed() {
            st.local_description = Some(answer);
            st.phase = NegotiationState::Stable;
        }
        info!("Answered offer in room '{}'", self.room);
        Ok(())
    }

    async fn accept_answer(&self, answer: SessionDescription) -> Result<(), NegotiationError> {
        {
            let st = self.state.lock().await;
            if st.is_closed() {
                return Ok(());
            }
            if st.phase != NegotiationState::OfferPending {
                debug!("Ignoring answer in state {} ('{}')", st.phase, self.room);
                return Ok(());
            }
        }

        if let Err(e) = self
            .transport
            .set_remote_description(answer.clone())
            .await
            .map_err(NegotiationError::transport("set remote answer"))
        {
            self.settle().await;
            self.report("answer", &e).await;
            return Err(e);
        }

        {
            let mut st = self.state.lock().await;
            if !st.is_closed() {
                st.remote_description = Some(answer);
                st.phase = NegotiationState::Stable;
            }
        }
        self.flush_candidates().await;
        Ok(())
    }

    /// Applies a remote candidate, or buffers it until a remote description exists.
    pub async fn handle_remote_candidate(
        &self,
        candidate: IceCandidate,
    ) -> Result<(), NegotiationError> {
        {
            let mut st = self.state.lock().await;
            if st.is_closed() {
                return Ok(());
            }
            if st.remote_description.is_none() {
                st.pending_candidates.push(candidate);
                return Ok(());
            }
        }

        self.transport
            .add_ice_candidate(candidate)
            .await
            .map_err(NegotiationError::transport("add candidate"))
    }

    async fn flush_candidates(&self) {
        let pending = std::mem::take(&mut self.state.lock().await.pending_candidates);
        if pending.is_empty() {
            return;
        }
        debug!("Applying {} buffered candidate(s)", pending.len());
        for candidate in pending {
            if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                warn!("Buffered candidate rejected in '{}': {:#}", self.room, e);
            }
        }
    }

    /// Forwards a locally gathered candidate to the room.
    pub async fn send_local_candidate(
        &self,
        candidate: IceCandidate,
    ) -> Result<(), NegotiationError> {
        if self.state.lock().await.is_closed() {
            return Ok(());
        }
        self.signaling
            .send(SignalMessage::ConnectivityCandidate {
                candidate,
                room: self.room.clone(),
            })
            .await?;
        Ok(())
    }

    /// Tears the session down. `notify_peer` sends a `close-notice` first; it is false
    /// when the close came from the remote side.
    pub async fn close(&self, notify_peer: bool) {
        {
            let mut st = self.state.lock().await;
            if st.is_closed() {
                return;
            }
            st.phase = NegotiationState::Closed;
            st.clear();
        }
        info!("Closing session in room '{}'", self.room);

        if notify_peer {
            let notice = SignalMessage::CloseNotice {
                room: self.room.clone(),
            };
            if let Err(e) = self.signaling.send(notice).await {
                debug!("Close notice not sent: {}", e);
            }
        }

        if let Err(e) = self.transport.close().await {
            warn!("Transport close failed in '{}': {:#}", self.room, e);
        }

        if self.config.leave_room_on_close {
            let leave = SignalMessage::LeaveRoom {
                room: self.room.clone(),
            };
            if let Err(e) = self.signaling.send(leave).await {
                debug!("Leave not sent: {}", e);
            }
        }
    }

    /// Logs `text` and, when configured, echoes it to the room.
    pub async fn diagnostic(&self, text: &str) {
        info!("[{}] {}", self.room, text);
        if !self.config.echo_diagnostics {
            return;
        }
        let line = SignalMessage::LogLine {
            text: format!("{}: {}", self.config.diagnostic_name, text),
            room: self.room.clone(),
        };
        if let Err(e) = self.signaling.send(line).await {
            debug!("Diagnostic echo failed: {}", e);
        }
    }

    async fn settle(&self) {
        let mut st = self.state.lock().await;
        if !st.is_closed() && !st.negotiation_in_progress {
            st.phase = st.settled_phase();
        }
    }

    async fn report(&self, step: &str, error: &NegotiationError) {
        warn!("{} abandoned in room '{}': {}", step, self.room, error);
        self.diagnostic(&format!("{} failed: {}", step, error)).await;
    }
}
