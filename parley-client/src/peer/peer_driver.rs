use crate::config::NegotiationConfig;
use crate::error::TransferError;
use crate::negotiation::NegotiationSession;
use crate::peer::{DriverCommand, PeerEvent};
use crate::signaling::SignalSink;
use crate::transfer::{FileReceiver, FileSender};
use crate::transport::{TransportEvent, TransportFactory};
use bytes::Bytes;
use parley_core::{FileMetadata, RoomId, SdpKind, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Bytes of chunk frames held back while their metadata is still travelling through the
/// relay.
const MAX_EARLY_BYTES: usize = 64 * 1024 * 1024;

const TRANSPORT_EVENT_BUFFER: usize = 256;

/// Endpoint event loop: routes relay frames, transport events and application commands
/// to the negotiation session and the transfer state.
pub struct PeerDriver {
    display_name: String,
    signaling: Arc<dyn SignalSink>,
    factory: Arc<dyn TransportFactory>,
    negotiation: NegotiationConfig,
    session: Option<Arc<NegotiationSession>>,
    channel_open: bool,
    pending_send: Option<(FileMetadata, FileSender)>,
    receiver: FileReceiver,
    early_frames: Vec<Bytes>,
    early_bytes: usize,
    early_overflow: bool,
    events: mpsc::UnboundedSender<PeerEvent>,
    /// Events of the current session's transport only; replaced per session.
    transport_rx: Option<mpsc::Receiver<TransportEvent>>,
}

impl PeerDriver {
    pub fn new(
        display_name: impl Into<String>,
        signaling: Arc<dyn SignalSink>,
        factory: Arc<dyn TransportFactory>,
        negotiation: NegotiationConfig,
    ) -> (Self, mpsc::UnboundedReceiver<PeerEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();

        let driver = Self {
            display_name: display_name.into(),
            signaling,
            factory,
            negotiation,
            session: None,
            channel_open: false,
            pending_send: None,
            receiver: FileReceiver::new(),
            early_frames: Vec::new(),
            early_bytes: 0,
            early_overflow: false,
            events,
            transport_rx: None,
        };
        (driver, events_rx)
    }

    /// Runs until the signaling channel closes.
    pub async fn run(
        mut self,
        mut signals: mpsc::UnboundedReceiver<SignalMessage>,
        mut commands: mpsc::UnboundedReceiver<DriverCommand>,
    ) {
        info!("Peer driver started for '{}'", self.display_name);

        loop {
            tokio::select! {
                biased;

                // Relay frames first: file metadata must not queue up behind its own chunks.
                signal = signals.recv() => match signal {
                    Some(msg) => self.handle_signal(msg).await,
                    None => break,
                },
                Some(cmd) = commands.recv() => self.handle_command(cmd).await,
                event = next_transport_event(&mut self.transport_rx) => {
                    self.handle_transport(event).await
                }
            }
        }

        if let Some(session) = self.session.take() {
            session.close(false).await;
        }
        info!("Signaling closed. Peer driver for '{}' finished", self.display_name);
    }

    fn emit(&self, event: PeerEvent) {
        let _ = self.events.send(event);
    }

    async fn send_signal(&self, message: SignalMessage) {
        let kind = message.kind();
        if let Err(e) = self.signaling.send(message).await {
            error!("Failed to send {}: {}", kind, e);
        }
    }

    async fn handle_command(&mut self, cmd: DriverCommand) {
        match cmd {
            DriverCommand::JoinRoom(room) => self.send_signal(SignalMessage::JoinRoom { room }).await,
            DriverCommand::Chat { room, text } => {
                self.send_signal(SignalMessage::ChatMessage {
                    name: self.display_name.clone(),
                    text,
                    room,
                })
                .await
            }
            DriverCommand::Call { target } => {
                info!("Calling {:?}", target);
                self.send_signal(SignalMessage::CallRequest { target }).await
            }
            DriverCommand::SendFile { metadata, sender } => {
                self.pending_send = Some((metadata, sender));
                self.start_pending_send();
            }
            DriverCommand::Hangup => {
                if self.session.is_some() {
                    self.end_session(true).await;
                } else {
                    self.emit(PeerEvent::Closed);
                }
            }
        }
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::PresenceUpdate { entries } => self.emit(PeerEvent::Presence(entries)),
            SignalMessage::MemberJoined {
                room,
                connection_id,
            } => self.emit(PeerEvent::MemberJoined {
                room,
                connection_id,
            }),
            SignalMessage::ChatMessage { name, text, room } => {
                self.emit(PeerEvent::Chat { name, text, room })
            }
            SignalMessage::LogLine { text, room } => info!("[{}] remote: {}", room, text),
            SignalMessage::JoinedSignalRoom { room, peer } => {
                if self.start_session(room.clone(), false).await {
                    self.emit(PeerEvent::CallStarted {
                        room,
                        peer: Some(peer),
                    });
                    self.open_channel().await;
                }
            }
            SignalMessage::SessionDescription { description, room } => {
                if self.session.is_none() && description.kind == SdpKind::Offer {
                    // The callee learns its room from the first offer addressed to it.
                    if self.start_session(room.clone(), true).await {
                        self.emit(PeerEvent::CallStarted { room: room.clone(), peer: None });
                    }
                }
                let Some(session) = self.session_for(&room) else {
                    return;
                };
                if let Err(e) = session.handle_remote_description(description).await {
                    debug!("Remote description abandoned: {}", e);
                }
            }
            SignalMessage::ConnectivityCandidate { candidate, room } => {
                let Some(session) = self.session_for(&room) else {
                    return;
                };
                if let Err(e) = session.handle_remote_candidate(candidate).await {
                    warn!("Remote candidate rejected: {}", e);
                }
            }
            SignalMessage::CloseNotice { room } => {
                if self.session_for(&room).is_some() {
                    info!("Peer closed the call in '{}'", room);
                    self.end_session(false).await;
                }
            }
            SignalMessage::FileMetadata { metadata, room } => {
                if self.session_for(&room).is_some() {
                    self.accept_metadata(metadata);
                }
            }
            other => debug!("Ignoring {} from relay", other.kind()),
        }
    }

    async fn handle_transport(&mut self, event: TransportEvent) {
        let Some(session) = self.session.clone() else {
            debug!("Transport event without a session: {:?}", event);
            return;
        };

        match event {
            TransportEvent::NegotiationNeeded => {
                if let Err(e) = session.negotiation_needed().await {
                    debug!("Offer abandoned: {}", e);
                }
            }
            TransportEvent::CandidateGenerated(candidate) => {
                if let Err(e) = session.send_local_candidate(candidate).await {
                    warn!("Local candidate not sent: {}", e);
                }
            }
            TransportEvent::DataChannelOpen => {
                self.channel_open = true;
                session.diagnostic("data channel open").await;
                self.emit(PeerEvent::ChannelOpen);
                self.start_pending_send();
            }
            TransportEvent::Message(bytes) => self.accept_frame(bytes),
            TransportEvent::DataChannelClosed => {
                self.channel_open = false;
                if let Err(e) = self.receiver.on_channel_closed() {
                    self.emit(PeerEvent::TransferFailed(e));
                }
            }
            TransportEvent::Disconnected => {
                info!("Peer connection lost in '{}'", session.room());
                self.end_session(false).await;
            }
        }
    }

    fn session_for(&self, room: &RoomId) -> Option<Arc<NegotiationSession>> {
        match &self.session {
            Some(session) if session.room() == room => Some(session.clone()),
            Some(session) => {
                debug!(
                    "Frame for '{}' while in call '{}', ignored",
                    room,
                    session.room()
                );
                None
            }
            None => None,
        }
    }

    /// Returns false if a session already exists or the transport could not be built.
    async fn start_session(&mut self, room: RoomId, polite: bool) -> bool {
        if let Some(existing) = &self.session {
            warn!(
                "Already in call '{}', ignoring call '{}'",
                existing.room(),
                room
            );
            return false;
        }

        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_EVENT_BUFFER);
        let transport = match self.factory.create(transport_tx).await {
            Ok(transport) => transport,
            Err(e) => {
                error!("Failed to create transport: {:#}", e);
                return false;
            }
        };

        info!(
            "Starting session in '{}' as the {} peer",
            room,
            if polite { "polite" } else { "impolite" }
        );
        self.transport_rx = Some(transport_rx);
        let config = self.negotiation.clone().polite(polite);
        self.session = Some(Arc::new(NegotiationSession::new(
            room,
            config,
            transport,
            self.signaling.clone(),
        )));
        true
    }

    async fn open_channel(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        if let Err(e) = session.transport().open_data_channel().await {
            error!("Failed to open data channel: {:#}", e);
            session.diagnostic("data channel could not be created").await;
        }
    }

    async fn end_session(&mut self, notify_peer: bool) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.close(notify_peer).await;

        // Whatever the old transport still has queued belongs to the finished call.
        self.transport_rx = None;
        self.channel_open = false;
        self.pending_send = None;
        self.clear_early_frames();
        if let Err(e) = self.receiver.on_channel_closed() {
            self.emit(PeerEvent::TransferFailed(e));
        }
        self.emit(PeerEvent::Closed);
    }

    fn accept_metadata(&mut self, metadata: FileMetadata) {
        self.emit(PeerEvent::FileOffered(metadata.clone()));
        match self.receiver.on_metadata(metadata) {
            Ok(Some(file)) => self.emit(PeerEvent::FileReceived(file)),
            Ok(None) => {}
            Err(e) => self.emit(PeerEvent::TransferFailed(e)),
        }

        let early = std::mem::take(&mut self.early_frames);
        self.clear_early_frames();
        for frame in early {
            self.accept_frame(frame);
        }
    }

    fn clear_early_frames(&mut self) {
        self.early_frames.clear();
        self.early_bytes = 0;
        self.early_overflow = false;
    }

    fn hold_early_frame(&mut self, bytes: Bytes) {
        if self.early_bytes + bytes.len() > MAX_EARLY_BYTES {
            if !self.early_overflow {
                self.early_overflow = true;
                warn!(
                    "Dropping chunks: {} bytes arrived before any file metadata",
                    self.early_bytes
                );
                self.emit(PeerEvent::TransferFailed(TransferError::MissingMetadata));
            }
            return;
        }
        self.early_bytes += bytes.len();
        self.early_frames.push(bytes);
    }

    fn accept_frame(&mut self, bytes: Bytes) {
        match self.receiver.on_frame(&bytes) {
            Ok(Some(file)) => self.emit(PeerEvent::FileReceived(file)),
            Ok(None) => {
                if let Some(progress) = self.receiver.progress() {
                    self.emit(PeerEvent::ReceiveProgress(progress));
                }
            }
            Err(TransferError::MissingMetadata) => self.hold_early_frame(bytes),
            Err(e) => self.emit(PeerEvent::TransferFailed(e)),
        }
    }

    fn start_pending_send(&mut self) {
        if !self.channel_open {
            return;
        }
        let Some(session) = self.session.clone() else {
            return;
        };
        let Some((metadata, mut sender)) = self.pending_send.take() else {
            return;
        };

        let signaling = self.signaling.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result: Result<u64, TransferError> = async {
                signaling
                    .send(SignalMessage::FileMetadata {
                        metadata,
                        room: session.room().clone(),
                    })
                    .await?;
                sender
                    .send_all(session.transport().as_ref(), |progress| {
                        let _ = events.send(PeerEvent::SendProgress(progress));
                    })
                    .await
            }
            .await;

            let event = match result {
                Ok(bytes) => PeerEvent::FileSent { bytes },
                Err(e) => {
                    warn!("Transfer aborted: {}", e);
                    PeerEvent::TransferFailed(e)
                }
            };
            let _ = events.send(event);
        });
    }
}

async fn next_transport_event(rx: &mut Option<mpsc::Receiver<TransportEvent>>) -> TransportEvent {
    match rx {
        Some(rx) => match rx.recv().await {
            Some(event) => event,
            None => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}
