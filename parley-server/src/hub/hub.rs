use crate::config::ServerConfig;
use crate::hub::call_router::CallRouter;
use crate::hub::dispatch::{Delivery, DispatchTable, Route};
use crate::hub::hub_command::{HubCommand, HubStats};
use crate::registry::{PresenceDirectory, RoomRegistry};
use crate::signaling::SignalingOutput;
use parley_core::utils::guest_name;
use parley_core::{ConnectionId, IceServerConfig, RoomId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The relay's single point of mutation.
///
/// Room membership, presence and call allocation live here and are only touched from
/// [`Hub::run`], one command at a time.
pub struct Hub {
    rooms: RoomRegistry,
    presence: PresenceDirectory,
    calls: CallRouter,
    dispatch: DispatchTable,
    ice_servers: Vec<IceServerConfig>,
    command_rx: mpsc::Receiver<HubCommand>,
    signaling: Arc<dyn SignalingOutput>,
}

impl Hub {
    pub fn new(
        config: &ServerConfig,
        command_rx: mpsc::Receiver<HubCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            rooms: RoomRegistry::new(),
            presence: PresenceDirectory::new(),
            calls: CallRouter::new(),
            dispatch: config.dispatch.clone(),
            ice_servers: config.ice_servers.clone(),
            command_rx,
            signaling,
        }
    }

    pub async fn run(mut self) {
        info!("Hub event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Hub event loop finished");
    }

    async fn handle_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Connect {
                connection_id,
                display_name,
            } => self.connect(connection_id, display_name).await,

            HubCommand::Inbound {
                connection_id,
                message,
            } => self.handle_inbound(connection_id, message).await,

            HubCommand::Disconnect { connection_id } => self.disconnect(connection_id).await,

            HubCommand::Stats { reply } => {
                let _ = reply.send(HubStats {
                    connections: self.presence.len(),
                    rooms: self.rooms.room_count(),
                });
            }
        }
    }

    async fn connect(&mut self, connection_id: ConnectionId, display_name: Option<String>) {
        let display_name = display_name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| guest_name(&connection_id));

        if self.presence.contains(connection_id) {
            warn!("Connection {:?} registered twice", connection_id);
        }
        info!("Connection {:?} registered as '{}'", connection_id, display_name);
        self.presence.register(connection_id, display_name);

        self.signaling
            .send(connection_id, SignalMessage::Welcome { connection_id })
            .await;
        self.signaling
            .send(
                connection_id,
                SignalMessage::IceConfig {
                    ice_servers: self.ice_servers.clone(),
                },
            )
            .await;

        self.publish_presence().await;
    }

    async fn disconnect(&mut self, connection_id: ConnectionId) {
        let left = self.rooms.remove_everywhere(connection_id);
        let was_present = self.presence.unregister(connection_id).is_some();

        info!(
            "Connection {:?} gone, removed from {} room(s)",
            connection_id,
            left.len()
        );

        if was_present {
            self.publish_presence().await;
        }
    }

    async fn handle_inbound(&mut self, from: ConnectionId, message: SignalMessage) {
        let kind = message.kind();
        if !self.presence.contains(from) {
            debug!("Dropping {} from unregistered connection {:?}", kind, from);
            return;
        }

        match (self.dispatch.route(kind), message) {
            (Route::Join { notify }, SignalMessage::JoinRoom { room }) => {
                self.join_room(from, room, notify).await
            }
            (Route::Leave, SignalMessage::LeaveRoom { room }) => {
                if self.rooms.leave(from, &room) {
                    info!("Connection {:?} left room '{}'", from, room);
                }
            }
            (Route::Call, SignalMessage::CallRequest { target }) => {
                self.request_call(from, target).await
            }
            (Route::Relay(delivery), message) => self.relay(from, message, delivery).await,
            (_, message) => {
                warn!("Dropping unroutable {} from {:?}", message.kind(), from);
            }
        }
    }

    async fn join_room(&mut self, from: ConnectionId, room: RoomId, notify: Option<Delivery>) {
        if !self.rooms.join(from, &room) {
            debug!("Connection {:?} already in room '{}'", from, room);
            return;
        }
        info!("Connection {:?} joined room '{}'", from, room);

        let Some(delivery) = notify else {
            return;
        };
        let notice = SignalMessage::MemberJoined {
            room: room.clone(),
            connection_id: from,
        };
        self.broadcast(&room, from, notice, delivery).await;
    }

    async fn request_call(&mut self, caller: ConnectionId, callee: ConnectionId) {
        let Some(room) =
            self.calls
                .request_call(caller, callee, &self.presence, &mut self.rooms)
        else {
            debug!(
                "Call from {:?} to {:?} dropped: callee not connected",
                caller, callee
            );
            return;
        };

        info!("Call {:?} -> {:?} assigned room '{}'", caller, callee, room);
        self.signaling
            .send(caller, SignalMessage::JoinedSignalRoom { room, peer: callee })
            .await;
    }

    async fn relay(&mut self, from: ConnectionId, message: SignalMessage, delivery: Delivery) {
        let Some(room) = message.room().cloned() else {
            warn!("Dropping {} from {:?}: no target room", message.kind(), from);
            return;
        };
        self.broadcast(&room, from, message, delivery).await;
    }

    async fn broadcast(
        &self,
        room: &RoomId,
        sender: ConnectionId,
        message: SignalMessage,
        delivery: Delivery,
    ) {
        let targets = self
            .rooms
            .broadcast_targets(room, sender, delivery.excludes_sender());
        if targets.is_empty() {
            debug!("No recipients for {} in room '{}'", message.kind(), room);
            return;
        }
        self.signaling.send_many(&targets, message).await;
    }

    /// Full snapshot to every live connection, never a diff.
    async fn publish_presence(&self) {
        let targets = self.presence.connection_ids();
        let update = SignalMessage::PresenceUpdate {
            entries: self.presence.snapshot(),
        };
        self.signaling.send_many(&targets, update).await;
    }
}
