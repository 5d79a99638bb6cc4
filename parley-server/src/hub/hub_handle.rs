use crate::config::ServerConfig;
use crate::hub::{Hub, HubCommand, HubStats};
use crate::signaling::SignalingOutput;
use anyhow::{Context, Result};
use parley_core::{ConnectionId, SignalMessage};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Cheap, cloneable sender side of the hub actor.
#[derive(Clone)]
pub struct HubHandle {
    command_tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Spawns the hub onto the current runtime.
    pub fn spawn(config: &ServerConfig, signaling: Arc<dyn SignalingOutput>) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let hub = Hub::new(config, command_rx, signaling);
        tokio::spawn(hub.run());

        Self { command_tx }
    }

    pub async fn connect(
        &self,
        connection_id: ConnectionId,
        display_name: Option<String>,
    ) -> Result<()> {
        self.command(HubCommand::Connect {
            connection_id,
            display_name,
        })
        .await
    }

    pub async fn inbound(&self, connection_id: ConnectionId, message: SignalMessage) -> Result<()> {
        self.command(HubCommand::Inbound {
            connection_id,
            message,
        })
        .await
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) -> Result<()> {
        self.command(HubCommand::Disconnect { connection_id }).await
    }

    /// Also acts as a barrier: every command sent before it has been handled when it
    /// returns.
    pub async fn stats(&self) -> Result<HubStats> {
        let (reply, rx) = oneshot::channel();
        self.command(HubCommand::Stats { reply }).await?;
        rx.await.context("Hub dropped the stats request")
    }

    async fn command(&self, cmd: HubCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .context("Hub command channel closed")
    }
}
