use anyhow::{Context, Result, bail};
use colored::*;
use dialoguer::Confirm;
use parley_client::transfer::describe_file;
use parley_client::{
    DriverCommand, FileSender, NegotiationConfig, PeerDriver, PeerEvent, SignalingClient,
    TransportConfig, WebRtcTransportFactory,
};
use parley_core::{ConnectionId, IceServerConfig};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// How long the sender waits for the receiver to hang up after the last chunk.
const HANGUP_GRACE: Duration = Duration::from_secs(10);

pub struct ConnectOptions {
    pub server: String,
    pub name: Option<String>,
    pub echo_diagnostics: bool,
}

struct Endpoint {
    id: ConnectionId,
    commands: mpsc::UnboundedSender<DriverCommand>,
    events: mpsc::UnboundedReceiver<PeerEvent>,
}

impl Endpoint {
    async fn start(options: ConnectOptions, turn: Option<IceServerConfig>) -> Result<Self> {
        // An empty name lets the relay pick a guest name.
        let name = options.name.unwrap_or_default();
        let (client, signals) = SignalingClient::connect(&options.server, &name)
            .await
            .with_context(|| format!("Failed to reach relay at {}", options.server))?;

        let mut ice_servers = client.ice_servers().to_vec();
        ice_servers.extend(turn);
        let transport = TransportConfig::default().with_ice_servers(ice_servers);
        let negotiation = NegotiationConfig {
            echo_diagnostics: options.echo_diagnostics,
            diagnostic_name: if name.is_empty() {
                client.connection_id().short()
            } else {
                name.clone()
            },
            ..NegotiationConfig::default()
        };

        let (driver, events) = PeerDriver::new(
            name,
            Arc::new(client.clone()),
            Arc::new(WebRtcTransportFactory::new(transport)),
            negotiation,
        );
        let (commands, commands_rx) = mpsc::unbounded_channel();
        tokio::spawn(driver.run(signals, commands_rx));

        Ok(Self {
            id: client.connection_id(),
            commands,
            events,
        })
    }

    fn command(&self, cmd: DriverCommand) -> Result<()> {
        self.commands
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Peer driver stopped"))
    }

    async fn next(&mut self) -> Result<PeerEvent> {
        self.events.recv().await.context("Relay connection closed")
    }

    async fn hang_up(&mut self) -> Result<()> {
        self.command(DriverCommand::Hangup)?;
        loop {
            if let PeerEvent::Closed = self.next().await? {
                return Ok(());
            }
        }
    }
}

fn show_progress(label: &str, progress: parley_client::TransferProgress) {
    print!("\r{} {}", label.cyan(), progress);
    let _ = std::io::stdout().flush();
}

pub async fn send(
    options: ConnectOptions,
    turn: Option<IceServerConfig>,
    to: &str,
    file: &Path,
) -> Result<()> {
    let metadata = describe_file(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let sender = FileSender::open(file).await?;

    let mut endpoint = Endpoint::start(options, turn).await?;
    println!("{} {}", "Connected as".green(), endpoint.id);
    println!("Looking for '{}'...", to.bold());

    let target = loop {
        if let PeerEvent::Presence(entries) = endpoint.next().await? {
            if let Some(entry) = entries.iter().find(|e| e.display_name == to) {
                break entry.connection_id;
            }
            debug!("'{}' not online yet ({} connected)", to, entries.len());
        }
    };

    endpoint.command(DriverCommand::Call { target })?;
    println!("{} {}", "Calling".cyan(), to.bold());

    let mut pending = Some((metadata, sender));
    loop {
        match endpoint.next().await? {
            PeerEvent::CallStarted { room, .. } => debug!("Call room '{}'", room),
            PeerEvent::ChannelOpen => {
                if let Some((metadata, sender)) = pending.take() {
                    println!(
                        "{} sending '{}' ({} bytes)",
                        "Connected,".green(),
                        metadata.name,
                        metadata.size
                    );
                    endpoint.command(DriverCommand::SendFile { metadata, sender })?;
                }
            }
            PeerEvent::SendProgress(progress) => show_progress("sent", progress),
            PeerEvent::FileSent { bytes } => {
                println!("\n{} {} bytes", "Done:".green().bold(), bytes);
                break;
            }
            PeerEvent::TransferFailed(e) => {
                endpoint.hang_up().await?;
                bail!("Transfer failed: {}", e);
            }
            PeerEvent::Closed => bail!("Call ended before the transfer finished"),
            _ => {}
        }
    }

    let closed_by_peer = tokio::time::timeout(HANGUP_GRACE, async {
        loop {
            if let PeerEvent::Closed = endpoint.next().await? {
                return Ok::<_, anyhow::Error>(());
            }
        }
    })
    .await;
    match closed_by_peer {
        Ok(result) => result,
        Err(_) => endpoint.hang_up().await,
    }
}

pub async fn receive(
    options: ConnectOptions,
    turn: Option<IceServerConfig>,
    out: &Path,
    yes: bool,
) -> Result<()> {
    let mut endpoint = Endpoint::start(options, turn).await?;
    println!(
        "{} {}, waiting for a call...",
        "Connected as".green(),
        endpoint.id
    );

    loop {
        match endpoint.next().await? {
            PeerEvent::CallStarted { room, .. } => {
                println!("{} (room '{}')", "Incoming call".cyan(), room)
            }
            PeerEvent::ChannelOpen => println!("{}", "Connected".green()),
            PeerEvent::FileOffered(metadata) => {
                let prompt = format!("Accept '{}' ({} bytes)?", metadata.name, metadata.size);
                let accepted = yes
                    || tokio::task::spawn_blocking(move || {
                        Confirm::new().with_prompt(prompt).default(true).interact()
                    })
                    .await??;
                if !accepted {
                    println!("{}", "Declined".yellow());
                    endpoint.hang_up().await?;
                }
            }
            PeerEvent::ReceiveProgress(progress) => show_progress("received", progress),
            PeerEvent::FileReceived(file) => {
                let name = Path::new(&file.metadata.name)
                    .file_name()
                    .map(|n| n.to_owned())
                    .unwrap_or_else(|| "received.bin".into());
                let path = out.join(name);
                tokio::fs::write(&path, &file.data)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;

                println!(
                    "\n{} {} ({} bytes)",
                    "Saved".green().bold(),
                    path.display(),
                    file.data.len()
                );
                return endpoint.hang_up().await;
            }
            PeerEvent::TransferFailed(e) => {
                println!("\n{} {}", "Transfer failed:".red().bold(), e);
                endpoint.hang_up().await?;
            }
            PeerEvent::Closed => println!("{}", "Call ended".yellow()),
            _ => {}
        }
    }
}
