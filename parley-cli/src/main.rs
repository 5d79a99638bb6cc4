mod peer;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use parley_core::IceServerConfig;
use parley_server::ServerConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parley", version, about = "Rendezvous relay and peer-to-peer file transfer")]
struct Cli {
    #[command(flatten)]
    turn: TurnArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Optional TURN server, advertised by `serve` and used by `send`/`receive`.
#[derive(clap::Args)]
struct TurnArgs {
    #[arg(long, env = "TURN_URL", global = true)]
    turn_url: Option<String>,

    #[arg(long, env = "TURN_USERNAME", global = true)]
    turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL", global = true)]
    turn_credential: Option<String>,
}

impl TurnArgs {
    fn server(&self) -> Option<IceServerConfig> {
        let url = self.turn_url.clone()?;
        Some(IceServerConfig {
            urls: vec![url],
            username: self.turn_username.clone(),
            credential: self.turn_credential.clone(),
        })
    }
}

#[derive(clap::Args)]
struct ConnectArgs {
    #[arg(long, env = "PARLEY_SERVER", default_value = "ws://127.0.0.1:3000/ws")]
    server: String,

    /// Display name announced to the relay.
    #[arg(long)]
    name: Option<String>,

    /// Echo negotiation diagnostics to the call room.
    #[arg(long)]
    verbose_room: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(long, env = "PARLEY_BIND", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,
    },
    /// Call a peer by display name and send it a file.
    Send {
        #[command(flatten)]
        connect: ConnectArgs,

        #[arg(long)]
        to: String,

        #[arg(long)]
        file: PathBuf,
    },
    /// Wait for a call and save the file it carries.
    Receive {
        #[command(flatten)]
        connect: ConnectArgs,

        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Accept without asking.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let turn = cli.turn.server();

    match cli.command {
        Commands::Serve { bind } => {
            let mut config = ServerConfig {
                bind,
                ..ServerConfig::default()
            };
            config.ice_servers.extend(turn);

            println!("{}", format!("Relay listening on ws://{}/ws", bind).green().bold());
            parley_server::serve(config).await
        }
        Commands::Send { connect, to, file } => peer::send(connect.into(), turn, &to, &file).await,
        Commands::Receive {
            connect,
            out,
            yes,
        } => peer::receive(connect.into(), turn, &out, yes).await,
    }
}

impl From<ConnectArgs> for peer::ConnectOptions {
    fn from(args: ConnectArgs) -> Self {
        Self {
            server: args.server,
            name: args.name,
            echo_diagnostics: args.verbose_room,
        }
    }
}
