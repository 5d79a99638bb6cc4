use crate::error::ClientError;
use crate::signaling::SignalSink;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parley_core::{ConnectionId, IceServerConfig, SignalMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

/// WebSocket connection to the relay.
///
/// Writes go through an unbounded queue drained by a writer task; decoded inbound frames
/// are handed out through the receiver returned by [`SignalingClient::connect`].
#[derive(Clone)]
pub struct SignalingClient {
    connection_id: ConnectionId,
    ice_servers: Vec<IceServerConfig>,
    outgoing: mpsc::UnboundedSender<SignalMessage>,
}

impl SignalingClient {
    /// Connects to `ws://host:port/ws` and waits for the `welcome` and `ice-config`
    /// handshake frames.
    pub async fn connect(
        url: &str,
        display_name: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SignalMessage>), ClientError> {
        let url = relay_url(url, display_name)?;
        debug!("Connecting to {}", url);
        let (socket, _) = connect_async(url.as_str()).await?;
        let (mut write, mut read) = socket.split();

        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<SignalMessage>();
        let (incoming_tx, mut incoming) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                let json = match msg.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to encode {}: {}", msg.kind(), e);
                        continue;
                    }
                };
                if write.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = write.close().await;
            debug!("Signaling writer finished");
        });

        tokio::spawn(async move {
            while let Some(Ok(frame)) = read.next().await {
                match frame {
                    Message::Text(text) => match SignalMessage::from_json(text.as_str()) {
                        Ok(msg) => {
                            if incoming_tx.send(msg).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping undecodable frame: {}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            debug!("Signaling reader finished");
        });

        let connection_id = match incoming.recv().await {
            Some(SignalMessage::Welcome { connection_id }) => connection_id,
            Some(other) => return Err(ClientError::Handshake(other.kind().to_string())),
            None => return Err(ClientError::ChannelClosed),
        };
        let ice_servers = match incoming.recv().await {
            Some(SignalMessage::IceConfig { ice_servers }) => ice_servers,
            Some(other) => return Err(ClientError::Handshake(other.kind().to_string())),
            None => return Err(ClientError::ChannelClosed),
        };
        info!("Connected to relay as {:?}", connection_id);

        Ok((
            Self {
                connection_id,
                ice_servers,
                outgoing,
            },
            incoming,
        ))
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn ice_servers(&self) -> &[IceServerConfig] {
        &self.ice_servers
    }

    pub fn send_now(&self, message: SignalMessage) -> Result<(), ClientError> {
        self.outgoing
            .send(message)
            .map_err(|_| ClientError::ChannelClosed)
    }
}

fn relay_url(base: &str, display_name: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut().append_pair("name", display_name);
    Ok(url)
}

#[async_trait]
impl SignalSink for SignalingClient {
    async fn send(&self, message: SignalMessage) -> Result<(), ClientError> {
        self.send_now(message)
    }
}
