use crate::app::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use parley_core::{ConnectionId, SignalMessage};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub name: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, params.name, state))
}

async fn handle_socket(socket: WebSocket, display_name: Option<String>, state: AppState) {
    let connection_id = ConnectionId::new();
    info!("New WebSocket connection: {:?}", connection_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // The sink must exist before the hub greets the connection.
    state.signaling.add_peer(connection_id, tx);
    if let Err(e) = state.hub.connect(connection_id, display_name).await {
        error!("Hub died: {:?}", e);
        state.signaling.remove_peer(&connection_id);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let hub = state.hub.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match SignalMessage::from_json(text.as_str()) {
                        Ok(signal) => {
                            if let Err(e) = hub.inbound(connection_id, signal).await {
                                error!("Hub died: {:?}", e);
                                break;
                            }
                        }
                        Err(e) => warn!(
                            "Dropping unknown frame from {:?}: {}",
                            connection_id, e
                        ),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    if let Err(e) = state.hub.disconnect(connection_id).await {
        error!("Failed to report disconnect of {:?}: {:?}", connection_id, e);
    }
    state.signaling.remove_peer(&connection_id);
    info!("WebSocket disconnected: {:?}", connection_id);
}
