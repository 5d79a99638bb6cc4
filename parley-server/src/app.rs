use crate::config::ServerConfig;
use crate::hub::{HubHandle, HubStats};
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub signaling: SignalingService,
    pub hub: HubHandle,
}

impl AppState {
    /// Must be called inside a tokio runtime: the hub task is spawned here.
    pub fn new(config: &ServerConfig) -> Self {
        let signaling = SignalingService::new();
        let hub = HubHandle::spawn(config, Arc::new(signaling.clone()));
        Self { signaling, hub }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<HubStats>, StatusCode> {
    state.hub.stats().await.map(Json).map_err(|e| {
        error!("Health check failed: {:?}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    serve_on(listener, config).await
}

/// Serves on an already bound listener (tests bind port 0).
pub async fn serve_on(listener: TcpListener, config: ServerConfig) -> Result<()> {
    let state = AppState::new(&config);
    let app = router(state);

    info!(
        "Signaling server listening on ws://{}/ws",
        listener.local_addr()?
    );
    axum::serve(listener, app)
        .await
        .context("Signaling server stopped")
}
