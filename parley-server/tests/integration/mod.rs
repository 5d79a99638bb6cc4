
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use parley_server::{HubHandle, ServerConfig};

use crate::utils::{MockSignalingOutput, SentSignal};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_hub() -> (
    HubHandle,
    MockSignalingOutput,
    mpsc::UnboundedReceiver<SentSignal>,
) {
    create_test_hub_with(ServerConfig::default())
}

pub fn create_test_hub_with(
    config: ServerConfig,
) -> (
    HubHandle,
    MockSignalingOutput,
    mpsc::UnboundedReceiver<SentSignal>,
) {
    let (signaling, signal_rx) = MockSignalingOutput::new();
    let hub = HubHandle::spawn(&config, Arc::new(signaling.clone()));
    (hub, signaling, signal_rx)
}
