use crate::config::TransportConfig;
use crate::transport::{PeerTransport, TransportEvent, TransportFactory};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use parley_core::{IceCandidate, SdpKind, SessionDescription};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::setting_engine::SettingEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;

/// Writes wait while more than this much is queued on the data channel.
const MAX_BUFFERED_AMOUNT: usize = 1024 * 1024;

/// [`PeerTransport`] over a `webrtc` peer connection carrying one data channel.
pub struct WebRtcTransport {
    config: TransportConfig,
    peer_connection: Arc<RTCPeerConnection>,
    data_channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
    events: mpsc::Sender<TransportEvent>,
}

impl WebRtcTransport {
    /// `events` receives everything the connection raises until [`PeerTransport::close`].
    pub async fn new(config: TransportConfig, events: mpsc::Sender<TransportEvent>) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let mut settings = SettingEngine::default();
        settings.set_include_loopback_candidate(config.include_loopback_candidates);

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .with_setting_engine(settings)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let transport = Self {
            config,
            peer_connection,
            data_channel: Arc::new(Mutex::new(None)),
            events,
        };
        transport.attach_handlers();
        Ok(transport)
    }

    fn attach_handlers(&self) {
        let pc = &self.peer_connection;

        let state_tx = self.events.clone();
        pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            Box::pin(async move {
                info!("Peer connection state changed: {:?}", s);
                if matches!(
                    s,
                    RTCPeerConnectionState::Failed
                        | RTCPeerConnectionState::Disconnected
                        | RTCPeerConnectionState::Closed
                ) {
                    let _ = tx.send(TransportEvent::Disconnected).await;
                }
            })
        }));

        let negotiation_tx = self.events.clone();
        pc.on_negotiation_needed(Box::new(move || {
            let tx = negotiation_tx.clone();
            Box::pin(async move {
                let _ = tx.send(TransportEvent::NegotiationNeeded).await;
            })
        }));

        let ice_tx = self.events.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx.send(TransportEvent::CandidateGenerated(candidate)).await;
            })
        }));

        // The answering side learns about the channel here.
        let dc_tx = self.events.clone();
        let slot = self.data_channel.clone();
        pc.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let slot = slot.clone();
            Box::pin(async move {
                debug!("Remote opened data channel '{}'", dc.label());
                *slot.lock().await = Some(dc.clone());
                wire_channel(&dc, tx);
            })
        }));
    }

    fn detach_handlers(&self) {
        let pc = &self.peer_connection;
        pc.on_peer_connection_state_change(Box::new(|_| Box::pin(async {})));
        pc.on_negotiation_needed(Box::new(|| Box::pin(async {})));
        pc.on_ice_candidate(Box::new(|_| Box::pin(async {})));
        pc.on_data_channel(Box::new(|_| Box::pin(async {})));
    }

    async fn open_channel(&self) -> Result<Arc<RTCDataChannel>> {
        let Some(dc) = self.data_channel.lock().await.clone() else {
            bail!("No data channel");
        };
        if dc.ready_state() != RTCDataChannelState::Open {
            bail!("Data channel is {:?}", dc.ready_state());
        }
        Ok(dc)
    }
}

fn wire_channel(dc: &Arc<RTCDataChannel>, tx: mpsc::Sender<TransportEvent>) {
    let tx_open = tx.clone();
    let label = dc.label().to_owned();
    dc.on_open(Box::new(move || {
        let tx = tx_open.clone();
        Box::pin(async move {
            info!("DataChannel '{}' open and ready", label);
            let _ = tx.send(TransportEvent::DataChannelOpen).await;
        })
    }));

    let tx_msg = tx.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = tx_msg.clone();
        Box::pin(async move {
            let _ = tx.send(TransportEvent::Message(msg.data)).await;
        })
    }));

    dc.on_close(Box::new(move || {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(TransportEvent::DataChannelClosed).await;
        })
    }));
}

fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription> {
    let desc = match description.kind {
        SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
    };
    Ok(desc)
}

fn from_rtc(description: RTCSessionDescription) -> Result<SessionDescription> {
    match description.sdp_type {
        RTCSdpType::Offer => Ok(SessionDescription::offer(description.sdp)),
        RTCSdpType::Answer => Ok(SessionDescription::answer(description.sdp)),
        other => bail!("Unsupported description type {:?}", other),
    }
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn create_offer(&self) -> Result<SessionDescription> {
        from_rtc(self.peer_connection.create_offer(None).await?)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        from_rtc(self.peer_connection.create_answer(None).await?)
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(to_rtc(description)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc(description)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        match self.peer_connection.signaling_state() {
            RTCSignalingState::HaveLocalOffer => {}
            RTCSignalingState::Stable => {
                debug!("Rollback requested before the local offer was applied");
                return Ok(());
            }
            other => bail!("Cannot roll back in signaling state {}", other),
        }

        // An empty SDP is only filled in for offers and answers, so the rollback carries
        // the offer it withdraws.
        let Some(mut rollback) = self.peer_connection.pending_local_description().await else {
            bail!("No local offer to roll back");
        };
        rollback.sdp_type = RTCSdpType::Rollback;
        self.peer_connection
            .set_local_description(rollback)
            .await
            .context("Failed to roll back local offer")?;
        Ok(())
    }

    async fn open_data_channel(&self) -> Result<()> {
        let init = RTCDataChannelInit {
            ordered: Some(self.config.ordered),
            max_packet_life_time: Some(self.config.max_packet_life_time_ms),
            ..Default::default()
        };
        let dc = self
            .peer_connection
            .create_data_channel(&self.config.channel_label, Some(init))
            .await
            .context("Failed to create data channel")?;

        wire_channel(&dc, self.events.clone());
        *self.data_channel.lock().await = Some(dc);
        Ok(())
    }

    async fn send_data(&self, data: Bytes) -> Result<()> {
        let dc = self.open_channel().await?;
        while dc.buffered_amount().await > MAX_BUFFERED_AMOUNT {
            if dc.ready_state() != RTCDataChannelState::Open {
                bail!("Data channel closed while draining");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        dc.send(&data).await.context("Failed to write to data channel")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.detach_handlers();
        if let Some(dc) = self.data_channel.lock().await.take() {
            dc.on_open(Box::new(|| Box::pin(async {})));
            dc.on_message(Box::new(|_| Box::pin(async {})));
            dc.on_close(Box::new(|| Box::pin(async {})));
            dc.close().await?;
        }
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Builds a [`WebRtcTransport`] per call from one [`TransportConfig`].
#[derive(Clone, Default)]
pub struct WebRtcTransportFactory {
    config: TransportConfig,
}

impl WebRtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>> {
        let transport = WebRtcTransport::new(self.config.clone(), events).await?;
        Ok(Arc::new(transport))
    }
}
