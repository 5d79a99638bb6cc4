use anyhow::{Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use parley_client::{PeerTransport, TransportEvent, TransportFactory};
use parley_core::{IceCandidate, SdpKind, SessionDescription};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};

/// In-memory PeerTransport.
///
/// Records every call. When built with an event channel it also behaves like a tiny
/// peer connection: opening the channel asks for negotiation, setting a local
/// description yields one candidate, applying an answer opens the channel on both ends
/// and `send_data` delivers to the linked peer.
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<String>>,
    sent: Mutex<Vec<Bytes>>,
    offers: AtomicUsize,
    answers: AtomicUsize,
    fail_offer: AtomicBool,
    events: Option<mpsc::Sender<TransportEvent>>,
    peer: Mutex<Option<mpsc::Sender<TransportEvent>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: mpsc::Sender<TransportEvent>) -> Self {
        Self {
            events: Some(events),
            ..Self::default()
        }
    }

    pub fn fail_offers(&self) {
        self.fail_offer.store(true, Ordering::SeqCst);
    }

    pub fn offers_created(&self) -> usize {
        self.offers.load(Ordering::SeqCst)
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub async fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().await.clone()
    }

    async fn record(&self, call: String) {
        self.calls.lock().await.push(call);
    }

    async fn emit(&self, event: TransportEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn create_offer(&self) -> Result<SessionDescription> {
        // Suspend once, like a real transport would.
        tokio::task::yield_now().await;
        if self.fail_offer.load(Ordering::SeqCst) {
            bail!("offer refused");
        }
        let n = self.offers.fetch_add(1, Ordering::SeqCst) + 1;
        self.record("create-offer".into()).await;
        Ok(SessionDescription::offer(format!("offer-{n}")))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let n = self.answers.fetch_add(1, Ordering::SeqCst) + 1;
        self.record("create-answer".into()).await;
        Ok(SessionDescription::answer(format!("answer-{n}")))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.record(format!("set-local:{}", description.sdp)).await;
        self.emit(TransportEvent::CandidateGenerated(IceCandidate {
            candidate: format!("candidate-for-{}", description.sdp),
            sdp_mid: Some("0".into()),
            sdp_m_line_index: Some(0),
        }))
        .await;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.record(format!("set-remote:{}", description.sdp)).await;
        if description.kind == SdpKind::Answer {
            self.emit(TransportEvent::DataChannelOpen).await;
            if let Some(peer) = self.peer.lock().await.as_ref() {
                let _ = peer.send(TransportEvent::DataChannelOpen).await;
            }
        }
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.record(format!("candidate:{}", candidate.candidate)).await;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.record("rollback".into()).await;
        Ok(())
    }

    async fn open_data_channel(&self) -> Result<()> {
        self.record("open-data-channel".into()).await;
        self.emit(TransportEvent::NegotiationNeeded).await;
        Ok(())
    }

    async fn send_data(&self, data: Bytes) -> Result<()> {
        self.sent.lock().await.push(data.clone());
        if let Some(peer) = self.peer.lock().await.as_ref() {
            peer.send(TransportEvent::Message(data)).await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record("close".into()).await;
        Ok(())
    }
}

/// Hands out MockTransports in pairs; the second of each pair is wired to the first.
#[derive(Default)]
pub struct LinkedTransportFactory {
    unpaired: Mutex<Option<(Arc<MockTransport>, mpsc::Sender<TransportEvent>)>>,
}

impl LinkedTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransportFactory for LinkedTransportFactory {
    async fn create(
        &self,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>> {
        let transport = Arc::new(MockTransport::with_events(events.clone()));

        let mut unpaired = self.unpaired.lock().await;
        match unpaired.take() {
            Some((first, first_events)) => {
                *first.peer.lock().await = Some(events);
                *transport.peer.lock().await = Some(first_events);
            }
            None => *unpaired = Some((transport.clone(), events)),
        }

        Ok(transport)
    }
}

/// Wraps another factory and keeps the event sender of every transport it built.
pub struct RetainingFactory {
    inner: Arc<dyn TransportFactory>,
    handed_out: Mutex<Vec<mpsc::Sender<TransportEvent>>>,
}

impl RetainingFactory {
    pub fn new(inner: Arc<dyn TransportFactory>) -> Self {
        Self {
            inner,
            handed_out: Mutex::new(Vec::new()),
        }
    }

    pub async fn event_senders(&self) -> Vec<mpsc::Sender<TransportEvent>> {
        self.handed_out.lock().await.clone()
    }
}

#[async_trait]
impl TransportFactory for RetainingFactory {
    async fn create(
        &self,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>> {
        self.handed_out.lock().await.push(events.clone());
        self.inner.create(events).await
    }
}
