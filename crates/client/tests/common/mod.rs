#![allow(dead_code)]

//! Shared test harness: an in-memory transport the scenario tests drive
//! from the collector side.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use logship_client::proto::critical_logs_response::Status;
use logship_client::proto::{CriticalLogsMessage, CriticalLogsResponse, HttpLogEntry, TcpLogEntry};
use logship_client::{publish_id, LogStream, LogStreamTransport, TransportError};

/// Collector-side control surface.
///
/// Every opened stream records its writes here; responses are injected
/// into whichever stream is currently open.
#[derive(Default)]
pub struct MockPeer {
    opens: AtomicUsize,
    fail_open: AtomicBool,
    watermark: AtomicBool,
    sent: Mutex<Vec<CriticalLogsMessage>>,
    responses: Mutex<Option<mpsc::Sender<CriticalLogsResponse>>>,
}

impl MockPeer {
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn set_watermark(&self, above: bool) {
        self.watermark.store(above, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<CriticalLogsMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub async fn ack(&self, id: u32) {
        self.respond(id, Status::Ack).await;
    }

    pub async fn nack(&self, id: u32) {
        self.respond(id, Status::Nack).await;
    }

    pub async fn respond(&self, id: u32, status: Status) {
        let sender = self.responses.lock().unwrap().clone();
        if let Some(sender) = sender {
            let _ = sender
                .send(CriticalLogsResponse {
                    id,
                    status: status as i32,
                })
                .await;
        }
    }

    /// Terminates the currently open stream from the collector side.
    pub fn close_stream(&self) {
        self.responses.lock().unwrap().take();
    }
}

pub struct MockTransport {
    peer: Arc<MockPeer>,
}

impl MockTransport {
    pub fn new() -> (Arc<MockPeer>, MockTransport) {
        let peer = Arc::new(MockPeer::default());
        let transport = MockTransport { peer: peer.clone() };
        (peer, transport)
    }
}

pub struct MockStream {
    peer: Arc<MockPeer>,
    responses: mpsc::Receiver<CriticalLogsResponse>,
}

#[async_trait]
impl LogStreamTransport for MockTransport {
    type Stream = MockStream;

    async fn open(&mut self) -> Result<MockStream, TransportError> {
        self.peer.opens.fetch_add(1, Ordering::SeqCst);
        if self.peer.fail_open.load(Ordering::SeqCst) {
            return Err(TransportError::OpenFailed {
                message: "collector unavailable".to_string(),
            });
        }
        let (tx, rx) = mpsc::channel(16);
        *self.peer.responses.lock().unwrap() = Some(tx);
        Ok(MockStream {
            peer: self.peer.clone(),
            responses: rx,
        })
    }
}

#[async_trait]
impl LogStream for MockStream {
    fn try_send(&mut self, message: CriticalLogsMessage) -> Result<(), TransportError> {
        self.peer.sent.lock().unwrap().push(message);
        Ok(())
    }

    fn is_above_watermark(&self) -> bool {
        self.peer.watermark.load(Ordering::SeqCst)
    }

    async fn recv(&mut self) -> Option<CriticalLogsResponse> {
        self.responses.recv().await
    }
}

pub fn http_entry(path: &str) -> HttpLogEntry {
    HttpLogEntry {
        timestamp: None,
        method: "GET".to_string(),
        path: path.to_string(),
        response_code: 200,
        bytes_sent: 1024,
        bytes_received: 512,
    }
}

pub fn tcp_entry(bytes: u64) -> TcpLogEntry {
    TcpLogEntry {
        timestamp: None,
        bytes_sent: bytes,
        bytes_received: bytes,
    }
}

/// True when a message's wire id equals the fingerprint of its own payload
/// (computed with the id field still zero, the way the sender derives it).
pub fn id_matches_payload(message: &CriticalLogsMessage) -> bool {
    let mut unstamped = message.clone();
    unstamped.id = 0;
    publish_id(&unstamped) == message.id
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
