//! Transport seam between the buffered client and the wire.
//!
//! The client only ever sees the two traits below; the gRPC implementation
//! wires them to the `BufferedCriticalLogs` bidirectional method. A freshly
//! opened stream is immediately writable — the transport queues internally,
//! subject to the write watermark.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tonic::Streaming;
use tracing::debug;

use logship_proto::access_log_service_client::AccessLogServiceClient;
use logship_proto::{CriticalLogsMessage, CriticalLogsResponse};

use crate::error::TransportError;

/// Depth of the outbound write queue per stream. The write watermark trips
/// when all permits are in use.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 100;

/// Factory for log streams. One transport outlives many streams: the
/// client drops its stream handle on watermark or remote close and asks for
/// a fresh one on the next flush.
#[async_trait]
pub trait LogStreamTransport: Send + 'static {
    type Stream: LogStream;

    async fn open(&mut self) -> Result<Self::Stream, TransportError>;
}

/// One open bidirectional stream.
#[async_trait]
pub trait LogStream: Send + 'static {
    /// Queues a message on the writable side without blocking.
    fn try_send(&mut self, message: CriticalLogsMessage) -> Result<(), TransportError>;

    /// True when the writable side is accumulating bytes above its safe
    /// threshold.
    fn is_above_watermark(&self) -> bool;

    /// Next inbound response; `None` once the peer closed the stream, with
    /// any status.
    async fn recv(&mut self) -> Option<CriticalLogsResponse>;
}

/// gRPC-backed transport over a shared tonic [`Channel`].
pub struct GrpcLogStreamTransport {
    client: AccessLogServiceClient<Channel>,
    outbound_capacity: usize,
}

impl GrpcLogStreamTransport {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: AccessLogServiceClient::new(channel),
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }

    /// Connects a dedicated channel to `addr` with HTTP/2 keep-alive, the
    /// same tuning the rest of the fleet uses for long-lived streams.
    pub async fn connect(addr: String) -> Result<Self, TransportError> {
        let channel = Channel::from_shared(addr)
            .map_err(|e| TransportError::OpenFailed {
                message: e.to_string(),
            })?
            .keep_alive_while_idle(true)
            .http2_keep_alive_interval(Duration::from_secs(30))
            .keep_alive_timeout(Duration::from_secs(10))
            .connect()
            .await
            .map_err(|e| TransportError::OpenFailed {
                message: e.to_string(),
            })?;
        Ok(Self::new(channel))
    }

    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity;
        self
    }
}

/// Stream handle pairing the outbound write queue with the inbound
/// response stream.
pub struct GrpcLogStream {
    outbound: mpsc::Sender<CriticalLogsMessage>,
    inbound: Streaming<CriticalLogsResponse>,
}

#[async_trait]
impl LogStreamTransport for GrpcLogStreamTransport {
    type Stream = GrpcLogStream;

    async fn open(&mut self) -> Result<GrpcLogStream, TransportError> {
        let (tx, rx) = mpsc::channel(self.outbound_capacity);
        let response = self
            .client
            .buffered_critical_logs(ReceiverStream::new(rx))
            .await
            .map_err(|status| TransportError::OpenFailed {
                message: status.to_string(),
            })?;
        Ok(GrpcLogStream {
            outbound: tx,
            inbound: response.into_inner(),
        })
    }
}

#[async_trait]
impl LogStream for GrpcLogStream {
    fn try_send(&mut self, message: CriticalLogsMessage) -> Result<(), TransportError> {
        self.outbound.try_send(message).map_err(|error| match error {
            mpsc::error::TrySendError::Full(_) => TransportError::Backpressure,
            mpsc::error::TrySendError::Closed(_) => TransportError::StreamClosed,
        })
    }

    fn is_above_watermark(&self) -> bool {
        self.outbound.capacity() == 0
    }

    async fn recv(&mut self) -> Option<CriticalLogsResponse> {
        match self.inbound.message().await {
            Ok(message) => message,
            Err(status) => {
                debug!(%status, "log stream terminated by peer");
                None
            }
        }
    }
}
