//! Streaming client owning the stream lifecycle and the message buffer.
//!
//! The stream handle is the single source of truth for "connected": it is
//! absent until the first flush, and any watermark hit, peer close or write
//! refusal drops it. Buffer contents always survive the handle.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use logship_proto::{CriticalLogsMessage, CriticalLogsResponse};

use crate::buffer::MessageBuffer;
use crate::transport::{LogStream, LogStreamTransport};

pub struct BufferedStreamClient<T: LogStreamTransport> {
    transport: T,
    buffer: MessageBuffer,
    stream: Option<T::Stream>,
}

impl<T: LogStreamTransport> BufferedStreamClient<T> {
    pub fn new(transport: T, max_buffer_bytes: usize) -> Self {
        Self {
            transport,
            buffer: MessageBuffer::new(max_buffer_bytes),
            stream: None,
        }
    }

    /// Admits a message into the buffer. See [`MessageBuffer::buffer`] for
    /// the overflow and idempotency rules.
    pub fn buffer_message(&mut self, id: u32, message: CriticalLogsMessage) -> bool {
        self.buffer.buffer(id, message)
    }

    /// Queues a pending message for resend on the next flush (nack and
    /// ack-timeout path).
    pub fn rebuffer(&mut self, id: u32) {
        self.buffer.rebuffer(id);
    }

    /// Removes an acknowledged message and releases its budget.
    pub fn clear_pending(&mut self, id: u32) {
        self.buffer.on_ack(id);
    }

    pub fn has_active_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn has_buffered_messages(&self) -> bool {
        self.buffer.has_buffered()
    }

    /// Releases the stream handle. Buffer contents persist; the next flush
    /// opens a fresh stream.
    pub fn cleanup(&mut self) {
        if self.stream.take().is_some() {
            debug!("log stream handle released");
        }
    }

    /// Opens a stream if none exists and forwards every buffered message,
    /// returning the set of newly in-flight ids.
    ///
    /// A stream above its write watermark is dropped before anything is
    /// sent; the messages stay buffered for the next interval. A write
    /// refusal mid-batch also drops the handle — messages already marked
    /// pending are recovered through the acknowledgement timeout.
    pub async fn flush(&mut self) -> BTreeSet<u32> {
        if self.stream.is_none() {
            match self.transport.open().await {
                Ok(stream) => {
                    debug!("log stream opened");
                    self.stream = Some(stream);
                }
                Err(error) => {
                    warn!(%error, "failed to open log stream");
                    return BTreeSet::new();
                }
            }
        }
        let Some(stream) = self.stream.as_mut() else {
            return BTreeSet::new();
        };

        if stream.is_above_watermark() {
            warn!("log stream above write watermark, dropping stream handle");
            self.stream = None;
            return BTreeSet::new();
        }

        let mut stream_broken = false;
        let inflight = self.buffer.send_pending(|message| {
            match stream.try_send(message.clone()) {
                Ok(()) => true,
                Err(error) => {
                    warn!(%error, "log stream refused write, dropping stream handle");
                    stream_broken = true;
                    false
                }
            }
        });
        if stream_broken {
            self.stream = None;
        }
        inflight
    }

    /// Next inbound response from the open stream. Pends forever while no
    /// stream exists, so it can sit in a `select!` arm; yields `None` on
    /// remote close.
    pub async fn recv_response(&mut self) -> Option<CriticalLogsResponse> {
        match self.stream.as_mut() {
            Some(stream) => stream.recv().await,
            None => std::future::pending().await,
        }
    }

    pub fn buffer(&self) -> &MessageBuffer {
        &self.buffer
    }
}
