//! Critical access logger facade and its driver task.
//!
//! The proxy holds a [`CriticalLogHandle`] and logs through it; everything
//! else — batch assembly, identifier stamping, both timers, the stream and
//! the acknowledgement bookkeeping — lives on one driver task, so every
//! state transition runs to completion without locks.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use prost::Message;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use logship_proto::critical_logs_message::LogEntries;
use logship_proto::critical_logs_response::Status;
use logship_proto::{
    CriticalLogsMessage, CriticalLogsResponse, HttpLogEntries, HttpLogEntry, LogIdentifier, Node,
    TcpLogEntries, TcpLogEntry,
};

use crate::buffer::publish_id;
use crate::client::BufferedStreamClient;
use crate::config::CriticalLogConfig;
use crate::inflight::InflightTracker;
use crate::metrics::CriticalLogMetrics;
use crate::transport::LogStreamTransport;

enum LogEvent {
    Http(HttpLogEntry),
    Tcp(TcpLogEntry),
}

/// Cheap, cloneable logging entry point held by the proxy.
///
/// `log_http` and `log_tcp` never fail and never block. When the driver
/// falls behind, the entry is dropped and counted — access logging must not
/// backpressure the data plane.
#[derive(Clone)]
pub struct CriticalLogHandle {
    events: mpsc::Sender<LogEvent>,
    metrics: Arc<CriticalLogMetrics>,
}

impl CriticalLogHandle {
    pub fn log_http(&self, entry: HttpLogEntry) {
        self.push(LogEvent::Http(entry));
    }

    pub fn log_tcp(&self, entry: TcpLogEntry) {
        self.push(LogEvent::Tcp(entry));
    }

    fn push(&self, event: LogEvent) {
        if self.events.try_send(event).is_err() {
            self.metrics.dropped_logs.fetch_add(1, Ordering::Relaxed);
            debug!("critical log entry dropped, driver queue full");
        }
    }
}

/// Driver owning the streaming client, the acknowledgement tracker and the
/// composite batch under construction.
pub struct CriticalAccessLogger<T: LogStreamTransport> {
    config: CriticalLogConfig,
    metrics: Arc<CriticalLogMetrics>,
    client: BufferedStreamClient<T>,
    tracker: InflightTracker,
    composite: CriticalLogsMessage,
    approximate_bytes: usize,
    events: mpsc::Receiver<LogEvent>,
}

impl<T: LogStreamTransport> CriticalAccessLogger<T> {
    /// Spawns the driver task and returns the handle the proxy logs
    /// through.
    ///
    /// The driver stops when every handle has been dropped: timers are
    /// disarmed, the stream handle is released, and messages still in the
    /// buffer are lost — at-least-once, not durable.
    pub fn spawn(
        config: CriticalLogConfig,
        transport: T,
        metrics: Arc<CriticalLogMetrics>,
    ) -> (CriticalLogHandle, JoinHandle<()>) {
        let (events_tx, events_rx) = mpsc::channel(config.event_queue_depth);
        let handle = CriticalLogHandle {
            events: events_tx,
            metrics: metrics.clone(),
        };
        let logger = Self {
            client: BufferedStreamClient::new(transport, config.max_pending_buffer_size_bytes),
            tracker: InflightTracker::new(),
            composite: CriticalLogsMessage::default(),
            approximate_bytes: 0,
            events: events_rx,
            metrics,
            config,
        };
        let task = tokio::spawn(logger.run());
        (handle, task)
    }

    async fn run(mut self) {
        let mut flush_interval = time::interval_at(
            time::Instant::now() + self.config.buffer_flush_interval,
            self.config.buffer_flush_interval,
        );
        flush_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ack_interval = time::interval_at(
            time::Instant::now() + self.config.message_ack_timeout,
            self.config.message_ack_timeout,
        );
        ack_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(LogEvent::Http(entry)) => self.add_http_entry(entry).await,
                    Some(LogEvent::Tcp(entry)) => self.add_tcp_entry(entry).await,
                    None => break,
                },
                _ = flush_interval.tick() => self.flush().await,
                _ = ack_interval.tick() => self.on_ack_deadline(),
                response = self.client.recv_response() => match response {
                    Some(response) => self.on_response(response),
                    None => {
                        warn!(log_name = %self.config.log_name, "log stream closed by peer");
                        self.client.cleanup();
                    }
                },
            }
        }
        debug!(log_name = %self.config.log_name, "critical access logger stopped");
    }

    async fn add_http_entry(&mut self, entry: HttpLogEntry) {
        // The composite carries one entry kind per batch; switching kinds
        // flushes what is there instead of replacing it.
        if matches!(self.composite.log_entries, Some(LogEntries::TcpLogs(_))) {
            self.flush().await;
        }
        self.approximate_bytes += entry.encoded_len();
        match &mut self.composite.log_entries {
            Some(LogEntries::HttpLogs(entries)) => entries.log_entry.push(entry),
            _ => {
                self.composite.log_entries = Some(LogEntries::HttpLogs(HttpLogEntries {
                    log_entry: vec![entry],
                }));
            }
        }
        if self.approximate_bytes >= self.config.max_buffer_bytes {
            self.flush().await;
        }
    }

    async fn add_tcp_entry(&mut self, entry: TcpLogEntry) {
        if matches!(self.composite.log_entries, Some(LogEntries::HttpLogs(_))) {
            self.flush().await;
        }
        self.approximate_bytes += entry.encoded_len();
        match &mut self.composite.log_entries {
            Some(LogEntries::TcpLogs(entries)) => entries.log_entry.push(entry),
            _ => {
                self.composite.log_entries = Some(LogEntries::TcpLogs(TcpLogEntries {
                    log_entry: vec![entry],
                }));
            }
        }
        if self.approximate_bytes >= self.config.max_buffer_bytes {
            self.flush().await;
        }
    }

    /// Submits the composite batch (if any) and forwards everything
    /// buffered, registering the newly in-flight ids with their deadline.
    async fn flush(&mut self) {
        let composite_empty = self.composite.log_entries.is_none();
        if composite_empty && !self.client.has_buffered_messages() {
            return;
        }

        if !composite_empty {
            // The receiving service expects the identifier on the first
            // message of each stream; a reopened stream counts as fresh.
            if !self.client.has_active_stream() {
                self.stamp_identifier();
            }
            self.approximate_bytes = 0;
            let mut message = std::mem::take(&mut self.composite);
            let id = publish_id(&message);
            message.id = id;
            if self.client.buffer_message(id, message) {
                self.metrics
                    .pending_critical_logs
                    .fetch_add(1, Ordering::Relaxed);
            } else {
                self.metrics.dropped_logs.fetch_add(1, Ordering::Relaxed);
                warn!(
                    log_name = %self.config.log_name,
                    "critical log batch dropped, pending buffer full"
                );
            }
        }

        let inflight = self.client.flush().await;
        self.tracker
            .track(inflight, Instant::now() + self.config.message_ack_timeout);
    }

    fn stamp_identifier(&mut self) {
        self.composite.identifier = Some(LogIdentifier {
            node: Some(Node {
                id: self.config.node_id.clone(),
                cluster: self.config.node_cluster.clone(),
            }),
            log_name: self.config.log_name.clone(),
        });
    }

    fn on_ack_deadline(&mut self) {
        for id in self.tracker.expire(Instant::now()) {
            debug!(id, "acknowledgement deadline expired, queueing resend");
            self.client.rebuffer(id);
            self.metrics
                .critical_logs_message_timeout
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    fn on_response(&mut self, response: CriticalLogsResponse) {
        match response.status() {
            Status::Ack => {
                self.tracker.received(response.id);
                self.metrics
                    .critical_logs_ack_received
                    .fetch_add(1, Ordering::Relaxed);
                self.metrics
                    .pending_critical_logs
                    .fetch_sub(1, Ordering::Relaxed);
                self.client.clear_pending(response.id);
            }
            Status::Nack => {
                self.metrics
                    .critical_logs_nack_received
                    .fetch_add(1, Ordering::Relaxed);
                self.client.rebuffer(response.id);
            }
            Status::Unspecified => {}
        }
    }
}
