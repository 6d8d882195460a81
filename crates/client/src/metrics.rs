//! Counters and gauges exported by the critical log client.

use std::sync::atomic::{AtomicI64, AtomicU64};

/// Shared client metrics.
///
/// Field names are the exact stat names the embedding proxy exports.
/// Call sites update them with relaxed ordering; nothing synchronizes
/// through these values.
#[derive(Debug, Default)]
pub struct CriticalLogMetrics {
    /// Incremented once per fingerprint whose acknowledgement deadline
    /// expired.
    pub critical_logs_message_timeout: AtomicU64,
    /// Incremented per NACK received from the collector.
    pub critical_logs_nack_received: AtomicU64,
    /// Incremented per ACK received from the collector.
    pub critical_logs_ack_received: AtomicU64,
    /// Gauge: batches submitted to the stream and not yet acknowledged.
    /// Incremented once per flushed batch, decremented per ACK.
    pub pending_critical_logs: AtomicI64,
    /// Log payloads dropped on buffer overflow or event-queue backpressure.
    pub dropped_logs: AtomicU64,
}

impl CriticalLogMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}
