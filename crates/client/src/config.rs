use std::env;
use std::time::Duration;

/// Default cadence of the periodic flush timer.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(1000);

/// Default time to wait for a per-message acknowledgement before the
/// message is queued for resend.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default byte budget, shared as the composite flush threshold and the
/// pending-buffer cap.
pub const DEFAULT_BUFFER_BYTES: usize = 16384;

/// Default depth of the queue between logging call sites and the driver.
pub const DEFAULT_EVENT_QUEUE_DEPTH: usize = 1024;

/// Runtime configuration for one critical access logger.
#[derive(Debug, Clone)]
pub struct CriticalLogConfig {
    /// Logical log name stamped on the first message of each stream.
    pub log_name: String,
    /// Node identity stamped alongside the log name.
    pub node_id: String,
    pub node_cluster: String,
    /// Cadence of the unconditional periodic flush.
    pub buffer_flush_interval: Duration,
    /// Composite batch size at which a flush triggers early.
    pub max_buffer_bytes: usize,
    /// How long a sent message may wait for an acknowledgement.
    pub message_ack_timeout: Duration,
    /// Hard byte cap of the pending-message buffer. Messages that do not
    /// fit are dropped, never queued.
    pub max_pending_buffer_size_bytes: usize,
    /// Depth of the handle-to-driver event queue.
    pub event_queue_depth: usize,
}

impl CriticalLogConfig {
    pub fn new(log_name: impl Into<String>) -> Self {
        let node_id = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            log_name: log_name.into(),
            node_id,
            node_cluster: String::new(),
            buffer_flush_interval: DEFAULT_FLUSH_INTERVAL,
            max_buffer_bytes: DEFAULT_BUFFER_BYTES,
            message_ack_timeout: DEFAULT_ACK_TIMEOUT,
            max_pending_buffer_size_bytes: DEFAULT_BUFFER_BYTES,
            event_queue_depth: DEFAULT_EVENT_QUEUE_DEPTH,
        }
    }

    /// Builds a configuration from defaults plus `LOGSHIP_*` environment
    /// overrides. Unparsable values fall back to the defaults.
    pub fn from_env(log_name: impl Into<String>) -> Self {
        let mut config = Self::new(log_name);

        if let Ok(node_id) = env::var("LOGSHIP_NODE_ID") {
            config.node_id = node_id;
        }
        if let Ok(cluster) = env::var("LOGSHIP_NODE_CLUSTER") {
            config.node_cluster = cluster;
        }
        config.buffer_flush_interval = env::var("LOGSHIP_FLUSH_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(config.buffer_flush_interval);
        config.max_buffer_bytes = env::var("LOGSHIP_MAX_BUFFER_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(config.max_buffer_bytes);
        config.message_ack_timeout = env::var("LOGSHIP_ACK_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(config.message_ack_timeout);
        config.max_pending_buffer_size_bytes = env::var("LOGSHIP_PENDING_BUFFER_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(config.max_pending_buffer_size_bytes);

        config
    }
}
