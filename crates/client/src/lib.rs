//! At-least-once buffered shipping of critical access logs.
//!
//! The subsystem accepts opaque log entries from the embedding proxy and
//! ships them over one bidirectional gRPC stream, tolerating stream breaks,
//! peer backpressure and missing acknowledgements.
//!
//! # Architecture
//!
//! ```text
//! proxy → [CriticalLogHandle] → driver task
//!             log entries          ├─ composite batch + identifier stamp
//!                                  ├─ MessageBuffer   (bounded, fingerprint-keyed)
//!                                  ├─ BufferedStreamClient (stream lifecycle)
//!                                  └─ InflightTracker (ack deadlines, retries)
//! ```
//!
//! Every accepted entry is delivered one or more times until the collector
//! acknowledges it; a hard byte budget and drop-not-block semantics keep
//! the logger from ever backpressuring the data plane.

pub mod buffer;
pub mod client;
pub mod config;
pub mod error;
pub mod inflight;
pub mod logger;
pub mod metrics;
pub mod transport;

pub use buffer::{publish_id, BufferState, MessageBuffer};
pub use client::BufferedStreamClient;
pub use config::CriticalLogConfig;
pub use error::TransportError;
pub use inflight::InflightTracker;
pub use logger::{CriticalAccessLogger, CriticalLogHandle};
pub use metrics::CriticalLogMetrics;
pub use transport::{
    GrpcLogStream, GrpcLogStreamTransport, LogStream, LogStreamTransport,
};

// Re-export the wire types so embedders need only this crate.
pub use logship_proto as proto;
