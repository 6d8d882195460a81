use thiserror::Error;

/// Errors surfaced by the streaming transport.
///
/// None of these propagate to the logging call sites: a failed open leaves
/// the stream absent until the next flush, and a failed send drops the
/// stream handle while buffered messages wait for the retry path.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open log stream: {message}")]
    OpenFailed { message: String },

    #[error("log stream closed by peer")]
    StreamClosed,

    #[error("log stream writable side is full")]
    Backpressure,
}
