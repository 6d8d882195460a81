//! Bounded in-memory buffer of outgoing log messages.
//!
//! Messages are keyed by a content fingerprint, so retries of an identical
//! payload collapse onto one entry and re-insertion is free. The buffer
//! enforces a hard byte budget: a message that does not fit is dropped
//! rather than blocking the caller, because access logging must never
//! backpressure the data plane.

use std::collections::{BTreeSet, HashMap};

use prost::Message;

use logship_proto::CriticalLogsMessage;

/// Send state of a buffered message.
///
/// `Buffered` means awaiting send; `Pending` means sent and awaiting
/// acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Buffered,
    Pending,
}

#[derive(Debug)]
struct BufferedEntry {
    state: BufferState,
    message: CriticalLogsMessage,
    encoded_len: usize,
}

/// Map from content fingerprint to pending message, bounded in bytes.
#[derive(Debug)]
pub struct MessageBuffer {
    entries: HashMap<u32, BufferedEntry>,
    current_bytes: usize,
    max_bytes: usize,
}

/// Content fingerprint of a message: CRC-32C over its serialized form.
///
/// Stable across processes and restarts; identical payloads always map to
/// the same id, which is what makes buffering idempotent across retries.
pub fn publish_id(message: &CriticalLogsMessage) -> u32 {
    crc32c::crc32c(&message.encode_to_vec())
}

impl MessageBuffer {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            current_bytes: 0,
            max_bytes,
        }
    }

    /// Stores `message` under `id` in state `Buffered`.
    ///
    /// Returns `false` when the message was dropped because it would exceed
    /// the byte budget. An id that is already present leaves the stored
    /// entry and the accounting untouched: the fingerprint is taken over
    /// the full payload, so the incoming message is byte-identical to the
    /// stored one.
    pub fn buffer(&mut self, id: u32, message: CriticalLogsMessage) -> bool {
        if self.entries.contains_key(&id) {
            return true;
        }
        let encoded_len = message.encoded_len();
        if self.current_bytes + encoded_len > self.max_bytes {
            return false;
        }
        self.entries.insert(
            id,
            BufferedEntry {
                state: BufferState::Buffered,
                message,
                encoded_len,
            },
        );
        self.current_bytes += encoded_len;
        true
    }

    /// Forwards every `Buffered` entry through `forward`, flipping it to
    /// `Pending`, and returns the set of newly pending ids.
    ///
    /// Iteration order is unspecified. A `false` from `forward` means the
    /// stream stopped accepting writes: iteration stops, the refused entry
    /// and everything not yet visited stay `Buffered`.
    pub fn send_pending<F>(&mut self, mut forward: F) -> BTreeSet<u32>
    where
        F: FnMut(&CriticalLogsMessage) -> bool,
    {
        let mut inflight = BTreeSet::new();
        for (id, entry) in self.entries.iter_mut() {
            if entry.state == BufferState::Pending {
                continue;
            }
            if !forward(&entry.message) {
                break;
            }
            entry.state = BufferState::Pending;
            inflight.insert(*id);
        }
        inflight
    }

    /// Removes an acknowledged message and releases its budget.
    ///
    /// Only `Pending` entries are removable here; an ack for an absent id
    /// or for one that has already been rebuffered is a no-op.
    pub fn on_ack(&mut self, id: u32) {
        let pending = matches!(
            self.entries.get(&id),
            Some(entry) if entry.state == BufferState::Pending
        );
        if pending {
            if let Some(entry) = self.entries.remove(&id) {
                self.current_bytes -= entry.encoded_len;
            }
        }
    }

    /// Handles a rejected message: either queue it for retry or drop it.
    pub fn on_nack(&mut self, id: u32, rebuffer: bool) {
        if !self.entries.contains_key(&id) {
            return;
        }
        if rebuffer {
            self.rebuffer(id);
        } else if let Some(entry) = self.entries.remove(&id) {
            self.current_bytes -= entry.encoded_len;
        }
    }

    /// Returns a `Pending` message to `Buffered` so the next flush resends
    /// it. Idempotent: already-`Buffered` or absent ids are untouched.
    pub fn rebuffer(&mut self, id: u32) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.state = BufferState::Buffered;
        }
    }

    /// True when at least one entry is awaiting send.
    pub fn has_buffered(&self) -> bool {
        self.entries
            .values()
            .any(|entry| entry.state == BufferState::Buffered)
    }

    pub fn current_bytes(&self) -> usize {
        self.current_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn state_of(&self, id: u32) -> Option<BufferState> {
        self.entries.get(&id).map(|entry| entry.state)
    }
}
