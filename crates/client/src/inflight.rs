//! Deadline tracking for in-flight message acknowledgements.
//!
//! Each flushed batch registers its fingerprints under one deadline cohort.
//! Acknowledgements arriving before the deadline suppress the cohort entry;
//! everything else is handed back to the caller for re-buffering when the
//! deadline passes.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Instant;

/// Time-ordered map of deadline cohorts plus the set of ids acknowledged
/// ahead of their deadline.
///
/// A fingerprint may sit in several cohorts at once (a message retried after
/// a timeout is tracked again); an acknowledged id consumes one cohort
/// occurrence, and any later occurrence converges through the buffer's
/// idempotent rebuffer.
#[derive(Debug, Default)]
pub struct InflightTracker {
    deadlines: BTreeMap<Instant, BTreeSet<u32>>,
    received: HashSet<u32>,
}

impl InflightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a batch of in-flight ids under `deadline`.
    ///
    /// Empty batches are not tracked. Cohorts landing on the same instant
    /// are merged; all members are processed together when it expires.
    pub fn track(&mut self, ids: BTreeSet<u32>, deadline: Instant) {
        if ids.is_empty() {
            return;
        }
        self.deadlines.entry(deadline).or_default().extend(ids);
    }

    /// Records an acknowledgement so the pending deadline entry for `id` is
    /// ignored when it fires.
    pub fn received(&mut self, id: u32) {
        self.received.insert(id);
    }

    /// Pops every cohort whose deadline is at or before `now` and returns
    /// the ids that were never acknowledged, in need of re-buffering.
    ///
    /// Received-set entries are purged as their cohorts expire.
    pub fn expire(&mut self, now: Instant) -> Vec<u32> {
        let mut timed_out = Vec::new();
        while let Some((&deadline, _)) = self.deadlines.iter().next() {
            if deadline > now {
                break;
            }
            let cohort = self
                .deadlines
                .remove(&deadline)
                .unwrap_or_default();
            for id in cohort {
                if self.received.remove(&id) {
                    continue;
                }
                timed_out.push(id);
            }
        }
        timed_out
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
