use crate::{cache::CacheKey, error::Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Outcome shared by every caller of one in-flight request
pub type Outcome = Result<Value>;

type Waiter = oneshot::Sender<Outcome>;

/// A caller's place in the pending table.
#[derive(Debug)]
pub enum Slot {
    /// No request was in flight for the key; the holder must dispatch one and
    /// settle it.
    Leader(oneshot::Receiver<Outcome>),
    /// A request is already in flight; wait for its outcome.
    Follower(oneshot::Receiver<Outcome>),
}

/// Request deduplication system
/// When multiple identical requests come in, only the first one is executed
/// and its outcome is shared with all waiting requests
#[derive(Default)]
pub struct RequestDeduplicator {
    /// Map of cache keys to the waiters of their in-flight request
    pending: DashMap<CacheKey, Vec<Waiter>>,
}

impl RequestDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to the in-flight request for `key`, registering a new one if
    /// there is none. Lookup and insert happen under one shard lock.
    pub fn join(&self, key: &CacheKey) -> Slot {
        let (tx, rx) = oneshot::channel();
        match self.pending.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().push(tx);
                log::debug!(
                    "Request already pending for key {} ({} waiters)",
                    key.digest(),
                    entry.get().len()
                );
                Slot::Follower(rx)
            }
            Entry::Vacant(entry) => {
                entry.insert(vec![tx]);
                log::debug!("Executing new request for key {}", key.digest());
                Slot::Leader(rx)
            }
        }
    }

    /// Remove the pending entry for `key` and hand `outcome` to every waiter.
    pub fn settle(&self, key: &CacheKey, outcome: Outcome) {
        let Some((_, waiters)) = self.pending.remove(key) else {
            log::warn!("Settled key {} with no pending entry", key.digest());
            return;
        };

        log::debug!("Notifying {} waiters for key {}", waiters.len(), key.digest());
        for waiter in waiters {
            // Waiters whose caller went away are skipped
            let _ = waiter.send(outcome.clone());
        }
    }

    pub fn is_pending(&self, key: &CacheKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Get statistics about pending requests
    pub fn stats(&self) -> DeduplicationStats {
        DeduplicationStats {
            pending_requests: self.pending.len(),
            total_waiters: self.pending.iter().map(|entry| entry.value().len()).sum(),
        }
    }
}

/// Statistics for request deduplication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeduplicationStats {
    pub pending_requests: usize,
    pub total_waiters: usize,
}

/// Thread-safe wrapper for the deduplicator
pub type SharedRequestDeduplicator = Arc<RequestDeduplicator>;
