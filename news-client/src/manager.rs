use crate::cache::{CacheConfig, CacheKey, ResponseCache, SharedResponseCache};
use crate::deduplication::{RequestDeduplicator, SharedRequestDeduplicator, Slot};
use crate::error::{Error, Result};
use crate::request::ApiRequest;
use crate::transport::Transport;
use futures::{Future, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Sits between callers and the transport: answers from the response cache
/// while an entry is fresh, and otherwise lets exactly one network call per
/// key run, sharing its outcome with every caller that asked meanwhile.
///
/// Clones share the same tables.
#[derive(Clone)]
pub struct CacheManager {
    transport: Arc<dyn Transport>,
    cache: SharedResponseCache,
    deduplicator: SharedRequestDeduplicator,
}

impl CacheManager {
    pub fn new(transport: Arc<dyn Transport>, config: CacheConfig) -> Self {
        Self {
            transport,
            cache: Arc::new(ResponseCache::new(config)),
            deduplicator: Arc::new(RequestDeduplicator::new()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.cache.config
    }

    /// Fetch `request` through the configured transport.
    pub async fn fetch(&self, request: &ApiRequest) -> Result<Value> {
        let transport = Arc::clone(&self.transport);
        let owned = request.clone();
        self.fetch_with(request, move || async move { transport.send(&owned).await })
            .await
    }

    /// Fetch `request`, using `invoke` to start the network call if neither
    /// the cache nor an in-flight call can answer it.
    ///
    /// `invoke` runs on a spawned task and the call always runs to
    /// completion, even if every caller stops waiting for it.
    pub async fn fetch_with<F, Fut>(&self, request: &ApiRequest, invoke: F) -> Result<Value>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let key = CacheKey::from_request(request);

        if let Some(data) = self.cache.get(&key) {
            return Ok(data);
        }

        let rx = match self.deduplicator.join(&key) {
            Slot::Follower(rx) => rx,
            Slot::Leader(rx) => {
                // Settlement commits to the cache before leaving the pending
                // table, so a call that just finished is visible here.
                if let Some(data) = self.cache.get(&key) {
                    self.deduplicator.settle(&key, Ok(data.clone()));
                    return Ok(data);
                }
                self.dispatch(key, invoke);
                rx
            }
        };

        rx.await.unwrap_or(Err(Error::Abandoned))
    }

    fn dispatch<F, Fut>(&self, key: CacheKey, invoke: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        let deduplicator = Arc::clone(&self.deduplicator);

        tokio::spawn(async move {
            // Both building and polling the call may panic; either way the
            // pending entry must be settled.
            let call = async move { invoke().await };
            let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => Err(Error::Network("transport call panicked".to_string())),
            };

            match &outcome {
                Ok(data) => cache.put(key.clone(), data.clone()),
                Err(e) => log::warn!("Request for key {} failed: {}", key.digest(), e),
            }
            deduplicator.settle(&key, outcome);
        });
    }

    /// Drop cached entries whose key contains `pattern`, or every entry when
    /// `pattern` is `None`. In-flight calls are left alone.
    pub fn invalidate(&self, pattern: Option<&str>) -> usize {
        self.cache.invalidate(pattern)
    }

    pub fn evict_expired(&self) -> usize {
        self.cache.evict_expired()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.cache.len(),
            valid_entries: self.cache.valid_len(),
            pending_count: self.deduplicator.stats().pending_requests,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Stored entries, fresh or stale
    pub size: usize,
    pub valid_entries: usize,
    /// Keys with a network call in flight
    pub pending_count: usize,
}
