use crate::request::ApiRequest;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Configuration for the response cache
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// How long a stored response stays fresh
    pub ttl: Duration,
    /// Whether caching is enabled
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(5),
            enabled: true,
        }
    }
}

impl CacheConfig {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, enabled: true }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Cached response body with metadata
#[derive(Clone, Debug)]
pub struct CachedResponse {
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CachedResponse {
    pub fn new(data: Value, ttl: Duration) -> Self {
        Self {
            data,
            created_at: Utc::now(),
            ttl,
        }
    }

    /// Fresh while `now - created_at < ttl`.
    pub fn is_valid(&self) -> bool {
        Utc::now() - self.created_at < self.ttl
    }
}

/// Cache key of a request.
///
/// Rendered as `{url}-{options}` where `options` is compact JSON with sorted
/// keys holding the upper-case `method` (always present), the lower-cased
/// `headers` (only when there are any) and the `body` (only when there is
/// one). The URL comes first so keys can be invalidated by path fragment.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn from_request(request: &ApiRequest) -> Self {
        let mut options = Map::new();
        options.insert(
            "method".to_string(),
            Value::String(request.method().to_string().to_ascii_uppercase()),
        );
        if !request.headers().is_empty() {
            let headers = request
                .headers()
                .iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), Value::String(value.clone())))
                .collect::<Map<_, _>>();
            options.insert("headers".to_string(), Value::Object(headers));
        }
        if let Some(body) = request.body() {
            options.insert("body".to_string(), body.clone());
        }

        let options = canonical(&Value::Object(options));
        CacheKey(format!("{}-{}", request.url(), options))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short sha256 fingerprint, used to keep log lines readable.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.0.as_bytes());
        hex::encode(&hash[..6])
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rebuild `value` with every object's keys in sorted order, so the
/// serialised form does not depend on how the caller built it.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonical(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

/// In-memory response cache using DashMap for thread safety
pub struct ResponseCache {
    entries: DashMap<CacheKey, CachedResponse>,
    pub config: CacheConfig,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Get cached data if present and still fresh. A stale entry is dropped.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        if !self.config.enabled {
            return None;
        }

        let stale = match self.entries.get(key) {
            Some(cached) if cached.is_valid() => {
                log::debug!("Cache hit for key {}", key.digest());
                return Some(cached.data.clone());
            }
            Some(_) => true,
            None => false,
        };

        if stale {
            log::debug!("Cache expired for key {}", key.digest());
            // A fresh entry may have landed since the lookup; keep that one.
            self.entries.remove_if(key, |_, cached| !cached.is_valid());
        } else {
            log::debug!("Cache miss for key {}", key.digest());
        }
        None
    }

    /// Store data in cache, replacing any previous entry for the key
    pub fn put(&self, key: CacheKey, data: Value) {
        if !self.config.enabled {
            return;
        }

        log::debug!("Stored in cache with key {}", key.digest());
        self.entries.insert(key, CachedResponse::new(data, self.config.ttl));
    }

    /// Remove every entry whose key contains `pattern`, or all entries when
    /// no pattern is given. Returns how many entries were removed.
    pub fn invalidate(&self, pattern: Option<&str>) -> usize {
        let before = self.entries.len();
        match pattern {
            Some(pattern) => self.entries.retain(|key, _| !key.as_str().contains(pattern)),
            None => self.entries.clear(),
        }
        let removed = before.saturating_sub(self.entries.len());
        log::info!(
            "Invalidated {} cache entries (pattern: {})",
            removed,
            pattern.unwrap_or("*")
        );
        removed
    }

    /// Remove expired entries from cache
    pub fn evict_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, cached| cached.is_valid());
        let evicted = before.saturating_sub(self.entries.len());
        log::debug!("Evicted {} expired cache entries", evicted);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that are still fresh
    pub fn valid_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().is_valid())
            .count()
    }
}

/// Thread-safe wrapper for the cache
pub type SharedResponseCache = Arc<ResponseCache>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items_request(page: u32, cat: &str) -> ApiRequest {
        ApiRequest::put("https://api.example.com/items/main/pages/cat")
            .with_json(json!({ "pageNumber": page, "cat": cat }))
    }

    #[test]
    fn test_cache_key_generation() {
        let key1 = CacheKey::from_request(&items_request(1, "AI"));
        let key2 = CacheKey::from_request(&items_request(1, "AI"));
        assert_eq!(key1, key2);

        // Different body should produce different key
        let key3 = CacheKey::from_request(&items_request(2, "AI"));
        assert_ne!(key1, key3);
    }

    #[test]
    fn test_cache_key_format() {
        let key = CacheKey::from_request(&items_request(1, "AI"));
        assert_eq!(
            key.as_str(),
            r#"https://api.example.com/items/main/pages/cat-{"body":{"cat":"AI","pageNumber":1},"method":"PUT"}"#
        );

        let key = CacheKey::from_request(&ApiRequest::get("https://api.example.com/items/x1"));
        assert_eq!(key.as_str(), r#"https://api.example.com/items/x1-{"method":"GET"}"#);
    }

    #[test]
    fn test_cache_key_ignores_body_field_order() {
        let mut forward = Map::new();
        forward.insert("pageNumber".to_string(), json!(1));
        forward.insert("cat".to_string(), json!({ "name": "AI", "lang": "en" }));

        let mut reverse = Map::new();
        reverse.insert("cat".to_string(), json!({ "lang": "en", "name": "AI" }));
        reverse.insert("pageNumber".to_string(), json!(1));

        let url = "https://api.example.com/items/main/pages/cat";
        let key1 = CacheKey::from_request(&ApiRequest::put(url).with_json(Value::Object(forward)));
        let key2 = CacheKey::from_request(&ApiRequest::put(url).with_json(Value::Object(reverse)));
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_cache_key_discriminates_method() {
        let url = "https://api.example.com/items/x1";
        let get = CacheKey::from_request(&ApiRequest::get(url));
        let delete = CacheKey::from_request(&ApiRequest::delete(url));
        let put = CacheKey::from_request(&ApiRequest::put(url).with_json(json!({})));
        assert_ne!(get, delete);
        assert_ne!(get, put);
        assert_ne!(delete, put);
    }

    #[test]
    fn test_cache_key_headers() {
        let url = "https://api.example.com/items/x1";
        let plain = CacheKey::from_request(&ApiRequest::get(url));
        let alice =
            CacheKey::from_request(&ApiRequest::get(url).with_header("Authorization", "Bearer a"));
        let bob =
            CacheKey::from_request(&ApiRequest::get(url).with_header("Authorization", "Bearer b"));
        let alice_lower =
            CacheKey::from_request(&ApiRequest::get(url).with_header("authorization", "Bearer a"));

        // Header-only differences produce distinct keys
        assert_ne!(plain, alice);
        assert_ne!(alice, bob);
        // Header names are case-insensitive
        assert_eq!(alice, alice_lower);
    }

    #[test]
    fn test_cache_key_digest() {
        let key = CacheKey::from_request(&items_request(1, "AI"));
        assert_eq!(key.digest().len(), 12);
        assert_eq!(key.digest(), CacheKey::from_request(&items_request(1, "AI")).digest());
    }

    #[test]
    fn test_cached_response_validity() {
        let cached = CachedResponse::new(json!([]), Duration::seconds(1));
        assert!(cached.is_valid());

        // Simulate expired result
        let expired_cached = CachedResponse {
            data: json!([]),
            created_at: Utc::now() - Duration::seconds(2),
            ttl: Duration::seconds(1),
        };
        assert!(!expired_cached.is_valid());

        // Age equal to the TTL is already stale
        let zero_ttl = CachedResponse::new(json!([]), Duration::zero());
        assert!(!zero_ttl.is_valid());
    }

    #[test]
    fn test_get_put() {
        let cache = ResponseCache::new(CacheConfig::default());
        let key = CacheKey::from_request(&items_request(1, "AI"));

        assert_eq!(cache.get(&key), None);
        cache.put(key.clone(), json!([{ "id": "x1" }]));
        assert_eq!(cache.get(&key), Some(json!([{ "id": "x1" }])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stale_entry_is_dropped_on_get() {
        let cache = ResponseCache::new(CacheConfig::new(Duration::zero()));
        let key = CacheKey::from_request(&items_request(1, "AI"));

        cache.put(key.clone(), json!([]));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.valid_len(), 0);

        assert_eq!(cache.get(&key), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disabled_cache() {
        let cache = ResponseCache::new(CacheConfig::disabled());
        let key = CacheKey::from_request(&items_request(1, "AI"));

        cache.put(key.clone(), json!([]));
        assert!(cache.is_empty());
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn test_invalidate() {
        let cache = ResponseCache::new(CacheConfig::default());
        let items = CacheKey::from_request(&items_request(1, "AI"));
        let comment =
            CacheKey::from_request(&ApiRequest::get("https://api.example.com/comments/c1"));
        let reply = CacheKey::from_request(&ApiRequest::get("https://api.example.com/replies/r1"));

        cache.put(items.clone(), json!([]));
        cache.put(comment.clone(), json!({}));
        cache.put(reply.clone(), json!({}));

        assert_eq!(cache.invalidate(Some("items")), 1);
        assert_eq!(cache.get(&items), None);
        assert!(cache.get(&comment).is_some());

        assert_eq!(cache.invalidate(Some("no-such-path")), 0);
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.invalidate(None), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evict_expired() {
        let cache = ResponseCache::new(CacheConfig::new(Duration::zero()));
        cache.put(CacheKey::from_request(&items_request(1, "AI")), json!([]));
        cache.put(CacheKey::from_request(&items_request(2, "AI")), json!([]));

        assert_eq!(cache.evict_expired(), 2);
        assert!(cache.is_empty());
    }
}
