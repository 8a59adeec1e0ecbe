use crate::cache::CacheConfig;
use crate::transport::DEFAULT_TIMEOUT;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://crypto-news-api-backend-b5addae00d92.herokuapp.com";

/// Settings for a [`NewsClient`](crate::NewsClient)
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash
    pub api_base: String,
    pub cache: CacheConfig,
    /// Per-request deadline enforced by the transport
    pub timeout: Duration,
    /// User name attached to votes
    pub current_user: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            cache: CacheConfig::default(),
            timeout: DEFAULT_TIMEOUT,
            current_user: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..Self::default()
        }
    }
}
