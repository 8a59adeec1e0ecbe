// Client for the news board backend, with response caching and request deduplication

mod api;
pub mod cache;
mod config;
pub mod deduplication;
mod error;
pub mod manager;
mod request;
pub mod transport;


pub use api::{FeedType, NewsClient, Vote};
pub use config::{ClientConfig, DEFAULT_API_BASE};
pub use error::{Error, ErrorKind, Result};
pub use manager::{CacheManager, CacheStats};
pub use request::ApiRequest;
pub use transport::{SurfTransport, Transport};

// Re-export cache types
pub use cache::{CacheConfig, CacheKey, CachedResponse};
pub use deduplication::DeduplicationStats;
