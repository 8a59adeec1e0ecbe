use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use getset::Getters;
use news_client::{CacheConfig, ClientConfig, DEFAULT_API_BASE};
use serde::Deserialize;
use serde_inline_default::serde_inline_default;
use simplelog::LevelFilter;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not load configuration: {0}")]
    Load(#[from] figment::Error),
    #[error("cache_ttl_secs {0} is out of range")]
    CacheTtlOutOfRange(i64),
}

#[serde_inline_default]
#[derive(Debug, Clone, Deserialize, Getters)]
#[get = "pub"]
pub struct Config {
    #[serde_inline_default(DEFAULT_API_BASE.to_string())]
    api_base: String,
    #[serde_inline_default(300)]
    cache_ttl_secs: i64,
    #[serde_inline_default(true)]
    cache_enabled: bool,
    #[serde_inline_default(30)]
    timeout_secs: u64,
    #[serde(default)]
    username: Option<String>,
    #[serde_inline_default("info".to_string())]
    log_level: String,
}

impl Config {
    /// Read `path` if it exists, then apply `NEWS_*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Config = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("NEWS_"))
            .extract()?;
        config.cache_ttl()?;
        Ok(config)
    }

    fn cache_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        chrono::Duration::try_seconds(self.cache_ttl_secs)
            .ok_or(ConfigError::CacheTtlOutOfRange(self.cache_ttl_secs))
    }

    pub fn log_level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        Ok(ClientConfig {
            api_base: self.api_base.clone(),
            cache: CacheConfig {
                ttl: self.cache_ttl()?,
                enabled: self.cache_enabled,
            },
            timeout: Duration::from_secs(self.timeout_secs),
            current_user: self.username.clone(),
        })
    }
}
