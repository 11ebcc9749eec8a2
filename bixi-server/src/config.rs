//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::gbfs::{DEFAULT_BASE_URL, FetcherConfig};

pub const ENV_BASE_URL: &str = "BIXI_GBFS_BASE_URL";
pub const ENV_CACHE_TTL: &str = "BIXI_CACHE_TTL_SECS";
pub const ENV_HTTP_TIMEOUT: &str = "BIXI_HTTP_TIMEOUT_SECS";
pub const ENV_BIND_ADDR: &str = "BIXI_BIND_ADDR";
pub const ENV_MOCK_DATA: &str = "BIXI_MOCK_DATA";

/// Errors reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds, got '{value}'")]
    InvalidSeconds { var: &'static str, value: String },

    #[error("{var} must be a socket address such as 127.0.0.1:3000, got '{value}'")]
    InvalidAddress { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

/// Everything `main` needs to start the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// GBFS root, without the `{lang}/{feed}.json` suffix.
    pub base_url: String,

    pub cache_ttl: Duration,
    pub http_timeout_secs: u64,
    pub bind_addr: SocketAddr,

    /// Directory of canned feed documents. When set, upstream is never
    /// contacted.
    pub mock_data: Option<PathBuf>,
}

impl ServerConfig {
    /// Create a configuration with the default values.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_ttl: CacheConfig::default().ttl,
            http_timeout_secs: FetcherConfig::default().timeout_secs,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            mock_data: None,
        }
    }

    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, falling back to defaults for
    /// unset variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Some(url) = lookup(ENV_BASE_URL) {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::Empty { var: ENV_BASE_URL });
            }
            config = config.with_base_url(url);
        }
        if let Some(value) = lookup(ENV_CACHE_TTL) {
            config = config.with_cache_ttl(Duration::from_secs(seconds(ENV_CACHE_TTL, &value)?));
        }
        if let Some(value) = lookup(ENV_HTTP_TIMEOUT) {
            config = config.with_http_timeout(seconds(ENV_HTTP_TIMEOUT, &value)?);
        }
        if let Some(value) = lookup(ENV_BIND_ADDR) {
            let addr = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidAddress {
                    var: ENV_BIND_ADDR,
                    value: value.clone(),
                })?;
            config = config.with_bind_addr(addr);
        }
        if let Some(dir) = lookup(ENV_MOCK_DATA).filter(|d| !d.trim().is_empty()) {
            config = config.with_mock_data(dir.trim());
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_http_timeout(mut self, secs: u64) -> Self {
        self.http_timeout_secs = secs;
        self
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_mock_data(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mock_data = Some(dir.into());
        self
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig::new()
            .with_base_url(self.base_url.clone())
            .with_timeout(self.http_timeout_secs)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: self.cache_ttl,
            ..CacheConfig::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn seconds(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidSeconds {
            var,
            value: value.to_string(),
        })
}
