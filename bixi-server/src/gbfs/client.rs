//! GBFS HTTP client.
//!
//! Resolves `{base_url}/{language}/{feed}.json` and decodes the body into
//! an untyped JSON document. Interpreting the document is left to callers.

use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use super::error::FetchError;
use super::feed::FeedKey;

/// Default base URL for BIXI's GBFS 2.2 feeds.
pub const DEFAULT_BASE_URL: &str = "https://gbfs.velobixi.com/gbfs/2-2";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Source of raw feed documents.
///
/// The cache only talks to this trait, so tests can substitute an
/// in-memory implementation for the HTTP client.
pub trait FeedFetcher: Send + Sync + 'static {
    /// Fetch one feed in one language.
    fn fetch(&self, key: FeedKey) -> BoxFuture<'_, Result<Value, FetchError>>;
}

/// Configuration for the GBFS client.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Base URL for the feeds (defaults to production BIXI)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FetcherConfig {
    /// Create a config pointing at the production endpoint.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client for the GBFS endpoint.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    http: reqwest::Client,
    base_url: String,
}

impl HttpFeedFetcher {
    /// Create a new client with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of one feed document.
    pub fn feed_url(&self, key: FeedKey) -> String {
        format!("{}/{}/{}.json", self.base_url, key.language, key.feed)
    }

    async fn fetch_json(&self, key: FeedKey) -> Result<Value, FetchError> {
        let url = self.feed_url(key);
        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_document(&body)
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn fetch(&self, key: FeedKey) -> BoxFuture<'_, Result<Value, FetchError>> {
        self.fetch_json(key).boxed()
    }
}

/// Decode a feed body. GBFS documents are always JSON objects.
fn parse_document(body: &str) -> Result<Value, FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|e| FetchError::Json {
        message: e.to_string(),
        body: Some(body.chars().take(500).collect()),
    })?;

    if !value.is_object() {
        return Err(FetchError::Json {
            message: "expected a JSON object at the top level".to_string(),
            body: Some(body.chars().take(500).collect()),
        });
    }

    Ok(value)
}
