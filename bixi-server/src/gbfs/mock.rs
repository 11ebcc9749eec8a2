//! Mock feed fetcher for testing without network access.
//!
//! Serves feed documents from memory, optionally loaded from a directory
//! laid out like the real endpoint (`{language}/{feed}.json`). Counts every
//! fetch and can be switched into a failing mode to simulate an outage.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::RwLock;

use super::client::FeedFetcher;
use super::error::FetchError;
use super::feed::{Feed, FeedKey, Language};

/// Mock fetcher that serves in-memory feed documents.
#[derive(Clone, Default)]
pub struct MockFeedFetcher {
    feeds: Arc<RwLock<HashMap<FeedKey, Value>>>,
    calls: Arc<Mutex<HashMap<FeedKey, usize>>>,
    failing: Arc<AtomicBool>,
    latency: Option<Duration>,
}

impl MockFeedFetcher {
    /// Create an empty mock. Every fetch fails until documents are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load documents from `{dir}/{language}/{feed}.json`.
    ///
    /// Missing files are skipped; at least one document must be found.
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, FetchError> {
        let data_dir = data_dir.as_ref();
        let mut feeds = HashMap::new();

        for language in Language::ALL {
            for feed in Feed::ALL {
                let path = data_dir
                    .join(language.as_str())
                    .join(format!("{}.json", feed.as_str()));
                if !path.is_file() {
                    continue;
                }

                let json = std::fs::read_to_string(&path).map_err(|e| FetchError::Api {
                    status: 0,
                    message: format!("Failed to read {:?}: {}", path, e),
                })?;

                let document: Value =
                    serde_json::from_str(&json).map_err(|e| FetchError::Json {
                        message: format!("Failed to parse {:?}: {}", path, e),
                        body: None,
                    })?;

                feeds.insert(FeedKey::new(feed, language), document);
            }
        }

        if feeds.is_empty() {
            return Err(FetchError::Api {
                status: 0,
                message: format!("No mock feed files found in {:?}", data_dir),
            });
        }

        Ok(Self {
            feeds: Arc::new(RwLock::new(feeds)),
            ..Self::default()
        })
    }

    /// Delay every fetch by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add or replace a document.
    pub async fn set_feed(&self, key: FeedKey, document: Value) {
        self.feeds.write().await.insert(key, document);
    }

    /// Make subsequent fetches fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of fetches issued for `key`, successful or not.
    pub fn calls_for(&self, key: FeedKey) -> usize {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.get(&key).copied().unwrap_or(0)
    }

    /// Number of fetches issued across all keys.
    pub fn total_calls(&self) -> usize {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.values().sum()
    }

    /// Keys that have a document loaded.
    pub async fn available_feeds(&self) -> Vec<FeedKey> {
        let mut keys: Vec<FeedKey> = self.feeds.read().await.keys().copied().collect();
        keys.sort();
        keys
    }

    async fn serve(&self, key: FeedKey) -> Result<Value, FetchError> {
        {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            *calls.entry(key).or_default() += 1;
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Api {
                status: 503,
                message: "mock upstream unavailable".to_string(),
            });
        }

        let feeds = self.feeds.read().await;
        feeds.get(&key).cloned().ok_or_else(|| FetchError::Api {
            status: 404,
            message: format!(
                "No mock data for {}. Available: {:?}",
                key,
                feeds.keys().map(|k| k.to_string()).collect::<Vec<_>>()
            ),
        })
    }
}

impl FeedFetcher for MockFeedFetcher {
    fn fetch(&self, key: FeedKey) -> BoxFuture<'_, Result<Value, FetchError>> {
        self.serve(key).boxed()
    }
}
