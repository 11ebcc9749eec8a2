//! Freshness cache for GBFS feed documents.
//!
//! Each (feed, language) key owns a slot holding the last fetched document
//! and, while a refresh is running, a shared handle to that refresh. The
//! slot's lock is only held to inspect or swap those two fields, never
//! across an await, so readers never see a half-written document.
//!
//! Per key:
//! - a document younger than the TTL is served directly;
//! - an expired document triggers exactly one refresh, which runs on its own
//!   task; callers arriving while it runs get the previous document
//!   (marked stale), or wait for the refresh when there is none;
//! - a failed refresh falls back to the previous document (marked stale)
//!   and only surfaces as an error when there is nothing to fall back to.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use moka::future::Cache as MokaCache;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::gbfs::{FeedFetcher, FeedKey, FetchError};

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a fetched document is served without refreshing.
    pub ttl: Duration,

    /// Maximum number of keys tracked. Must cover every (feed, language)
    /// pair, otherwise fallback documents can be evicted.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 32,
        }
    }
}

/// Whether a cached document is within its TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// Past its TTL: either a refresh was already running, or the refresh
    /// failed and this is the last good document.
    Stale,
}

/// A document served by the cache.
#[derive(Debug, Clone)]
pub struct Cached {
    pub document: Arc<Value>,
    pub fetched_at: Instant,
    pub freshness: Freshness,
}

impl Cached {
    pub fn is_stale(&self) -> bool {
        self.freshness == Freshness::Stale
    }
}

/// Last successfully fetched document for a key.
#[derive(Debug, Clone)]
struct Snapshot {
    document: Arc<Value>,
    fetched_at: Instant,
}

impl Snapshot {
    fn serve(&self, freshness: Freshness) -> Cached {
        Cached {
            document: Arc::clone(&self.document),
            fetched_at: self.fetched_at,
            freshness,
        }
    }
}

type RefreshResult = Result<Snapshot, Arc<FetchError>>;

/// Handle to a running refresh. Every clone resolves to the same result.
type Refresh = Shared<BoxFuture<'static, RefreshResult>>;

#[derive(Default)]
struct SlotState {
    current: Option<Snapshot>,
    in_flight: Option<Refresh>,
}

#[derive(Default)]
struct Slot {
    state: Mutex<SlotState>,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the outcome of a refresh and release the in-flight guard.
    fn complete(&self, key: FeedKey, result: Result<Value, FetchError>) -> RefreshResult {
        let mut state = self.lock();
        state.in_flight = None;

        match result {
            Ok(document) => {
                let snapshot = Snapshot {
                    document: Arc::new(document),
                    fetched_at: Instant::now(),
                };
                state.current = Some(snapshot.clone());
                info!(%key, "refreshed feed");
                Ok(snapshot)
            }
            Err(e) => {
                warn!(%key, error = %e, "feed refresh failed");
                Err(Arc::new(e))
            }
        }
    }
}

/// What a caller does after inspecting its slot.
enum Plan {
    Serve(Cached),
    Await {
        refresh: Refresh,
        previous: Option<Snapshot>,
    },
}

/// Time-bounded, single-flight cache in front of a [`FeedFetcher`].
pub struct FreshnessCache {
    fetcher: Arc<dyn FeedFetcher>,
    slots: MokaCache<FeedKey, Arc<Slot>>,
    ttl: Duration,
}

impl FreshnessCache {
    /// Create a new cache with the given configuration.
    pub fn new(fetcher: Arc<dyn FeedFetcher>, config: &CacheConfig) -> Self {
        let slots = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .build();

        Self {
            fetcher,
            slots,
            ttl: config.ttl,
        }
    }

    /// Get the document for `key`, refreshing it if it has expired.
    pub async fn get(&self, key: FeedKey) -> Result<Cached, Arc<FetchError>> {
        let slot = self
            .slots
            .get_with(key, async { Arc::new(Slot::default()) })
            .await;

        let (refresh, previous) = match self.plan(key, &slot) {
            Plan::Serve(cached) => return Ok(cached),
            Plan::Await { refresh, previous } => (refresh, previous),
        };

        match refresh.await {
            Ok(snapshot) => Ok(snapshot.serve(Freshness::Fresh)),
            Err(e) => match previous {
                Some(previous) => {
                    warn!(%key, error = %e, "serving stale document after failed refresh");
                    Ok(previous.serve(Freshness::Stale))
                }
                None => Err(e),
            },
        }
    }

    fn plan(&self, key: FeedKey, slot: &Arc<Slot>) -> Plan {
        let mut state = slot.lock();

        if let Some(current) = &state.current {
            if current.fetched_at.elapsed() < self.ttl {
                debug!(%key, "cache hit");
                return Plan::Serve(current.serve(Freshness::Fresh));
            }
            if state.in_flight.is_some() {
                debug!(%key, "refresh in flight, serving previous document");
                return Plan::Serve(current.serve(Freshness::Stale));
            }
        }

        let refresh = match &state.in_flight {
            Some(refresh) => refresh.clone(),
            None => {
                let refresh = self.spawn_refresh(key, Arc::clone(slot));
                state.in_flight = Some(refresh.clone());
                refresh
            }
        };

        Plan::Await {
            refresh,
            previous: state.current.clone(),
        }
    }

    /// Start fetching `key` on a separate task.
    ///
    /// The task owns the fetch, so it completes even if every caller
    /// waiting on it is dropped.
    fn spawn_refresh(&self, key: FeedKey, slot: Arc<Slot>) -> Refresh {
        debug!(%key, "starting refresh");
        let fetcher = Arc::clone(&self.fetcher);
        let task_slot = Arc::clone(&slot);

        let task = tokio::spawn(async move {
            let result = fetcher.fetch(key).await;
            task_slot.complete(key, result)
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    slot.lock().in_flight = None;
                    Err(Arc::new(FetchError::Aborted(e.to_string())))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Drop every slot, forgetting all cached documents.
    pub fn invalidate_all(&self) {
        self.slots.invalidate_all();
    }
}
