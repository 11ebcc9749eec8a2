//! Query operations over the cached BIXI feeds.
//!
//! Each operation resolves the feeds it needs through the shared
//! [`FreshnessCache`], looks up the indexes built from those documents
//! (rebuilt only when the cache swaps in a new document), and computes its
//! answer. Results carry a `stale` flag when any document used was past its
//! TTL.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::analytics::{self, StationIssue, SystemSummary};
use crate::cache::{Cached, FreshnessCache};
use crate::error::QueryError;
use crate::gbfs::{self, Feed, FeedKey, Language, Station, StationStatus};
use crate::stations::{self, IndexMemo, NameRanker, StationIndex, StatusIndex, TieredRanker};

/// Search radius used when the caller gives none, in metres.
pub const DEFAULT_RADIUS_M: f64 = 1000.0;

/// Name search result limit used when the caller gives none.
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// Minimum available bikes used when the caller gives none.
pub const DEFAULT_MIN_BIKES: u32 = 1;

/// A query result and whether it was computed from stale data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply<T> {
    pub data: T,
    pub stale: bool,
}

impl<T> Reply<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        Reply {
            data: f(self.data),
            stale: self.stale,
        }
    }
}

/// A station with its distance from the query point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyStation {
    #[serde(flatten)]
    pub station: Station,

    /// Rounded to centimetres.
    pub distance_meters: f64,
}

/// Name search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: String,
    /// Matches before the limit was applied.
    pub total_matches: usize,
    pub results: Vec<Station>,
}

/// Stations with operational issues.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemStations {
    pub total_problem_stations: usize,
    pub stations: Vec<StationIssue>,
}

/// The query service behind every exposed tool.
#[derive(Clone)]
pub struct BixiService {
    cache: Arc<FreshnessCache>,
    ranker: Arc<dyn NameRanker>,
    station_indexes: Arc<IndexMemo<Station>>,
    status_indexes: Arc<IndexMemo<StationStatus>>,
}

impl BixiService {
    /// Create a service over `cache`, ranking names with [`TieredRanker`].
    pub fn new(cache: Arc<FreshnessCache>) -> Self {
        Self::with_ranker(cache, Arc::new(TieredRanker))
    }

    pub fn with_ranker(cache: Arc<FreshnessCache>, ranker: Arc<dyn NameRanker>) -> Self {
        Self {
            cache,
            ranker,
            station_indexes: Arc::new(IndexMemo::new()),
            status_indexes: Arc::new(IndexMemo::new()),
        }
    }

    async fn document(&self, feed: Feed, language: Language) -> Result<Cached, QueryError> {
        let key = FeedKey::new(feed, language);
        self.cache
            .get(key)
            .await
            .map_err(|source| QueryError::Transport { key, source })
    }

    async fn station_index(
        &self,
        language: Language,
    ) -> Result<Reply<Arc<StationIndex>>, QueryError> {
        let cached = self.document(Feed::StationInformation, language).await?;
        Ok(Reply {
            data: self
                .station_indexes
                .index_for(language, &cached.document)?,
            stale: cached.is_stale(),
        })
    }

    async fn status_index(&self, language: Language) -> Result<Reply<Arc<StatusIndex>>, QueryError> {
        let cached = self.document(Feed::StationStatus, language).await?;
        Ok(Reply {
            data: self.status_indexes.index_for(language, &cached.document)?,
            stale: cached.is_stale(),
        })
    }

    async fn both_indexes(
        &self,
        language: Language,
    ) -> Result<(Arc<StationIndex>, Arc<StatusIndex>, bool), QueryError> {
        let (stations, statuses) =
            tokio::try_join!(self.station_index(language), self.status_index(language))?;
        let stale = stations.stale || statuses.stale;
        Ok((stations.data, statuses.data, stale))
    }

    /// All stations in feed order.
    pub async fn stations(&self, language: Language) -> Result<Reply<Vec<Station>>, QueryError> {
        Ok(self
            .station_index(language)
            .await?
            .map(|index| index.records().to_vec()))
    }

    /// One station by ID.
    pub async fn station(
        &self,
        station_id: &str,
        language: Language,
    ) -> Result<Reply<Station>, QueryError> {
        let index = self.station_index(language).await?;
        let station = index.data.require(station_id.trim())?.clone();
        Ok(Reply {
            data: station,
            stale: index.stale,
        })
    }

    /// Live status of one station by ID.
    pub async fn station_status(
        &self,
        station_id: &str,
        language: Language,
    ) -> Result<Reply<StationStatus>, QueryError> {
        let index = self.status_index(language).await?;
        let status = index.data.require(station_id.trim())?.clone();
        Ok(Reply {
            data: status,
            stale: index.stale,
        })
    }

    /// Live status of every station, or of the comma-separated `station_ids`.
    pub async fn stations_status(
        &self,
        station_ids: Option<&str>,
        language: Language,
    ) -> Result<Reply<Vec<StationStatus>>, QueryError> {
        let wanted: Option<HashSet<&str>> = station_ids.map(|ids| {
            ids.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .collect()
        });

        Ok(self.status_index(language).await?.map(|index| {
            index
                .iter()
                .filter(|s| {
                    wanted
                        .as_ref()
                        .is_none_or(|wanted| wanted.contains(s.station_id.as_str()))
                })
                .cloned()
                .collect()
        }))
    }

    /// Stations within `radius_m` metres of a point, nearest first.
    pub async fn nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_m: Option<f64>,
        language: Language,
    ) -> Result<Reply<Vec<NearbyStation>>, QueryError> {
        let radius_m = radius_m.unwrap_or(DEFAULT_RADIUS_M);
        validate_coordinates(lat, lon)?;
        if !radius_m.is_finite() || radius_m < 0.0 {
            return Err(QueryError::invalid(
                "radius",
                format!("must be a non-negative number of metres, got {radius_m}"),
            ));
        }

        let index = self.station_index(language).await?;
        let found = stations::nearby(index.data.records(), lat, lon, radius_m)
            .into_iter()
            .map(|(station, dist)| NearbyStation {
                station: station.clone(),
                distance_meters: (dist * 100.0).round() / 100.0,
            })
            .collect();

        Ok(Reply {
            data: found,
            stale: index.stale,
        })
    }

    /// Stations whose name matches `query`, best match first.
    pub async fn search(
        &self,
        query: &str,
        limit: Option<i64>,
        language: Language,
    ) -> Result<Reply<SearchResults>, QueryError> {
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        if limit <= 0 {
            return Err(QueryError::invalid(
                "limit",
                format!("must be greater than zero, got {limit}"),
            ));
        }
        if stations::normalize(query).is_empty() {
            return Err(QueryError::invalid("query", "must not be empty"));
        }

        let index = self.station_index(language).await?;
        let ranked = self.ranker.rank(query, index.data.records());
        let total_matches = ranked.len();
        let results = ranked
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(Reply {
            data: SearchResults {
                query: query.to_string(),
                total_matches,
                results,
            },
            stale: index.stale,
        })
    }

    /// Renting stations with at least `min_bikes` bikes available.
    pub async fn available(
        &self,
        min_bikes: Option<u32>,
        language: Language,
    ) -> Result<Reply<Vec<StationStatus>>, QueryError> {
        let min_bikes = min_bikes.unwrap_or(DEFAULT_MIN_BIKES);

        Ok(self.status_index(language).await?.map(|index| {
            index
                .iter()
                .filter(|s| s.is_renting && s.num_bikes_available >= min_bikes)
                .cloned()
                .collect()
        }))
    }

    /// Network-wide statistics.
    pub async fn summary(&self, language: Language) -> Result<Reply<SystemSummary>, QueryError> {
        let (stations, statuses, stale) = self.both_indexes(language).await?;
        Ok(Reply {
            data: analytics::summarize(&stations, &statuses),
            stale,
        })
    }

    /// Stations with operational issues.
    pub async fn issues(&self, language: Language) -> Result<Reply<ProblemStations>, QueryError> {
        let (stations, statuses, stale) = self.both_indexes(language).await?;
        let found = analytics::find_issues(&stations, &statuses);
        Ok(Reply {
            data: ProblemStations {
                total_problem_stations: found.len(),
                stations: found,
            },
            stale,
        })
    }

    /// The `data` object of `system_information`.
    pub async fn system_info(&self, language: Language) -> Result<Reply<Value>, QueryError> {
        let cached = self.document(Feed::SystemInformation, language).await?;
        let data = gbfs::data_object(&cached.document, Feed::SystemInformation)?.clone();
        Ok(Reply {
            data,
            stale: cached.is_stale(),
        })
    }

    /// Active system alerts.
    pub async fn alerts(&self, language: Language) -> Result<Reply<Vec<Value>>, QueryError> {
        let cached = self.document(Feed::SystemAlerts, language).await?;
        Ok(Reply {
            data: gbfs::optional_array(&cached.document, Feed::SystemAlerts, "alerts")?,
            stale: cached.is_stale(),
        })
    }

    /// Vehicle types in service.
    pub async fn vehicle_types(&self, language: Language) -> Result<Reply<Vec<Value>>, QueryError> {
        let cached = self.document(Feed::VehicleTypes, language).await?;
        Ok(Reply {
            data: gbfs::optional_array(&cached.document, Feed::VehicleTypes, "vehicle_types")?,
            stale: cached.is_stale(),
        })
    }

    /// A feed document exactly as fetched.
    pub async fn raw_feed(
        &self,
        feed_name: &str,
        language: Language,
    ) -> Result<Reply<Arc<Value>>, QueryError> {
        let feed = Feed::parse(feed_name)?;
        let cached = self.document(feed, language).await?;
        let stale = cached.is_stale();
        Ok(Reply {
            data: cached.document,
            stale,
        })
    }
}

fn validate_coordinates(lat: f64, lon: f64) -> Result<(), QueryError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(QueryError::invalid(
            "lat",
            format!("must be between -90 and 90, got {lat}"),
        ));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(QueryError::invalid(
            "lon",
            format!("must be between -180 and 180, got {lon}"),
        ));
    }
    Ok(())
}
