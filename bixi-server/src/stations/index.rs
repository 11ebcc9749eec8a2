//! Lookup structures built from station feeds.
//!
//! An index is a pure function of one feed document. It is rebuilt from
//! scratch whenever the document changes; there is no incremental update.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::QueryError;
use crate::gbfs::{self, Feed, FeedShapeError, Language, Station, StationStatus};

/// A record keyed by station ID.
pub trait StationRecord: DeserializeOwned {
    /// Feed the records come from.
    const FEED: Feed;

    /// Name of the record kind in error messages.
    const KIND: &'static str;

    fn station_id(&self) -> &str;
}

impl StationRecord for Station {
    const FEED: Feed = Feed::StationInformation;
    const KIND: &'static str = "station";

    fn station_id(&self) -> &str {
        &self.station_id
    }
}

impl StationRecord for StationStatus {
    const FEED: Feed = Feed::StationStatus;
    const KIND: &'static str = "station status";

    fn station_id(&self) -> &str {
        &self.station_id
    }
}

/// Records in feed order with lookup by station ID.
///
/// When a station ID appears more than once, the first occurrence wins.
#[derive(Debug, Clone)]
pub struct RecordIndex<T> {
    records: Vec<T>,
    by_id: HashMap<String, usize>,
}

/// Index over `station_information`.
pub type StationIndex = RecordIndex<Station>;

/// Index over `station_status`.
pub type StatusIndex = RecordIndex<StationStatus>;

impl<T: StationRecord> RecordIndex<T> {
    /// Build from a feed document's `data.stations` array.
    pub fn from_document(document: &Value) -> Result<Self, FeedShapeError> {
        let records = gbfs::records(document, T::FEED, "stations")?;
        Ok(Self::from_records(records))
    }

    /// Build from already-decoded records.
    pub fn from_records(records: Vec<T>) -> Self {
        let mut kept = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());

        for record in records {
            if by_id.contains_key(record.station_id()) {
                continue;
            }
            by_id.insert(record.station_id().to_string(), kept.len());
            kept.push(record);
        }

        Self {
            records: kept,
            by_id,
        }
    }

    /// Look up a record by station ID.
    pub fn get(&self, station_id: &str) -> Option<&T> {
        self.by_id.get(station_id).map(|&i| &self.records[i])
    }

    /// Look up a record by station ID, failing with `NotFound`.
    pub fn require(&self, station_id: &str) -> Result<&T, QueryError> {
        self.get(station_id)
            .ok_or_else(|| QueryError::not_found(T::KIND, station_id))
    }

    pub fn contains(&self, station_id: &str) -> bool {
        self.by_id.contains_key(station_id)
    }

    /// All records in feed order.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Order station IDs numerically when both are integers, otherwise as text.
///
/// Integer IDs sort before non-integer ones, so the order is total.
pub fn compare_station_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

type Built<T> = (Arc<Value>, Arc<RecordIndex<T>>);

/// The index built from the latest document, per language.
///
/// A document is identified by its `Arc`, so an index is rebuilt only when
/// the cache has swapped in a new document.
pub struct IndexMemo<T> {
    built: Mutex<HashMap<Language, Built<T>>>,
}

impl<T> Default for IndexMemo<T> {
    fn default() -> Self {
        Self {
            built: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: StationRecord> IndexMemo<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Language, Built<T>>> {
        self.built.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The index of `document`, building it if `document` is new.
    pub fn index_for(
        &self,
        language: Language,
        document: &Arc<Value>,
    ) -> Result<Arc<RecordIndex<T>>, FeedShapeError> {
        if let Some((built_from, index)) = self.lock().get(&language) {
            if Arc::ptr_eq(built_from, document) {
                return Ok(Arc::clone(index));
            }
        }

        // Built outside the lock; a racing caller may build the same index.
        let index = Arc::new(RecordIndex::from_document(document)?);
        self.lock()
            .insert(language, (Arc::clone(document), Arc::clone(&index)));
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "last_updated": 1700000000,
            "ttl": 5,
            "data": {
                "stations": [
                    { "station_id": "10", "name": "Atwater / Sherbrooke", "lat": 45.49, "lon": -73.58, "capacity": 19 },
                    { "station_id": "2", "name": "Berri / de Maisonneuve", "lat": 45.51, "lon": -73.56, "capacity": 31 },
                    { "station_id": "10", "name": "Duplicate", "lat": 0.0, "lon": 0.0 },
                    { "name": "Missing id", "lat": 45.5, "lon": -73.5 }
                ]
            }
        })
    }

    #[test]
    fn keeps_feed_order_and_first_duplicate() {
        let index = StationIndex::from_document(&document()).unwrap();

        let ids: Vec<_> = index.iter().map(|s| s.station_id.as_str()).collect();
        assert_eq!(ids, vec!["10", "2"]);
        assert_eq!(index.get("10").unwrap().name, "Atwater / Sherbrooke");
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn require_reports_not_found() {
        let index = StationIndex::from_document(&document()).unwrap();

        assert_eq!(index.require("2").unwrap().capacity, 31);
        let err = index.require("999").unwrap_err();
        assert_eq!(err.to_string(), "station '999' not found");
    }

    #[test]
    fn status_index() {
        let document = json!({
            "data": {
                "stations": [{
                    "station_id": "2",
                    "num_bikes_available": 4,
                    "num_docks_available": 27,
                    "is_installed": true,
                    "is_renting": true,
                    "is_returning": true
                }]
            }
        });

        let index = StatusIndex::from_document(&document).unwrap();
        assert!(index.contains("2"));
        assert_eq!(index.get("2").unwrap().num_bikes_available, 4);
        assert!(matches!(
            index.require("1"),
            Err(QueryError::NotFound {
                what: "station status",
                ..
            })
        ));
    }

    #[test]
    fn document_without_stations_is_an_error() {
        let err = StationIndex::from_document(&json!({ "data": { "foo": 1 } })).unwrap_err();
        assert_eq!(err.feed, Feed::StationInformation);
    }

    #[test]
    fn empty_feed() {
        let index = StatusIndex::from_document(&json!({ "data": { "stations": [] } })).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn numeric_ids_compare_as_numbers() {
        let mut ids = vec!["11", "5", "b", "007", "7", "a", "20"];
        ids.sort_by(|a, b| compare_station_ids(a, b));
        assert_eq!(ids, vec!["5", "007", "7", "11", "20", "a", "b"]);
    }

    #[test]
    fn memo_rebuilds_only_for_new_documents() {
        let memo = IndexMemo::<Station>::new();
        let first = Arc::new(document());

        let a = memo.index_for(Language::English, &first).unwrap();
        let b = memo.index_for(Language::English, &first).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        // Same content in a different language is a separate entry.
        let fr = memo.index_for(Language::French, &first).unwrap();
        assert!(!Arc::ptr_eq(&a, &fr));

        let refreshed = Arc::new(json!({ "data": { "stations": [] } }));
        let c = memo.index_for(Language::English, &refreshed).unwrap();
        assert!(c.is_empty());
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn memo_does_not_keep_failed_builds() {
        let memo = IndexMemo::<StationStatus>::new();
        let broken = Arc::new(json!({ "stations": [] }));
        assert!(memo.index_for(Language::English, &broken).is_err());
        assert!(memo.lock().is_empty());
    }
}
