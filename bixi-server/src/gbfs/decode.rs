//! Extraction of records from raw feed documents.
//!
//! Every GBFS document wraps its content in a `data` object. Record arrays
//! are decoded element by element: a malformed element is skipped rather
//! than failing the whole feed.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::feed::Feed;

/// A feed document did not have the expected top-level structure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {feed} feed: {message}")]
pub struct FeedShapeError {
    pub feed: Feed,
    pub message: String,
}

/// The `data` object of a feed document.
pub fn data_object(document: &Value, feed: Feed) -> Result<&Value, FeedShapeError> {
    document
        .get("data")
        .filter(|data| data.is_object())
        .ok_or_else(|| FeedShapeError {
            feed,
            message: "missing `data` object".to_string(),
        })
}

/// Decode the required `data.{field}` array into records.
///
/// Elements that fail to decode are logged and skipped.
pub fn records<T: DeserializeOwned>(
    document: &Value,
    feed: Feed,
    field: &str,
) -> Result<Vec<T>, FeedShapeError> {
    let items = data_object(document, feed)?
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| FeedShapeError {
            feed,
            message: format!("missing `data.{field}` array"),
        })?;

    let decoded: Vec<T> = items
        .iter()
        .enumerate()
        .filter_map(|(position, item)| match T::deserialize(item) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(%feed, position, error = %e, "skipping malformed record");
                None
            }
        })
        .collect();

    Ok(decoded)
}

/// The optional `data.{field}` array, passed through untouched.
///
/// Feeds such as `system_alerts` omit the array when there is nothing to
/// report, so absence is treated as empty.
pub fn optional_array(
    document: &Value,
    feed: Feed,
    field: &str,
) -> Result<Vec<Value>, FeedShapeError> {
    Ok(data_object(document, feed)?
        .get(field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbfs::Station;
    use serde_json::json;

    #[test]
    fn skips_malformed_records() {
        let document = json!({
            "last_updated": 1700000000,
            "ttl": 10,
            "data": {
                "stations": [
                    { "station_id": "1", "name": "A", "lat": 45.5, "lon": -73.5 },
                    { "station_id": "2", "name": "No coordinates" },
                    { "station_id": "3", "name": "C", "lat": 45.6, "lon": -73.6 }
                ]
            }
        });

        let stations: Vec<Station> =
            records(&document, Feed::StationInformation, "stations").unwrap();
        let ids: Vec<_> = stations.iter().map(|s| s.station_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn missing_array_is_an_error() {
        let document = json!({ "data": {} });
        let err = records::<Station>(&document, Feed::StationInformation, "stations").unwrap_err();
        assert_eq!(err.feed, Feed::StationInformation);
        assert!(err.message.contains("data.stations"));

        let document = json!({ "stations": [] });
        assert!(records::<Station>(&document, Feed::StationInformation, "stations").is_err());
    }

    #[test]
    fn optional_array_defaults_to_empty() {
        let document = json!({ "data": {} });
        assert!(
            optional_array(&document, Feed::SystemAlerts, "alerts")
                .unwrap()
                .is_empty()
        );

        let document = json!({ "data": { "alerts": [{ "alert_id": "a1" }] } });
        let alerts = optional_array(&document, Feed::SystemAlerts, "alerts").unwrap();
        assert_eq!(alerts.len(), 1);
    }
}
