//! GBFS record types.
//!
//! Field names follow the GBFS 2.2 JSON documents so records can be handed
//! back to callers unchanged. Decoding is lenient where the published feeds
//! are inconsistent: station IDs may be strings or numbers, and boolean
//! flags may be `true`/`false` or `1`/`0`.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

/// A docking station from `station_information`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Station {
    /// Unique station identifier.
    #[serde(deserialize_with = "lenient_id")]
    pub station_id: String,

    /// Public name. The `en` and `fr` feeds may differ.
    pub name: String,

    /// Short public code printed on the station.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    /// Latitude in decimal degrees (WGS 84).
    #[serde(rename = "lat")]
    pub latitude: f64,

    /// Longitude in decimal degrees (WGS 84).
    #[serde(rename = "lon")]
    pub longitude: f64,

    /// Number of docks.
    #[serde(default)]
    pub capacity: u32,

    /// Payment methods accepted at the kiosk (e.g. "KEY", "CREDITCARD").
    #[serde(default)]
    pub rental_methods: BTreeSet<String>,

    /// Operator-side identifier, when published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// Whether the station charges e-bikes (BIXI extension).
    #[serde(
        default,
        deserialize_with = "lenient_optional_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_charging: Option<bool>,
}

/// Live availability for one station from `station_status`.
///
/// Counts are reported as-is. In particular, bikes plus docks is not
/// guaranteed to match the station's capacity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StationStatus {
    #[serde(deserialize_with = "lenient_id")]
    pub station_id: String,

    pub num_bikes_available: u32,

    /// E-bikes available (BIXI extension, absent on some feeds).
    #[serde(default)]
    pub num_ebikes_available: u32,

    pub num_docks_available: u32,

    #[serde(default)]
    pub num_bikes_disabled: u32,

    #[serde(default)]
    pub num_docks_disabled: u32,

    #[serde(deserialize_with = "lenient_flag")]
    pub is_installed: bool,

    #[serde(deserialize_with = "lenient_flag")]
    pub is_renting: bool,

    #[serde(deserialize_with = "lenient_flag")]
    pub is_returning: bool,

    /// Unix timestamp (seconds) of the station's last report.
    #[serde(default)]
    pub last_reported: Option<i64>,
}

impl StationStatus {
    /// Time of the last report, when present and representable.
    pub fn last_reported_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.last_reported
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

pub(crate) fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Number(i64),
}

impl From<RawFlag> for bool {
    fn from(flag: RawFlag) -> Self {
        match flag {
            RawFlag::Bool(b) => b,
            RawFlag::Number(n) => n != 0,
        }
    }
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    RawFlag::deserialize(deserializer).map(bool::from)
}

fn lenient_optional_flag<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<bool>, D::Error> {
    Ok(Option::<RawFlag>::deserialize(deserializer)?.map(bool::from))
}
