//! Data transfer objects for tool requests and responses.

use serde::{Deserialize, Serialize};

/// Arguments for tools that take only a language.
#[derive(Debug, Default, Deserialize)]
pub struct LanguageArgs {
    /// `en` or `fr`, defaults to `en`
    pub language: Option<String>,
}

/// Arguments naming one station.
#[derive(Debug, Deserialize)]
pub struct StationArgs {
    #[serde(deserialize_with = "crate::gbfs::lenient_id")]
    pub station_id: String,

    pub language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StationsStatusArgs {
    /// Comma-separated station IDs; all stations when absent
    pub station_ids: Option<String>,

    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyArgs {
    pub lat: f64,
    pub lon: f64,

    /// Search radius in metres
    pub radius: Option<f64>,

    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    pub limit: Option<i64>,
    pub language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AvailableArgs {
    pub min_bikes: Option<u32>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawFeedArgs {
    pub feed_name: String,
    pub language: Option<String>,
}

/// Successful tool call.
#[derive(Debug, Serialize)]
pub struct ToolResponse<T> {
    pub result: T,

    /// True when any feed behind the result was past its TTL
    pub stale: bool,
}

/// Failed tool call.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,

    /// `invalid_argument`, `not_found` or `transport`
    pub kind: String,
}

/// A tool in the catalogue.
#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ToolList {
    pub tools: Vec<ToolInfo>,
}
