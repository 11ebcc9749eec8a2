//! The tool catalogue and dispatch onto [`BixiService`].

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::QueryError;
use crate::facade::{BixiService, Reply};
use crate::gbfs::Language;

use super::dto::*;

/// A callable tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GetStations,
    GetStation,
    GetStationStatus,
    GetStationsStatus,
    FindNearbyStations,
    SearchStations,
    GetAvailableStations,
    GetSystemSummary,
    GetStationsWithIssues,
    GetSystemInfo,
    GetSystemAlerts,
    GetVehicleTypes,
    GetRawGbfsFeed,
}

impl Tool {
    pub const ALL: [Tool; 13] = [
        Tool::GetStations,
        Tool::GetStation,
        Tool::GetStationStatus,
        Tool::GetStationsStatus,
        Tool::FindNearbyStations,
        Tool::SearchStations,
        Tool::GetAvailableStations,
        Tool::GetSystemSummary,
        Tool::GetStationsWithIssues,
        Tool::GetSystemInfo,
        Tool::GetSystemAlerts,
        Tool::GetVehicleTypes,
        Tool::GetRawGbfsFeed,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::GetStations => "get_stations",
            Tool::GetStation => "get_station",
            Tool::GetStationStatus => "get_station_status",
            Tool::GetStationsStatus => "get_stations_status",
            Tool::FindNearbyStations => "find_nearby_stations",
            Tool::SearchStations => "search_stations",
            Tool::GetAvailableStations => "get_available_stations",
            Tool::GetSystemSummary => "get_system_summary",
            Tool::GetStationsWithIssues => "get_stations_with_issues",
            Tool::GetSystemInfo => "get_system_info",
            Tool::GetSystemAlerts => "get_system_alerts",
            Tool::GetVehicleTypes => "get_vehicle_types",
            Tool::GetRawGbfsFeed => "get_raw_gbfs_feed",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::GetStations => "List every BIXI station with its location and capacity.",
            Tool::GetStation => "Get one station by `station_id`.",
            Tool::GetStationStatus => "Get live bike and dock availability for one station.",
            Tool::GetStationsStatus => {
                "Get live availability for all stations, or for the comma-separated `station_ids`."
            }
            Tool::FindNearbyStations => {
                "Find stations within `radius` metres (default 1000) of `lat`/`lon`, nearest first."
            }
            Tool::SearchStations => {
                "Search stations by name, ignoring case and accents. Optional `limit` (default 20)."
            }
            Tool::GetAvailableStations => {
                "List renting stations with at least `min_bikes` bikes (default 1)."
            }
            Tool::GetSystemSummary => {
                "Network totals: stations online, capacity, bikes, docks and utilization."
            }
            Tool::GetStationsWithIssues => {
                "List stations that are offline, not renting or returning, empty, full, or have many disabled bikes or docks."
            }
            Tool::GetSystemInfo => "Get the system_information feed.",
            Tool::GetSystemAlerts => "Get active system alerts.",
            Tool::GetVehicleTypes => "Get the vehicle types in service.",
            Tool::GetRawGbfsFeed => {
                "Get a GBFS feed document verbatim by `feed_name`: station_information, station_status, system_information, system_alerts or vehicle_types."
            }
        }
    }

    pub fn info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name(),
            description: self.description(),
        }
    }
}

/// Run `tool` with JSON `args` and render its reply.
pub async fn call(service: &BixiService, tool: Tool, args: Value) -> Result<Response, QueryError> {
    let response = match tool {
        Tool::GetStations => {
            let a: LanguageArgs = parse_args(args)?;
            respond(service.stations(language(&a.language)?).await?)
        }
        Tool::GetStation => {
            let a: StationArgs = parse_args(args)?;
            respond(service.station(&a.station_id, language(&a.language)?).await?)
        }
        Tool::GetStationStatus => {
            let a: StationArgs = parse_args(args)?;
            respond(
                service
                    .station_status(&a.station_id, language(&a.language)?)
                    .await?,
            )
        }
        Tool::GetStationsStatus => {
            let a: StationsStatusArgs = parse_args(args)?;
            respond(
                service
                    .stations_status(a.station_ids.as_deref(), language(&a.language)?)
                    .await?,
            )
        }
        Tool::FindNearbyStations => {
            let a: NearbyArgs = parse_args(args)?;
            respond(
                service
                    .nearby(a.lat, a.lon, a.radius, language(&a.language)?)
                    .await?,
            )
        }
        Tool::SearchStations => {
            let a: SearchArgs = parse_args(args)?;
            respond(
                service
                    .search(&a.query, a.limit, language(&a.language)?)
                    .await?,
            )
        }
        Tool::GetAvailableStations => {
            let a: AvailableArgs = parse_args(args)?;
            respond(
                service
                    .available(a.min_bikes, language(&a.language)?)
                    .await?,
            )
        }
        Tool::GetSystemSummary => {
            let a: LanguageArgs = parse_args(args)?;
            respond(service.summary(language(&a.language)?).await?)
        }
        Tool::GetStationsWithIssues => {
            let a: LanguageArgs = parse_args(args)?;
            respond(service.issues(language(&a.language)?).await?)
        }
        Tool::GetSystemInfo => {
            let a: LanguageArgs = parse_args(args)?;
            respond(service.system_info(language(&a.language)?).await?)
        }
        Tool::GetSystemAlerts => {
            let a: LanguageArgs = parse_args(args)?;
            respond(service.alerts(language(&a.language)?).await?)
        }
        Tool::GetVehicleTypes => {
            let a: LanguageArgs = parse_args(args)?;
            respond(service.vehicle_types(language(&a.language)?).await?)
        }
        Tool::GetRawGbfsFeed => {
            let a: RawFeedArgs = parse_args(args)?;
            respond(
                service
                    .raw_feed(&a.feed_name, language(&a.language)?)
                    .await?,
            )
        }
    };

    Ok(response)
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, QueryError> {
    serde_json::from_value(args).map_err(|e| QueryError::invalid("arguments", e.to_string()))
}

fn language(code: &Option<String>) -> Result<Language, QueryError> {
    Ok(Language::parse_or_default(code.as_deref())?)
}

fn respond<T: Serialize>(reply: Reply<T>) -> Response {
    Json(ToolResponse {
        result: reply.data,
        stale: reply.stale,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::parse(tool.name()), Some(tool));
            assert!(!tool.description().is_empty());
        }
        assert_eq!(Tool::parse("get_weather"), None);
    }

    #[test]
    fn station_id_may_be_a_number() {
        let a: StationArgs = parse_args(json!({ "station_id": 42 })).unwrap();
        assert_eq!(a.station_id, "42");
        assert!(a.language.is_none());
    }

    #[test]
    fn missing_required_argument() {
        let err = parse_args::<NearbyArgs>(json!({ "lat": 45.5 })).unwrap_err();
        assert!(matches!(
            err,
            QueryError::InvalidArgument {
                field: "arguments",
                ..
            }
        ));
        assert!(err.to_string().contains("lon"));
    }

    #[test]
    fn language_defaults_and_validates() {
        assert_eq!(language(&None).unwrap(), Language::English);
        assert_eq!(language(&Some("FR".into())).unwrap(), Language::French);
        assert!(matches!(
            language(&Some("de".into())),
            Err(QueryError::InvalidArgument {
                field: "language",
                ..
            })
        ));
    }
}
