//! System-wide statistics and station issue detection.
//!
//! Joins `station_information` (capacity, names) with `station_status`
//! (live counts) by station ID. Both computations are pure functions of the
//! two indexes, so repeated calls over the same documents agree.

use serde::Serialize;

use crate::gbfs::StationStatus;
use crate::stations::{StationIndex, StatusIndex};

/// Fraction of disabled equipment above which a station is flagged.
const DISABLED_RATE_THRESHOLD: f64 = 0.3;

/// Aggregate statistics for the whole network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSummary {
    /// Stations in `station_information`.
    pub total_stations: usize,

    /// Stations present in both feeds. Only these contribute to the
    /// capacity and availability totals below.
    pub matched_stations: usize,

    /// Matched stations reporting `is_installed`.
    pub online_stations: usize,

    pub offline_stations: usize,

    /// Online share of matched stations, in percent (one decimal).
    pub online_percentage: f64,

    pub total_capacity: u64,
    pub total_bikes_available: u64,
    pub total_ebikes_available: u64,
    pub total_docks_available: u64,

    /// Bikes available as a share of capacity, in percent (one decimal).
    pub system_utilization_rate: f64,

    /// Stations with information but no status.
    pub unmatched_information: usize,

    /// Statuses whose station is missing from the information feed.
    pub unmatched_status: usize,
}

/// Compute the network summary.
pub fn summarize(stations: &StationIndex, statuses: &StatusIndex) -> SystemSummary {
    let mut matched_stations = 0;
    let mut online_stations = 0;
    let mut total_capacity = 0u64;
    let mut total_bikes_available = 0u64;
    let mut total_ebikes_available = 0u64;
    let mut total_docks_available = 0u64;

    for station in stations.iter() {
        let Some(status) = statuses.get(&station.station_id) else {
            continue;
        };

        matched_stations += 1;
        if status.is_installed {
            online_stations += 1;
        }
        total_capacity += u64::from(station.capacity);
        total_bikes_available += u64::from(status.num_bikes_available);
        total_ebikes_available += u64::from(status.num_ebikes_available);
        total_docks_available += u64::from(status.num_docks_available);
    }

    let unmatched_status = statuses
        .iter()
        .filter(|status| !stations.contains(&status.station_id))
        .count();

    SystemSummary {
        total_stations: stations.len(),
        matched_stations,
        online_stations,
        offline_stations: matched_stations - online_stations,
        online_percentage: percentage(online_stations as u64, matched_stations as u64),
        total_capacity,
        total_bikes_available,
        total_ebikes_available,
        total_docks_available,
        system_utilization_rate: percentage(total_bikes_available, total_capacity),
        unmatched_information: stations.len() - matched_stations,
        unmatched_status,
    }
}

/// `part / whole` as a percentage rounded to one decimal; 0.0 when `whole`
/// is zero.
fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part as f64 / whole as f64 * 100.0, 1)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// An operational problem reported for a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Issue {
    NotInstalled,
    NotRenting,
    NotReturning,
    NoBikesAvailable,
    NoDocksAvailable,
    HighDisabledRate,
}

impl Issue {
    pub fn description(&self) -> &'static str {
        match self {
            Issue::NotInstalled => "Station not installed",
            Issue::NotRenting => "Not renting bikes",
            Issue::NotReturning => "Not accepting bike returns",
            Issue::NoBikesAvailable => "No bikes available",
            Issue::NoDocksAvailable => "No docks available",
            Issue::HighDisabledRate => "High equipment failure rate",
        }
    }
}

/// Every issue a status exhibits, in a fixed order.
pub fn detect_issues(status: &StationStatus) -> Vec<Issue> {
    let mut issues = Vec::new();

    if !status.is_installed {
        issues.push(Issue::NotInstalled);
    }
    if status.is_installed && !status.is_renting {
        issues.push(Issue::NotRenting);
    }
    if status.is_installed && !status.is_returning {
        issues.push(Issue::NotReturning);
    }
    if status.is_renting && status.num_bikes_available == 0 && status.num_ebikes_available == 0 {
        issues.push(Issue::NoBikesAvailable);
    }
    if status.is_returning && status.num_docks_available == 0 {
        issues.push(Issue::NoDocksAvailable);
    }
    if disabled_rate(status).is_some_and(|rate| rate > DISABLED_RATE_THRESHOLD) {
        issues.push(Issue::HighDisabledRate);
    }

    issues
}

/// Share of disabled bikes and docks among all reported equipment.
fn disabled_rate(status: &StationStatus) -> Option<f64> {
    let disabled = u64::from(status.num_bikes_disabled) + u64::from(status.num_docks_disabled);
    let total = disabled
        + u64::from(status.num_bikes_available)
        + u64::from(status.num_docks_available);
    (total > 0).then(|| disabled as f64 / total as f64)
}

/// The status fields relevant to an issue report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub is_installed: bool,
    pub is_renting: bool,
    pub is_returning: bool,
    pub bikes_available: u32,
    pub ebikes_available: u32,
    pub docks_available: u32,
    pub bikes_disabled: u32,
    pub docks_disabled: u32,

    /// RFC 3339 time of the station's last report.
    pub last_reported: Option<String>,
}

impl From<&StationStatus> for StatusSnapshot {
    fn from(status: &StationStatus) -> Self {
        Self {
            is_installed: status.is_installed,
            is_renting: status.is_renting,
            is_returning: status.is_returning,
            bikes_available: status.num_bikes_available,
            ebikes_available: status.num_ebikes_available,
            docks_available: status.num_docks_available,
            bikes_disabled: status.num_bikes_disabled,
            docks_disabled: status.num_docks_disabled,
            last_reported: status.last_reported_at().map(|at| at.to_rfc3339()),
        }
    }
}

/// Issues found at one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationIssue {
    pub station_id: String,

    /// `None` when the station is missing from the information feed.
    pub station_name: Option<String>,

    pub issues: Vec<Issue>,

    /// Disabled equipment share in percent, when flagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_percentage: Option<f64>,

    pub status: StatusSnapshot,
}

/// Stations with at least one issue, in status feed order.
pub fn find_issues(stations: &StationIndex, statuses: &StatusIndex) -> Vec<StationIssue> {
    statuses
        .iter()
        .filter_map(|status| {
            let issues = detect_issues(status);
            if issues.is_empty() {
                return None;
            }

            let disabled_percentage = issues
                .contains(&Issue::HighDisabledRate)
                .then(|| disabled_rate(status).map(|rate| round_to(rate * 100.0, 1)))
                .flatten();

            Some(StationIssue {
                station_id: status.station_id.clone(),
                station_name: stations.get(&status.station_id).map(|s| s.name.clone()),
                issues,
                disabled_percentage,
                status: StatusSnapshot::from(status),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbfs::Station;

    fn station(id: &str, capacity: u32) -> Station {
        Station {
            station_id: id.to_string(),
            name: format!("Station {id}"),
            short_name: None,
            latitude: 45.5,
            longitude: -73.5,
            capacity,
            rental_methods: Default::default(),
            external_id: None,
            is_charging: None,
        }
    }

    fn status(id: &str, bikes: u32, docks: u32) -> StationStatus {
        StationStatus {
            station_id: id.to_string(),
            num_bikes_available: bikes,
            num_ebikes_available: 0,
            num_docks_available: docks,
            num_bikes_disabled: 0,
            num_docks_disabled: 0,
            is_installed: true,
            is_renting: true,
            is_returning: true,
            last_reported: Some(1_700_000_000),
        }
    }

    #[test]
    fn summary_totals_and_utilization() {
        let stations = StationIndex::from_records(vec![station("1", 10), station("2", 20)]);
        let statuses = StatusIndex::from_records(vec![status("1", 5, 5), status("2", 0, 20)]);

        let summary = summarize(&stations, &statuses);
        assert_eq!(summary.total_capacity, 30);
        assert_eq!(summary.total_bikes_available, 5);
        assert_eq!(summary.system_utilization_rate, 16.7);
        assert_eq!(summary.total_docks_available, 25);
        assert_eq!(summary.online_stations, 2);
        assert_eq!(summary.offline_stations, 0);
        assert_eq!(summary.online_percentage, 100.0);
    }

    #[test]
    fn unmatched_stations_are_tallied_not_summed() {
        let stations = StationIndex::from_records(vec![station("1", 10), station("2", 20)]);
        let statuses = StatusIndex::from_records(vec![status("1", 4, 6), status("3", 9, 1)]);

        let summary = summarize(&stations, &statuses);
        assert_eq!(summary.total_stations, 2);
        assert_eq!(summary.matched_stations, 1);
        assert_eq!(summary.total_capacity, 10);
        assert_eq!(summary.total_bikes_available, 4);
        assert_eq!(summary.unmatched_information, 1);
        assert_eq!(summary.unmatched_status, 1);
        assert_eq!(summary.system_utilization_rate, 40.0);
    }

    #[test]
    fn zero_capacity_reports_zero_utilization() {
        let stations = StationIndex::from_records(vec![station("1", 0)]);
        let statuses = StatusIndex::from_records(vec![status("1", 3, 0)]);

        let summary = summarize(&stations, &statuses);
        assert_eq!(summary.system_utilization_rate, 0.0);

        let empty = summarize(
            &StationIndex::from_records(vec![]),
            &StatusIndex::from_records(vec![]),
        );
        assert_eq!(empty.system_utilization_rate, 0.0);
        assert_eq!(empty.online_percentage, 0.0);
    }

    #[test]
    fn offline_stations_counted() {
        let stations = StationIndex::from_records(vec![
            station("1", 10),
            station("2", 10),
            station("3", 10),
        ]);
        let mut offline = status("3", 0, 0);
        offline.is_installed = false;
        let statuses =
            StatusIndex::from_records(vec![status("1", 1, 9), status("2", 2, 8), offline]);

        let summary = summarize(&stations, &statuses);
        assert_eq!(summary.online_stations, 2);
        assert_eq!(summary.offline_stations, 1);
        assert_eq!(summary.online_percentage, 66.7);
    }

    #[test]
    fn summary_is_deterministic() {
        let stations = StationIndex::from_records(vec![station("1", 10), station("2", 20)]);
        let statuses = StatusIndex::from_records(vec![status("1", 5, 5), status("2", 0, 20)]);

        assert_eq!(
            summarize(&stations, &statuses),
            summarize(&stations, &statuses)
        );
    }

    #[test]
    fn empty_renting_station_has_only_no_bikes_issue() {
        let s = status("1", 0, 12);
        assert_eq!(detect_issues(&s), vec![Issue::NoBikesAvailable]);
    }

    #[test]
    fn ebikes_count_as_available() {
        let mut s = status("1", 0, 12);
        s.num_ebikes_available = 2;
        assert!(detect_issues(&s).is_empty());
    }

    #[test]
    fn healthy_station_has_no_issues() {
        assert!(detect_issues(&status("1", 5, 5)).is_empty());
    }

    #[test]
    fn multiple_issues_reported_together() {
        let mut s = status("1", 0, 0);
        s.is_returning = false;
        assert_eq!(
            detect_issues(&s),
            vec![Issue::NotReturning, Issue::NoBikesAvailable]
        );

        let mut s = status("2", 3, 0);
        s.is_renting = false;
        assert_eq!(
            detect_issues(&s),
            vec![Issue::NotRenting, Issue::NoDocksAvailable]
        );
    }

    #[test]
    fn uninstalled_station() {
        let mut s = status("1", 0, 0);
        s.is_installed = false;
        s.is_renting = false;
        s.is_returning = false;
        assert_eq!(detect_issues(&s), vec![Issue::NotInstalled]);
    }

    #[test]
    fn high_disabled_rate() {
        let mut s = status("1", 3, 3);
        s.num_bikes_disabled = 2;
        s.num_docks_disabled = 2;
        assert_eq!(detect_issues(&s), vec![Issue::HighDisabledRate]);

        // 3 of 10 is exactly the threshold, not above it.
        let mut s = status("2", 4, 3);
        s.num_docks_disabled = 3;
        assert!(detect_issues(&s).is_empty());
    }

    #[test]
    fn find_issues_in_status_order_with_names() {
        let stations = StationIndex::from_records(vec![station("1", 10), station("2", 10)]);
        let mut broken = status("1", 3, 3);
        broken.num_bikes_disabled = 4;
        let statuses = StatusIndex::from_records(vec![
            status("9", 0, 5),
            status("2", 5, 5),
            broken,
        ]);

        let found = find_issues(&stations, &statuses);
        assert_eq!(found.len(), 2);

        assert_eq!(found[0].station_id, "9");
        assert_eq!(found[0].station_name, None);
        assert_eq!(found[0].issues, vec![Issue::NoBikesAvailable]);

        assert_eq!(found[1].station_id, "1");
        assert_eq!(found[1].station_name.as_deref(), Some("Station 1"));
        assert_eq!(found[1].issues, vec![Issue::HighDisabledRate]);
        assert_eq!(found[1].disabled_percentage, Some(40.0));
    }

    #[test]
    fn snapshot_reports_last_report_time() {
        let snapshot = StatusSnapshot::from(&status("1", 0, 5));
        assert_eq!(
            snapshot.last_reported.as_deref(),
            Some("2023-11-14T22:13:20+00:00")
        );

        let mut unreported = status("2", 0, 5);
        unreported.last_reported = None;
        assert_eq!(StatusSnapshot::from(&unreported).last_reported, None);
    }

    #[test]
    fn issue_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_value(Issue::NoBikesAvailable).unwrap(),
            serde_json::json!("no_bikes_available")
        );
    }
}
