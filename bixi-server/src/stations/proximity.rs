//! Great-circle proximity search.

use crate::gbfs::Station;

use super::index::compare_station_ids;

/// Mean Earth radius in metres (spherical approximation).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in metres between two points in decimal degrees.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` fractionally past 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Stations within `radius_m` metres of (`lat`, `lon`), nearest first.
///
/// A station exactly `radius_m` away is included. Equal distances are
/// ordered by station ID.
pub fn nearby(stations: &[Station], lat: f64, lon: f64, radius_m: f64) -> Vec<(&Station, f64)> {
    let mut found: Vec<(&Station, f64)> = stations
        .iter()
        .map(|station| {
            let dist = haversine_distance(lat, lon, station.latitude, station.longitude);
            (station, dist)
        })
        .filter(|(_, dist)| *dist <= radius_m)
        .collect();

    found.sort_by(|a, b| {
        a.1.total_cmp(&b.1)
            .then_with(|| compare_station_ids(&a.0.station_id, &b.0.station_id))
    });
    found
}
