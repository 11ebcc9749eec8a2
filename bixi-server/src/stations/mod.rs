//! Station lookup and search over cached feeds.
//!
//! Provides station-ID indexes, proximity search and ranked name search.
//! Everything here is a pure function of already-fetched feed documents.

mod index;
mod normalize;
mod proximity;
mod search;

pub use index::{
    IndexMemo, RecordIndex, StationIndex, StationRecord, StatusIndex, compare_station_ids,
};
pub use normalize::normalize;
pub use proximity::{EARTH_RADIUS_M, haversine_distance, nearby};
pub use search::{MatchTier, NameRanker, TieredRanker, match_tier};
