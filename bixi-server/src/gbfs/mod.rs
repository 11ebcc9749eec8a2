//! GBFS (General Bikeshare Feed Specification) client.
//!
//! BIXI publishes its network as a set of JSON feeds, one file per feed
//! and language:
//! - `station_information`: static station inventory (location, capacity)
//! - `station_status`: live bike and dock availability
//! - `system_information`, `system_alerts`, `vehicle_types`: metadata
//!
//! Documents are fetched as untyped JSON; the record types here are used
//! to interpret them on demand.

mod client;
mod decode;
mod error;
mod feed;
mod mock;
mod types;

pub use client::{DEFAULT_BASE_URL, FeedFetcher, FetcherConfig, HttpFeedFetcher};
pub use decode::{FeedShapeError, data_object, optional_array, records};
pub use error::FetchError;
pub use feed::{Feed, FeedKey, Language, UnknownFeed, UnsupportedLanguage};
pub use mock::MockFeedFetcher;
pub use types::{Station, StationStatus};

pub(crate) use types::lenient_id;
