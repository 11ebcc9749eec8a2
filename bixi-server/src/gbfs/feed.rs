//! Feed names, languages, and the composite cache key.

use std::fmt;

/// Error returned when parsing a feed name outside the published set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown GBFS feed: {0}")]
pub struct UnknownFeed(pub String);

/// Error returned when parsing a language code other than `en` or `fr`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language code '{0}' (expected \"en\" or \"fr\")")]
pub struct UnsupportedLanguage(pub String);

/// One of the GBFS feeds published by the operator.
///
/// # Examples
///
/// ```
/// use bixi_server::gbfs::Feed;
///
/// let feed = Feed::parse("station_status").unwrap();
/// assert_eq!(feed, Feed::StationStatus);
/// assert_eq!(feed.as_str(), "station_status");
///
/// assert!(Feed::parse("free_bike_status").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feed {
    StationInformation,
    StationStatus,
    SystemInformation,
    SystemAlerts,
    VehicleTypes,
}

impl Feed {
    /// Every feed the server knows how to fetch.
    pub const ALL: [Feed; 5] = [
        Feed::StationInformation,
        Feed::StationStatus,
        Feed::SystemInformation,
        Feed::SystemAlerts,
        Feed::VehicleTypes,
    ];

    /// Parse a feed from its GBFS file name (without the `.json` suffix).
    pub fn parse(s: &str) -> Result<Self, UnknownFeed> {
        Self::ALL
            .into_iter()
            .find(|feed| feed.as_str() == s.trim())
            .ok_or_else(|| UnknownFeed(s.to_string()))
    }

    /// The GBFS file name of this feed.
    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::StationInformation => "station_information",
            Feed::StationStatus => "station_status",
            Feed::SystemInformation => "system_information",
            Feed::SystemAlerts => "system_alerts",
            Feed::VehicleTypes => "vehicle_types",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language variant of a feed. BIXI publishes English and French.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    #[default]
    English,
    French,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::French];

    /// Parse a language code. Case and surrounding whitespace are ignored.
    pub fn parse(s: &str) -> Result<Self, UnsupportedLanguage> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::English),
            "fr" => Ok(Language::French),
            _ => Err(UnsupportedLanguage(s.to_string())),
        }
    }

    /// Parse an optional language code, defaulting to English.
    pub fn parse_or_default(s: Option<&str>) -> Result<Self, UnsupportedLanguage> {
        s.map_or(Ok(Language::default()), Language::parse)
    }

    /// The two-letter code used in feed URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key for a feed: the feed itself plus its language variant.
///
/// English and French payloads differ, so each pair is cached separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedKey {
    pub feed: Feed,
    pub language: Language,
}

impl FeedKey {
    pub fn new(feed: Feed, language: Language) -> Self {
        Self { feed, language }
    }
}

impl fmt::Display for FeedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.language, self.feed)
    }
}
