//! Errors returned by query operations.

use std::sync::Arc;

use crate::gbfs::{FeedKey, FeedShapeError, FetchError, UnknownFeed, UnsupportedLanguage};

/// Broad category of a [`QueryError`], used by the tool layer to pick a
/// response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    NotFound,
    InvalidArgument,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidArgument => "invalid_argument",
        }
    }
}

/// Failure of a query operation.
///
/// Stale data is not an error: it is reported alongside successful results.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    /// Upstream fetch failed and no earlier document was available
    #[error("failed to fetch {key}: {source}")]
    Transport {
        key: FeedKey,
        source: Arc<FetchError>,
    },

    /// Feed document lacked its expected structure
    #[error(transparent)]
    Feed(#[from] FeedShapeError),

    /// Requested station or feed does not exist
    #[error("{what} '{id}' not found")]
    NotFound { what: &'static str, id: String },

    /// Caller supplied a malformed argument
    #[error("invalid argument `{field}`: {message}")]
    InvalidArgument {
        field: &'static str,
        message: String,
    },
}

impl QueryError {
    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        QueryError::NotFound {
            what,
            id: id.into(),
        }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        QueryError::InvalidArgument {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Transport { .. } | QueryError::Feed(_) => ErrorKind::Transport,
            QueryError::NotFound { .. } => ErrorKind::NotFound,
            QueryError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
        }
    }
}

impl From<UnsupportedLanguage> for QueryError {
    fn from(e: UnsupportedLanguage) -> Self {
        QueryError::invalid("language", e.to_string())
    }
}

impl From<UnknownFeed> for QueryError {
    fn from(e: UnknownFeed) -> Self {
        QueryError::not_found("feed", e.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbfs::{Feed, Language};

    #[test]
    fn error_display() {
        let err = QueryError::not_found("station", "9999");
        assert_eq!(err.to_string(), "station '9999' not found");
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = QueryError::invalid("limit", "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "invalid argument `limit`: must be greater than zero"
        );
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = QueryError::Transport {
            key: FeedKey::new(Feed::StationStatus, Language::French),
            source: Arc::new(FetchError::RateLimited),
        };
        assert_eq!(
            err.to_string(),
            "failed to fetch fr/station_status: rate limited by GBFS endpoint"
        );
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn conversions() {
        let err: QueryError = Language::parse("de").unwrap_err().into();
        assert!(matches!(
            err,
            QueryError::InvalidArgument {
                field: "language",
                ..
            }
        ));

        let err: QueryError = Feed::parse("bogus").unwrap_err().into();
        assert!(matches!(err, QueryError::NotFound { what: "feed", .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
