//! GBFS fetch error types.

/// Errors that can occur when fetching a feed from the GBFS endpoint.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint refused the request
    #[error("unauthorized by GBFS endpoint")]
    Unauthorized,

    /// Rate limited by the endpoint
    #[error("rate limited by GBFS endpoint")]
    RateLimited,

    /// Endpoint returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body was not a JSON document
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// The background refresh task died before producing a result
    #[error("refresh aborted: {0}")]
    Aborted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FetchError::Api {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "API error 503: Service Unavailable");

        let err = FetchError::Json {
            message: "expected value at line 1 column 1".into(),
            body: Some("<html>".into()),
        };
        assert!(err.to_string().contains("JSON parse error"));
        assert!(err.to_string().contains("expected value"));

        assert_eq!(
            FetchError::RateLimited.to_string(),
            "rate limited by GBFS endpoint"
        );
    }
}
