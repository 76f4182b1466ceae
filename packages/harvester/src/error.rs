//! Error types for the harvester.
//!
//! Ordinary HTTP outcomes (404, a 503 that survived every retry) are not
//! errors: the transport hands them back as a [`crate::http::Response`]
//! and the caller decides. `HarvesterError` covers everything else.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// Invalid run configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A URL could not be parsed or joined.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Transient transport failures persisted through every retry.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// A listing page could not be fetched; `page` is 1-based.
    #[error("Listing page {page} failed: {reason}")]
    Listing { page: u32, reason: String },

    /// No response was obtained and no transport error was recorded.
    #[error("No response obtained for {0}")]
    NoResponse(String),

    /// IO error on a known path.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarvesterError {
    /// Wrap an IO error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HarvesterError::Config("page size must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: page size must be at least 1"
        );
    }

    #[test]
    fn test_retries_exhausted_display() {
        let err = HarvesterError::RetriesExhausted {
            attempts: 4,
            message: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Request failed after 4 attempts: connection refused"
        );
    }

    #[test]
    fn test_listing_error_display() {
        let err = HarvesterError::Listing {
            page: 1,
            reason: "HTTP 503".to_string(),
        };
        assert_eq!(err.to_string(), "Listing page 1 failed: HTTP 503");
    }

    #[test]
    fn test_io_error_includes_path() {
        let err = HarvesterError::io(
            "/data/index.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/data/index.json"));
        assert!(err.to_string().contains("denied"));
    }
}
