//! Error types for pipeline operations.
//!
//! This module defines [`DisclosureError`] which covers all error cases that can occur
//! when fetching filings, extracting sections, scoring text, or caching results.

use thiserror::Error;

/// Errors that can occur during pipeline operations.
#[derive(Error, Debug)]
pub enum DisclosureError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a remote service.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The service that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The requested ticker is unknown to the source.
    #[error("Ticker not found: {0}")]
    TickerNotFound(String),

    /// No 10-K filing is available for the ticker and fiscal year.
    #[error("No 10-K filing available for {ticker} in {year}")]
    FilingNotAvailable {
        /// The ticker that was requested.
        ticker: String,
        /// The fiscal year that was requested.
        year: i32,
    },

    /// Error parsing data from a source or a model response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// No filing source is configured.
    #[error("Source not configured: {0}")]
    SourceNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The completion backend failed to produce a usable score.
    #[error("Scoring error: {0}")]
    Scoring(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(String),

    /// The requested feature is not supported.
    #[error("Feature not supported: {0}")]
    NotSupported(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl DisclosureError {
    /// Returns true if the error means the source simply has nothing for the request,
    /// as opposed to a failure worth surfacing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TickerNotFound(_) | Self::FilingNotAvailable { .. }
        )
    }
}

impl From<std::io::Error> for DisclosureError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Result type alias using [`DisclosureError`].
pub type Result<T> = std::result::Result<T, DisclosureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(DisclosureError::TickerNotFound("ZZZZ".to_string()).is_not_found());
        assert!(
            DisclosureError::FilingNotAvailable {
                ticker: "AAPL".to_string(),
                year: 2021
            }
            .is_not_found()
        );
        assert!(!DisclosureError::Network("timeout".to_string()).is_not_found());
    }

    #[test]
    fn test_display() {
        let err = DisclosureError::FilingNotAvailable {
            ticker: "CRWD".to_string(),
            year: 2022,
        };
        assert_eq!(err.to_string(), "No 10-K filing available for CRWD in 2022");
    }
}
