//! Source traits for fetching filings and completions.
//!
//! This module defines the core source traits:
//!
//! - [`SourceInfo`] - Base trait for anything the pipeline talks to
//! - [`FilingSource`] - Produces 10-K sections for a ticker and fiscal year
//! - [`CompletionClient`] - Text completion backend used for specificity scoring

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::{DisclosureError, Result},
    types::{FilingDocument, Ticker},
};

/// Base trait for all sources.
///
/// All sources must implement this trait to provide basic metadata used in
/// logs and as the cache namespace.
pub trait SourceInfo: Send + Sync + Debug {
    /// Returns the name of this source (e.g., "SEC EDGAR").
    fn name(&self) -> &str;

    /// Returns a description of this source.
    fn description(&self) -> &str;
}

/// Source of 10-K disclosure sections.
#[async_trait]
pub trait FilingSource: SourceInfo {
    /// Fetches the annual report of `ticker` for fiscal year `year`.
    ///
    /// Returns [`DisclosureError::FilingNotAvailable`] when no 10-K exists for
    /// the year and [`DisclosureError::TickerNotFound`] for unknown tickers.
    async fn fetch_filing(&self, ticker: &Ticker, year: i32) -> Result<FilingDocument>;

    /// Fetches annual reports for several fiscal years.
    ///
    /// Default implementation calls `fetch_filing` sequentially for each year and
    /// skips years without a filing. Sources can override with a batch implementation.
    async fn fetch_filings(&self, ticker: &Ticker, years: &[i32]) -> Result<Vec<FilingDocument>> {
        let mut documents = Vec::with_capacity(years.len());

        for &year in years {
            match self.fetch_filing(ticker, year).await {
                Ok(doc) => documents.push(doc),
                Err(DisclosureError::FilingNotAvailable { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(documents)
    }
}

/// Text completion backend.
///
/// Implementations wrap a generative model API. Rate limiting by the remote
/// service must surface as [`DisclosureError::RateLimited`] so callers can back off.
#[async_trait]
pub trait CompletionClient: Send + Sync + Debug {
    /// Returns the model or service name.
    fn name(&self) -> &str;

    /// Sends a prompt and returns the raw response text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilingSections;

    #[derive(Debug)]
    struct EvenYearsOnly;

    impl SourceInfo for EvenYearsOnly {
        fn name(&self) -> &str {
            "even"
        }

        fn description(&self) -> &str {
            "Has filings for even years only"
        }
    }

    #[async_trait]
    impl FilingSource for EvenYearsOnly {
        async fn fetch_filing(&self, ticker: &Ticker, year: i32) -> Result<FilingDocument> {
            if ticker.as_str() == "NONE" {
                return Err(DisclosureError::TickerNotFound(ticker.to_string()));
            }
            if year % 2 != 0 {
                return Err(DisclosureError::FilingNotAvailable {
                    ticker: ticker.to_string(),
                    year,
                });
            }
            Ok(FilingDocument::new(
                ticker.clone(),
                "Even Corp",
                year,
                FilingSections::new(Some("risk".into()), None),
            ))
        }
    }

    #[tokio::test]
    async fn test_fetch_filings_skips_missing_years() {
        let source = EvenYearsOnly;
        let docs = source
            .fetch_filings(&Ticker::new("EVN"), &[2022, 2023, 2024])
            .await
            .unwrap();
        let years: Vec<i32> = docs.iter().map(|d| d.year).collect();
        assert_eq!(years, vec![2022, 2024]);
    }

    #[tokio::test]
    async fn test_fetch_filings_propagates_unknown_ticker() {
        let source = EvenYearsOnly;
        let err = source
            .fetch_filings(&Ticker::new("NONE"), &[2022])
            .await
            .unwrap_err();
        assert!(matches!(err, DisclosureError::TickerNotFound(_)));
    }
}
