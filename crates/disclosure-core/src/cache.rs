//! Cache trait for storing fetched filings and specificity assessments.
//!
//! This module defines the [`DisclosureCache`] trait that provides a unified interface
//! for caching extracted 10-K sections and model assessments.

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

use crate::{
    error::Result,
    types::{FilingDocument, SpecificityAssessment, Ticker},
};

/// Trait for caching pipeline results.
///
/// Implementations can store data in various backends (SQLite, in-memory, etc.)
/// to avoid re-downloading filings and to let scoring runs resume where they stopped.
#[async_trait]
pub trait DisclosureCache: Send + Sync {
    /// Retrieves a cached filing.
    ///
    /// Returns `Ok(Some(doc))` if cached, `Ok(None)` if not cached.
    async fn get_filing(
        &self,
        source: &str,
        ticker: &Ticker,
        year: i32,
    ) -> Result<Option<FilingDocument>>;

    /// Stores a filing in the cache.
    async fn put_filing(&self, source: &str, document: &FilingDocument) -> Result<()>;

    /// Retrieves a cached specificity assessment.
    ///
    /// Returns `Ok(Some(assessment))` if cached, `Ok(None)` if not cached.
    async fn get_assessment(
        &self,
        ticker: &Ticker,
        year: i32,
    ) -> Result<Option<SpecificityAssessment>>;

    /// Stores a specificity assessment in the cache.
    async fn put_assessment(&self, assessment: &SpecificityAssessment) -> Result<()>;

    /// Returns the (ticker, year) keys that already have an assessment.
    async fn scored_keys(&self) -> Result<HashSet<(Ticker, i32)>>;

    /// Removes cache entries older than the specified TTL.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;
}
