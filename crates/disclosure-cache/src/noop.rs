//! No-op cache implementation.

use async_trait::async_trait;
use disclosure_core::{DisclosureCache, FilingDocument, Result, SpecificityAssessment, Ticker};
use std::collections::HashSet;
use std::time::Duration;
use tracing::trace;

/// A no-op cache that doesn't store anything.
///
/// All `get_*` methods return `Ok(None)` and all `put_*` methods return `Ok(())`.
/// Useful for disabling caching; a scoring run with this cache never resumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DisclosureCache for NoopCache {
    async fn get_filing(
        &self,
        _source: &str,
        _ticker: &Ticker,
        _year: i32,
    ) -> Result<Option<FilingDocument>> {
        trace!("NoopCache: get_filing called, returning None");
        Ok(None)
    }

    async fn put_filing(&self, _source: &str, _document: &FilingDocument) -> Result<()> {
        trace!("NoopCache: put_filing called, doing nothing");
        Ok(())
    }

    async fn get_assessment(
        &self,
        _ticker: &Ticker,
        _year: i32,
    ) -> Result<Option<SpecificityAssessment>> {
        trace!("NoopCache: get_assessment called, returning None");
        Ok(None)
    }

    async fn put_assessment(&self, _assessment: &SpecificityAssessment) -> Result<()> {
        trace!("NoopCache: put_assessment called, doing nothing");
        Ok(())
    }

    async fn scored_keys(&self) -> Result<HashSet<(Ticker, i32)>> {
        Ok(HashSet::new())
    }

    async fn invalidate_stale(&self, _ttl: Duration) -> Result<usize> {
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disclosure_core::FilingSections;

    #[tokio::test]
    async fn test_noop_stores_nothing() {
        let cache = NoopCache::new();
        let doc = FilingDocument::new(
            Ticker::new("U"),
            "Unity Software Inc.",
            2024,
            FilingSections::new(Some("risk".into()), None),
        );

        cache.put_filing("edgar", &doc).await.unwrap();
        assert!(cache.get_filing("edgar", &doc.ticker, 2024).await.unwrap().is_none());
        assert!(cache.scored_keys().await.unwrap().is_empty());
        assert_eq!(cache.invalidate_stale(Duration::ZERO).await.unwrap(), 0);
        cache.clear().await.unwrap();
    }
}
