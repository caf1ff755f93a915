//! In-memory cache implementation.

use async_trait::async_trait;
use chrono::Utc;
use disclosure_core::{DisclosureCache, FilingDocument, Result, SpecificityAssessment, Ticker};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Cache entry with timestamp for TTL-based invalidation.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    cached_at: chrono::DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// Key for filing cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FilingKey {
    source: String,
    ticker: Ticker,
    year: i32,
}

/// Simple in-memory cache for testing and development.
///
/// Data is stored in `RwLock`-protected `HashMap`s and is lost when the cache
/// is dropped. Entries are cloned on get/put operations.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    filings: RwLock<HashMap<FilingKey, CacheEntry<FilingDocument>>>,
    assessments: RwLock<HashMap<(Ticker, i32), CacheEntry<SpecificityAssessment>>>,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached filings and assessments.
    pub async fn len(&self) -> usize {
        self.filings.read().await.len() + self.assessments.read().await.len()
    }

    /// Returns true if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DisclosureCache for InMemoryCache {
    #[instrument(skip(self), fields(source = %source, ticker = %ticker))]
    async fn get_filing(
        &self,
        source: &str,
        ticker: &Ticker,
        year: i32,
    ) -> Result<Option<FilingDocument>> {
        let key = FilingKey {
            source: source.to_string(),
            ticker: ticker.clone(),
            year,
        };

        let cache = self.filings.read().await;
        match cache.get(&key) {
            Some(entry) => {
                debug!("Cache hit for filing");
                Ok(Some(entry.data.clone()))
            }
            None => {
                debug!("Cache miss for filing");
                Ok(None)
            }
        }
    }

    #[instrument(
        skip(self, document),
        fields(source = %source, ticker = %document.ticker, year = document.year)
    )]
    async fn put_filing(&self, source: &str, document: &FilingDocument) -> Result<()> {
        let key = FilingKey {
            source: source.to_string(),
            ticker: document.ticker.clone(),
            year: document.year,
        };

        let mut cache = self.filings.write().await;
        cache.insert(key, CacheEntry::new(document.clone()));
        debug!("Cached filing");
        Ok(())
    }

    #[instrument(skip(self), fields(ticker = %ticker))]
    async fn get_assessment(
        &self,
        ticker: &Ticker,
        year: i32,
    ) -> Result<Option<SpecificityAssessment>> {
        let cache = self.assessments.read().await;
        Ok(cache
            .get(&(ticker.clone(), year))
            .map(|entry| entry.data.clone()))
    }

    #[instrument(
        skip(self, assessment),
        fields(ticker = %assessment.ticker, year = assessment.year)
    )]
    async fn put_assessment(&self, assessment: &SpecificityAssessment) -> Result<()> {
        let mut cache = self.assessments.write().await;
        cache.insert(
            (assessment.ticker.clone(), assessment.year),
            CacheEntry::new(assessment.clone()),
        );
        debug!("Cached assessment");
        Ok(())
    }

    async fn scored_keys(&self) -> Result<HashSet<(Ticker, i32)>> {
        Ok(self.assessments.read().await.keys().cloned().collect())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let mut removed = 0;

        {
            let mut cache = self.filings.write().await;
            let before = cache.len();
            cache.retain(|_, entry| !entry.is_stale(ttl));
            removed += before - cache.len();
        }

        {
            let mut cache = self.assessments.write().await;
            let before = cache.len();
            cache.retain(|_, entry| !entry.is_stale(ttl));
            removed += before - cache.len();
        }

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.filings.write().await.clear();
        self.assessments.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }
}
