//! SQLite-based cache implementation.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use disclosure_core::{
    DisclosureCache, DisclosureError, FilingDocument, Result, SpecificityAssessment, Ticker,
};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument};

fn cache_err(e: impl std::fmt::Display) -> DisclosureError {
    DisclosureError::Cache(e.to_string())
}

/// Fixed-width timestamps so `cached_at` compares correctly as text.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// SQLite-based cache for filings and assessments.
///
/// This cache stores data in a SQLite database file, providing persistence across
/// runs. A scoring run pointed at the same file resumes where the last one stopped.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Create a new SQLite cache at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(cache_err)?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory SQLite cache.
    ///
    /// Useful for testing; data is lost when the cache is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(cache_err)?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(cache_err)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS filings_cache (
                source TEXT NOT NULL,
                ticker TEXT NOT NULL,
                year INTEGER NOT NULL,
                data_json TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (source, ticker, year)
            )",
            [],
        )
        .map_err(cache_err)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS assessments_cache (
                ticker TEXT NOT NULL,
                year INTEGER NOT NULL,
                data_json TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (ticker, year)
            )",
            [],
        )
        .map_err(cache_err)?;

        debug!("SQLite cache schema initialized");
        Ok(())
    }
}

#[async_trait]
impl DisclosureCache for SqliteCache {
    #[instrument(skip(self), fields(source = %source, ticker = %ticker))]
    async fn get_filing(
        &self,
        source: &str,
        ticker: &Ticker,
        year: i32,
    ) -> Result<Option<FilingDocument>> {
        let conn = self.conn.lock().map_err(cache_err)?;

        let json: Option<String> = conn
            .query_row(
                "SELECT data_json FROM filings_cache
                 WHERE source = ?1 AND ticker = ?2 AND year = ?3",
                params![source, ticker.as_str(), year],
                |row| row.get(0),
            )
            .optional()
            .map_err(cache_err)?;

        match json {
            Some(json) => {
                let doc = serde_json::from_str(&json)
                    .map_err(|e| DisclosureError::Cache(format!("Corrupt filing entry: {e}")))?;
                debug!("Cache hit for filing");
                Ok(Some(doc))
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
        let json = serde_json::to_string(document).map_err(cache_err)?;
        let cached_at = timestamp(Utc::now());

        let conn = self.conn.lock().map_err(cache_err)?;
        conn.execute(
            "INSERT OR REPLACE INTO filings_cache (source, ticker, year, data_json, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![source, document.ticker.as_str(), document.year, json, cached_at],
        )
        .map_err(cache_err)?;

        debug!("Cached filing");
        Ok(())
    }

    #[instrument(skip(self), fields(ticker = %ticker))]
    async fn get_assessment(
        &self,
        ticker: &Ticker,
        year: i32,
    ) -> Result<Option<SpecificityAssessment>> {
        let conn = self.conn.lock().map_err(cache_err)?;

        let json: Option<String> = conn
            .query_row(
                "SELECT data_json FROM assessments_cache WHERE ticker = ?1 AND year = ?2",
                params![ticker.as_str(), year],
                |row| row.get(0),
            )
            .optional()
            .map_err(cache_err)?;

        json.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| DisclosureError::Cache(format!("Corrupt assessment entry: {e}")))
        })
        .transpose()
    }

    #[instrument(
        skip(self, assessment),
        fields(ticker = %assessment.ticker, year = assessment.year)
    )]
    async fn put_assessment(&self, assessment: &SpecificityAssessment) -> Result<()> {
        let json = serde_json::to_string(assessment).map_err(cache_err)?;
        let cached_at = timestamp(Utc::now());

        let conn = self.conn.lock().map_err(cache_err)?;
        conn.execute(
            "INSERT OR REPLACE INTO assessments_cache (ticker, year, data_json, cached_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![assessment.ticker.as_str(), assessment.year, json, cached_at],
        )
        .map_err(cache_err)?;

        debug!("Cached assessment");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn scored_keys(&self) -> Result<HashSet<(Ticker, i32)>> {
        let conn = self.conn.lock().map_err(cache_err)?;

        let mut stmt = conn
            .prepare("SELECT ticker, year FROM assessments_cache")
            .map_err(cache_err)?;
        let keys = stmt
            .query_map([], |row| {
                Ok((Ticker::new(row.get::<_, String>(0)?), row.get::<_, i32>(1)?))
            })
            .map_err(cache_err)?
            .collect::<std::result::Result<HashSet<_>, _>>()
            .map_err(cache_err)?;

        Ok(keys)
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let ttl = chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let cutoff_str = timestamp(cutoff);

        let conn = self.conn.lock().map_err(cache_err)?;

        let mut total_deleted = 0usize;
        for table in ["filings_cache", "assessments_cache"] {
            total_deleted += conn
                .execute(
                    &format!("DELETE FROM {table} WHERE cached_at < ?1"),
                    params![cutoff_str],
                )
                .map_err(cache_err)?;
        }

        if total_deleted > 0 {
            debug!("Invalidated {} stale cache entries", total_deleted);
        }

        Ok(total_deleted)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(cache_err)?;

        conn.execute("DELETE FROM filings_cache", [])
            .map_err(cache_err)?;
        conn.execute("DELETE FROM assessments_cache", [])
            .map_err(cache_err)?;

        debug!("Cleared all cache entries");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disclosure_core::{CategoryJudgment, FilingSections, SpecificityCategory};
    use std::collections::BTreeMap;

    fn document(ticker: &str, year: i32) -> FilingDocument {
        FilingDocument::new(
            Ticker::new(ticker),
            "Rapid7, Inc.",
            year,
            FilingSections::new(Some("risk".into()), Some("cyber".into())),
        )
    }

    fn assessment(ticker: &str, year: i32) -> SpecificityAssessment {
        let mut judgments = BTreeMap::new();
        judgments.insert(
            SpecificityCategory::Frameworks,
            CategoryJudgment {
                score: Some(1),
                rationale: Some("NIST CSF".into()),
            },
        );
        SpecificityAssessment {
            ticker: Ticker::new(ticker),
            year,
            judgments,
            specificity_score: 1.0 / 6.0,
        }
    }

    #[tokio::test]
    async fn test_sqlite_cache_initialization() {
        let cache = SqliteCache::in_memory();
        assert!(cache.is_ok());
    }

    #[tokio::test]
    async fn test_filing_cache() {
        let cache = SqliteCache::in_memory().unwrap();
        let ticker = Ticker::new("RPD");

        assert!(cache.get_filing("test", &ticker, 2024).await.unwrap().is_none());

        cache.put_filing("test", &document("RPD", 2024)).await.unwrap();

        let cached = cache.get_filing("test", &ticker, 2024).await.unwrap();
        assert_eq!(cached, Some(document("RPD", 2024)));
        // Keyed by source as well.
        assert!(cache.get_filing("other", &ticker, 2024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_assessment_cache_and_scored_keys() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put_assessment(&assessment("RPD", 2023)).await.unwrap();
        cache.put_assessment(&assessment("RPD", 2023)).await.unwrap();
        cache.put_assessment(&assessment("VRNS", 2024)).await.unwrap();

        let keys = cache.scored_keys().await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&(Ticker::new("VRNS"), 2024)));

        let cached = cache
            .get_assessment(&Ticker::new("RPD"), 2023)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cached.score(SpecificityCategory::Frameworks), Some(1));
    }

    #[tokio::test]
    async fn test_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");

        SqliteCache::new(&path)
            .unwrap()
            .put_assessment(&assessment("PANW", 2025))
            .await
            .unwrap();

        let reopened = SqliteCache::new(&path).unwrap();
        assert!(
            reopened
                .scored_keys()
                .await
                .unwrap()
                .contains(&(Ticker::new("PANW"), 2025))
        );
    }

    #[tokio::test]
    async fn test_invalidate_stale() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put_filing("test", &document("S", 2024)).await.unwrap();
        cache.put_assessment(&assessment("S", 2024)).await.unwrap();

        assert_eq!(cache.invalidate_stale(Duration::from_secs(3600)).await.unwrap(), 0);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.invalidate_stale(Duration::ZERO).await.unwrap(), 2);
        assert!(cache.scored_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put_filing("test", &document("S", 2024)).await.unwrap();
        cache.put_assessment(&assessment("S", 2024)).await.unwrap();

        cache.clear().await.unwrap();

        assert!(cache.get_filing("test", &Ticker::new("S"), 2024).await.unwrap().is_none());
        assert!(cache.scored_keys().await.unwrap().is_empty());
    }
}
