//! Filing source registry with fallback behavior and universe collection.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use disclosure_core::{
    DisclosureCache, DisclosureError, FilingDocument, FilingRecord, FilingSource, Result, Ticker,
    Universe,
};

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

const fn default_max_concurrency() -> usize {
    8
}

const fn default_request_pause() -> Duration {
    Duration::from_millis(400)
}

/// Settings for [`FilingRegistry::collect`].
///
/// ```
/// use disclosure::CollectOptions;
///
/// let options: CollectOptions = serde_json::from_str(r#"{"max_concurrency": 2}"#).unwrap();
/// assert_eq!(options.max_concurrency, 2);
/// assert_eq!(options.request_pause.as_millis(), 400);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectOptions {
    /// Tickers processed at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Pause between the fiscal years of one ticker, in milliseconds when serialized.
    #[serde(default = "default_request_pause", with = "millis")]
    pub request_pause: Duration,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            request_pause: default_request_pause(),
        }
    }
}

/// Outcome of a (ticker, year) lookup that no source could serve.
#[derive(Debug)]
struct SourcesFailed {
    /// Error from the last source tried.
    error: DisclosureError,
    /// Every source answered `TickerNotFound`.
    ticker_unknown: bool,
}

/// Registry of filing sources tried in order until one succeeds.
///
/// # Example
///
/// ```rust,ignore
/// use disclosure::{FilingRegistry, Ticker};
///
/// let registry = FilingRegistry::new()
///     .with_archive("extractions")
///     .with_edgar("MyApp/1.0 (contact@example.com)");
///
/// let filing = registry.fetch_filing(&Ticker::new("PANW"), 2024).await?;
/// println!("{}", filing.company_name);
/// ```
#[derive(Default)]
pub struct FilingRegistry {
    sources: Vec<Arc<dyn FilingSource>>,
    cache: Option<Arc<dyn DisclosureCache>>,
    options: CollectOptions,
}

impl std::fmt::Debug for FilingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilingRegistry")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("cache", &self.cache.as_ref().map(|_| "configured"))
            .field("options", &self.options)
            .finish()
    }
}

impl FilingRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache for this registry.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn DisclosureCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the options used by [`Self::collect`].
    #[must_use]
    pub const fn with_collect_options(mut self, options: CollectOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a source after the ones already registered.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn FilingSource>) -> Self {
        self.register(source);
        self
    }

    /// Register a filing source.
    pub fn register(&mut self, source: Arc<dyn FilingSource>) {
        debug!(source = source.name(), "Registering filing source");
        self.sources.push(source);
    }

    /// Names of the registered sources, in fallback order.
    #[must_use]
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Fetch one filing, trying sources in order until one succeeds.
    ///
    /// If a cache is configured, each source's cached copy is checked before
    /// the source itself and results are cached on success.
    pub async fn fetch_filing(&self, ticker: &Ticker, year: i32) -> Result<FilingDocument> {
        if self.sources.is_empty() {
            return Err(DisclosureError::SourceNotConfigured(
                "No filing sources registered".to_string(),
            ));
        }
        self.try_sources(ticker, year).await.map_err(|f| f.error)
    }

    async fn try_sources(
        &self,
        ticker: &Ticker,
        year: i32,
    ) -> std::result::Result<FilingDocument, SourcesFailed> {
        let mut last_error = None;
        let mut ticker_unknown = true;
        for source in &self.sources {
            if let Some(cache) = &self.cache {
                match cache.get_filing(source.name(), ticker, year).await {
                    Ok(Some(cached)) => {
                        debug!(
                            source = source.name(),
                            ticker = %ticker,
                            year,
                            "Cache hit for filing"
                        );
                        return Ok(cached);
                    }
                    Ok(None) => {}
                    Err(e) => warn!(source = source.name(), error = %e, "Cache lookup failed"),
                }
            }

            debug!(source = source.name(), ticker = %ticker, year, "Fetching filing");
            match source.fetch_filing(ticker, year).await {
                Ok(document) => {
                    if let Some(cache) = &self.cache {
                        if let Err(e) = cache.put_filing(source.name(), &document).await {
                            warn!(
                                source = source.name(),
                                error = %e,
                                "Failed to cache filing"
                            );
                        }
                    }
                    return Ok(document);
                }
                Err(e) => {
                    if e.is_not_found() {
                        debug!(
                            source = source.name(),
                            error = %e,
                            "Source has no filing, trying next"
                        );
                    } else {
                        warn!(
                            source = source.name(),
                            error = %e,
                            "Source failed, trying next"
                        );
                    }
                    ticker_unknown &= matches!(e, DisclosureError::TickerNotFound(_));
                    last_error = Some(e);
                }
            }
        }

        Err(SourcesFailed {
            error: last_error.unwrap_or_else(|| {
                DisclosureError::Other("All sources failed with no error".to_string())
            }),
            ticker_unknown,
        })
    }

    /// Fetch every fiscal year of one ticker, pausing between years.
    ///
    /// Years that fail are logged and skipped. A ticker unknown to every source
    /// stops the loop.
    async fn collect_ticker(
        &self,
        sector: &str,
        ticker: &Ticker,
        years: &[i32],
    ) -> Vec<(String, FilingDocument)> {
        let mut documents = Vec::with_capacity(years.len());

        for (i, &year) in years.iter().enumerate() {
            if i > 0 && !self.options.request_pause.is_zero() {
                tokio::time::sleep(self.options.request_pause).await;
            }

            match self.try_sources(ticker, year).await {
                Ok(document) => documents.push((sector.to_string(), document)),
                Err(SourcesFailed {
                    ticker_unknown: true,
                    ..
                }) => {
                    warn!(ticker = %ticker, sector, "Ticker unknown to every source, skipping");
                    break;
                }
                Err(SourcesFailed { error, .. }) => {
                    warn!(ticker = %ticker, year, error = %error, "Skipping filing");
                }
            }
        }

        documents
    }

    /// Fetch every (ticker, year) of the universe as (sector, document) pairs.
    ///
    /// Tickers run concurrently up to `max_concurrency`; the result is sorted by
    /// sector, ticker and year.
    pub async fn collect_documents(
        &self,
        universe: &Universe,
    ) -> Result<Vec<(String, FilingDocument)>> {
        universe.validate()?;
        if self.sources.is_empty() {
            return Err(DisclosureError::SourceNotConfigured(
                "No filing sources registered".to_string(),
            ));
        }

        let years = universe.years.as_slice();
        let batches: Vec<Vec<(String, FilingDocument)>> = stream::iter(universe.tasks())
            .map(|(sector, ticker)| self.collect_ticker(sector, ticker, years))
            .buffer_unordered(self.options.max_concurrency.max(1))
            .collect()
            .await;

        let mut documents: Vec<(String, FilingDocument)> = batches.into_iter().flatten().collect();
        documents.sort_by(|(sa, a), (sb, b)| {
            sa.cmp(sb)
                .then_with(|| a.ticker.cmp(&b.ticker))
                .then(a.year.cmp(&b.year))
        });

        info!(
            tickers = universe.ticker_count(),
            filings = documents.len(),
            "Collected filings"
        );
        Ok(documents)
    }

    /// Fetch the universe into filings table rows, sorted by sector, ticker and year.
    pub async fn collect(&self, universe: &Universe) -> Result<Vec<FilingRecord>> {
        Ok(self
            .collect_documents(universe)
            .await?
            .into_iter()
            .map(|(sector, document)| document.into_record(sector))
            .collect())
    }

    // Builder methods for easy setup with specific sources

    /// Add the SEC EDGAR source.
    #[cfg(feature = "edgar")]
    #[must_use]
    pub fn with_edgar(self, user_agent: &str) -> Self {
        self.with_source(Arc::new(disclosure_edgar::EdgarSource::new(user_agent)))
    }

    /// Add an extraction archive rooted at `path`.
    #[cfg(feature = "local")]
    #[must_use]
    pub fn with_archive(self, path: impl Into<std::path::PathBuf>) -> Self {
        self.with_source(Arc::new(disclosure_local::ExtractionArchive::new(path)))
    }

    /// Add a directory of `TICKER_YEAR.txt` combined texts.
    #[cfg(feature = "local")]
    #[must_use]
    pub fn with_flat_directory(self, path: impl Into<std::path::PathBuf>) -> Self {
        self.with_source(Arc::new(disclosure_local::FlatTextDirectory::new(path)))
    }
}
