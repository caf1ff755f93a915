#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/disclosure/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR filing source for 10-K disclosure sections.
//!
//! This crate downloads annual reports from SEC EDGAR and extracts their
//! disclosure sections:
//!
//! - CIK (Central Index Key) lookup from ticker symbols
//! - Filing history from the submissions API
//! - 10-K selection by fiscal year (year of the period of report)
//! - Primary document download and Item 1A / Item 1C extraction
//!
//! # Example
//!
//! ```no_run
//! use disclosure_edgar::EdgarSource;
//! use disclosure_core::{FilingSource, Ticker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = EdgarSource::new("MyApp/1.0 (contact@example.com)");
//!
//!     let filing = source.fetch_filing(&Ticker::new("CRWD"), 2024).await?;
//!     println!("{}: has Item 1C = {}", filing.company_name, filing.sections.has_cybersecurity());
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use disclosure_core::{
    DisclosureError, FilingDocument, FilingSource, Result, SourceInfo, Ticker,
};
use disclosure_text::{extract_sections, html_to_text};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// SEC EDGAR API base URL
const EDGAR_DATA_URL: &str = "https://data.sec.gov";

/// SEC website base URL (ticker map and filing archives)
const EDGAR_WWW_URL: &str = "https://www.sec.gov";

/// Default rate limit: 10 requests per second (SEC fair access guidance)
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Wait suggested after HTTP 429 when the server sends no `Retry-After`.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Attempts per request before giving up.
const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Annual report form type.
const FORM_10K: &str = "10-K";

/// Rate limiter to ensure we don't exceed SEC's rate limits
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// A company as listed in the SEC ticker map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CikEntry {
    /// CIK zero-padded to 10 digits.
    pub cik: String,
    /// Company title.
    pub title: String,
}

/// SEC EDGAR filing source.
///
/// Looks up a ticker's CIK, picks the 10-K for the requested fiscal year from
/// the company's submissions and extracts Item 1A and Item 1C from its primary
/// document. Requests are rate limited (max 10 requests/second by default) and
/// retried when the SEC answers with HTTP 429.
#[derive(Debug)]
pub struct EdgarSource {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    data_url: String,
    www_url: String,
    max_attempts: usize,
    tickers: OnceCell<HashMap<String, CikEntry>>,
    submissions: Mutex<HashMap<String, Arc<Submissions>>>,
}

impl EdgarSource {
    /// Create a new EDGAR source with the specified user agent.
    ///
    /// The SEC requires identifying user agent headers. Format should be:
    /// "AppName/Version (contact@email.com)"
    ///
    /// # Example
    /// ```
    /// use disclosure_edgar::EdgarSource;
    ///
    /// let source = EdgarSource::new("MyApp/1.0 (contact@example.com)");
    /// ```
    pub fn new(user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self::with_client(client)
    }

    /// Create a new EDGAR source with a custom HTTP client.
    ///
    /// The client must send an identifying user agent.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_RATE_LIMIT))),
            data_url: EDGAR_DATA_URL.to_string(),
            www_url: EDGAR_WWW_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            tickers: OnceCell::new(),
            submissions: Mutex::new(HashMap::new()),
        }
    }

    /// Points the source at other hosts, e.g. a mock server.
    ///
    /// `data_url` serves `/submissions/...`; `www_url` serves
    /// `/files/company_tickers.json` and `/Archives/...`.
    #[must_use]
    pub fn with_base_urls(
        mut self,
        data_url: impl Into<String>,
        www_url: impl Into<String>,
    ) -> Self {
        self.data_url = data_url.into().trim_end_matches('/').to_string();
        self.www_url = www_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the minimum interval between requests.
    #[must_use]
    pub fn with_rate_limit(mut self, min_interval: Duration) -> Self {
        self.rate_limiter = Arc::new(Mutex::new(RateLimiter::new(min_interval)));
        self
    }

    /// Sets how many attempts a request gets before an error is returned.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sends a rate-limited GET request.
    ///
    /// HTTP 429, 5xx and transport failures are retried up to `max_attempts`
    /// times; a 429 waits for the server's `Retry-After` hint.
    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let mut attempt = 1;
        loop {
            self.rate_limiter.lock().await.wait().await;

            let backoff = Duration::from_secs(attempt as u64);
            let (error, wait) = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.trim().parse::<u64>().ok())
                        .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs);
                    let error = DisclosureError::RateLimited {
                        provider: self.name().to_string(),
                        retry_after: Some(retry_after),
                    };
                    (error, retry_after)
                }
                Ok(response) if response.status().is_server_error() => (
                    DisclosureError::Network(format!(
                        "Request to {url} failed: HTTP {}",
                        response.status()
                    )),
                    backoff,
                ),
                Ok(response) => {
                    return Err(DisclosureError::Network(format!(
                        "Request to {url} failed: HTTP {}",
                        response.status()
                    )));
                }
                Err(e) => (DisclosureError::Network(e.to_string()), backoff),
            };

            if attempt >= self.max_attempts {
                return Err(error);
            }
            warn!(url, attempt, ?wait, error = %error, "Retrying EDGAR request");
            sleep(wait).await;
            attempt += 1;
        }
    }

    /// Fetches and memoizes the ticker map.
    async fn ticker_map(&self) -> Result<&HashMap<String, CikEntry>> {
        self.tickers
            .get_or_try_init(|| async {
                let url = format!("{}/files/company_tickers.json", self.www_url);
                debug!("Fetching company tickers from SEC");
                let data: HashMap<String, CompanyTickerInfo> = self
                    .get(&url)
                    .await?
                    .json()
                    .await
                    .map_err(|e| {
                        DisclosureError::Parse(format!("Failed to parse company tickers: {e}"))
                    })?;

                Ok::<_, DisclosureError>(
                    data.into_values()
                        .map(|company| {
                            (
                                company.ticker.to_uppercase(),
                                CikEntry {
                                    cik: format!("{:0>10}", company.cik_str),
                                    title: company.title,
                                },
                            )
                        })
                        .collect(),
                )
            })
            .await
    }

    /// Look up a company's CIK number and title from its ticker symbol.
    ///
    /// The CIK is zero-padded to 10 digits. The ticker map is downloaded once
    /// per source.
    pub async fn get_cik(&self, ticker: &Ticker) -> Result<CikEntry> {
        if ticker.as_str().is_empty() {
            return Err(DisclosureError::InvalidParameter("Empty ticker".to_string()));
        }

        let entry = self
            .ticker_map()
            .await?
            .get(ticker.as_str())
            .cloned()
            .ok_or_else(|| DisclosureError::TickerNotFound(ticker.to_string()))?;
        debug!(ticker = %ticker, cik = %entry.cik, "Resolved CIK");
        Ok(entry)
    }

    /// Fetch company submissions (filing history) from SEC EDGAR.
    pub async fn fetch_submissions(&self, cik: &str) -> Result<Submissions> {
        let cik_padded = format!("{cik:0>10}");
        let url = format!("{}/submissions/CIK{}.json", self.data_url, cik_padded);

        debug!("Fetching company submissions from {}", url);
        self.get(&url).await?.json().await.map_err(|e| {
            DisclosureError::Parse(format!("Failed to parse submissions for CIK {cik_padded}: {e}"))
        })
    }

    /// Submissions for `cik`, downloaded once per source.
    async fn cached_submissions(&self, cik: &str) -> Result<Arc<Submissions>> {
        if let Some(hit) = self.submissions.lock().await.get(cik) {
            return Ok(Arc::clone(hit));
        }

        let submissions = Arc::new(self.fetch_submissions(cik).await?);
        self.submissions
            .lock()
            .await
            .insert(cik.to_string(), Arc::clone(&submissions));
        Ok(submissions)
    }

    /// URL of a filing's primary document.
    #[must_use]
    pub fn document_url(&self, cik: &str, filing: &FilingEntry) -> String {
        let cik_number = cik.trim_start_matches('0');
        format!(
            "{}/Archives/edgar/data/{}/{}/{}",
            self.www_url,
            if cik_number.is_empty() { "0" } else { cik_number },
            filing.accession_number.replace('-', ""),
            filing.primary_document
        )
    }

    /// Downloads a filing's primary document and extracts its sections.
    async fn download_document(
        &self,
        ticker: &Ticker,
        company_name: &str,
        cik: &str,
        filing: &FilingEntry,
        year: i32,
    ) -> Result<FilingDocument> {
        let url = self.document_url(cik, filing);
        debug!(ticker = %ticker, year, %url, "Downloading 10-K");

        let html = self
            .get(&url)
            .await?
            .text()
            .await
            .map_err(|e| DisclosureError::Network(e.to_string()))?;
        let text = html_to_text(&html)?;
        let sections = extract_sections(&text, year);
        if sections.is_empty() {
            warn!(ticker = %ticker, year, "No disclosure sections found in 10-K");
        }

        Ok(
            FilingDocument::new(ticker.clone(), company_name, year, sections)
                .with_dates(filing.report_date, filing.filing_date),
        )
    }
}

/// Picks the 10-K whose period of report falls in `year`.
///
/// Submissions list the most recent filing first, so the most recent original
/// 10-K for the fiscal year is chosen. `10-K/A` amendments never match.
#[must_use]
pub fn annual_report_for_year(submissions: &Submissions, year: i32) -> Option<FilingEntry> {
    submissions
        .entries()
        .find(|f| f.form == FORM_10K && f.report_date.is_some_and(|d| d.year() == year))
}

impl SourceInfo for EdgarSource {
    fn name(&self) -> &str {
        "SEC EDGAR"
    }

    fn description(&self) -> &str {
        "SEC EDGAR 10-K filings with Item 1A and Item 1C extracted from the primary document"
    }
}

#[async_trait]
impl FilingSource for EdgarSource {
    async fn fetch_filing(&self, ticker: &Ticker, year: i32) -> Result<FilingDocument> {
        let company = self.get_cik(ticker).await?;
        let submissions = self.cached_submissions(&company.cik).await?;

        let filing = annual_report_for_year(&submissions, year).ok_or_else(|| {
            DisclosureError::FilingNotAvailable {
                ticker: ticker.to_string(),
                year,
            }
        })?;

        self.download_document(ticker, &submissions.name, &company.cik, &filing, year)
            .await
    }

    async fn fetch_filings(&self, ticker: &Ticker, years: &[i32]) -> Result<Vec<FilingDocument>> {
        let company = self.get_cik(ticker).await?;
        let submissions = self.cached_submissions(&company.cik).await?;

        let mut documents = Vec::with_capacity(years.len());
        for &year in years {
            let Some(filing) = annual_report_for_year(&submissions, year) else {
                debug!(ticker = %ticker, year, "No 10-K for fiscal year");
                continue;
            };
            documents.push(
                self.download_document(ticker, &submissions.name, &company.cik, &filing, year)
                    .await?,
            );
        }

        Ok(documents)
    }
}

// =============================================================================
// SEC API Response Types
// =============================================================================

/// Company ticker information from SEC JSON.
#[derive(Debug, Deserialize)]
struct CompanyTickerInfo {
    /// CIK as a number (SEC returns this as an integer)
    cik_str: u64,
    /// Ticker symbol
    ticker: String,
    /// Company name
    title: String,
}

/// Company submissions from the SEC EDGAR submissions API.
#[derive(Clone, Debug, Deserialize)]
pub struct Submissions {
    /// Registrant name
    pub name: String,
    /// Filing history
    pub filings: FilingHistory,
}

/// Container for filing history data.
#[derive(Clone, Debug, Deserialize)]
pub struct FilingHistory {
    /// Most recent filings
    pub recent: RecentFilings,
}

/// Recent filings as parallel arrays; index `i` of every array is one filing.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFilings {
    /// Accession numbers (unique filing identifiers)
    pub accession_number: Vec<String>,
    /// Form types (e.g., "10-K", "10-Q", "8-K")
    pub form: Vec<String>,
    /// Filing dates in YYYY-MM-DD format
    pub filing_date: Vec<String>,
    /// Period of report in YYYY-MM-DD format (may be empty)
    #[serde(default)]
    pub report_date: Vec<String>,
    /// Primary document filenames
    pub primary_document: Vec<String>,
}

/// One filing from the submissions history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilingEntry {
    /// Accession number, with dashes
    pub accession_number: String,
    /// Form type
    pub form: String,
    /// Filing date
    pub filing_date: Option<NaiveDate>,
    /// Period of report
    pub report_date: Option<NaiveDate>,
    /// Primary document filename
    pub primary_document: String,
}

fn parse_date(s: Option<&String>) -> Option<NaiveDate> {
    s.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

impl Submissions {
    /// Iterates over the recent filings, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = FilingEntry> + '_ {
        let recent = &self.filings.recent;
        (0..recent.accession_number.len()).filter_map(move |i| {
            Some(FilingEntry {
                accession_number: recent.accession_number.get(i)?.clone(),
                form: recent.form.get(i)?.clone(),
                filing_date: parse_date(recent.filing_date.get(i)),
                report_date: parse_date(recent.report_date.get(i)),
                primary_document: recent.primary_document.get(i)?.clone(),
            })
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tickers_json() -> serde_json::Value {
        serde_json::json!({
            "0": {"cik_str": 1535527, "ticker": "CRWD", "title": "CrowdStrike Holdings, Inc."},
            "1": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}
        })
    }

    fn submissions_json() -> serde_json::Value {
        serde_json::json!({
            "cik": "1535527",
            "name": "CrowdStrike Holdings, Inc.",
            "filings": {"recent": {
                "accessionNumber": ["0001535527-24-000010", "0001535527-24-000007", "0001535527-23-000009"],
                "form": ["8-K", "10-K", "10-K"],
                "filingDate": ["2024-06-01", "2024-03-07", "2023-03-09"],
                "reportDate": ["2024-05-31", "2024-01-31", "2023-01-31"],
                "primaryDocument": ["crwd-8k.htm", "crwd-20240131.htm", "crwd-20230131.htm"]
            }}
        })
    }

    fn filing_html() -> String {
        let risk = "Our business depends on customers renewing subscriptions. ".repeat(5);
        let cyber = "Our CISO reports to the audit committee every quarter. ".repeat(5);
        format!(
            "<html><body>\
             <p>Item 1A. Risk Factors</p><p>{risk}</p>\
             <p>Item 1B. Unresolved Staff Comments</p><p>None.</p>\
             <p>Item 1C. Cybersecurity</p><p>{cyber}</p>\
             <p>Item 2. Properties</p><p>We lease offices.</p>\
             </body></html>"
        )
    }

    async fn mock_edgar() -> (MockServer, EdgarSource) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/company_tickers.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tickers_json()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/submissions/CIK0001535527.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(submissions_json()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(
                "/Archives/edgar/data/1535527/000153552724000007/crwd-20240131.htm",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string(filing_html()))
            .mount(&server)
            .await;

        let source = EdgarSource::with_client(reqwest::Client::new())
            .with_base_urls(server.uri(), server.uri())
            .with_rate_limit(Duration::ZERO);
        (server, source)
    }

    #[tokio::test]
    async fn test_get_cik_pads_and_memoizes() {
        let (_server, source) = mock_edgar().await;
        let entry = source.get_cik(&Ticker::new("crwd")).await.unwrap();
        assert_eq!(entry.cik, "0001535527");
        assert_eq!(entry.title, "CrowdStrike Holdings, Inc.");

        // Second lookup is served from memory (the mock expects one call).
        let apple = source.get_cik(&Ticker::new("AAPL")).await.unwrap();
        assert_eq!(apple.cik, "0000320193");

        let err = source.get_cik(&Ticker::new("ZZZZ")).await.unwrap_err();
        assert!(matches!(err, DisclosureError::TickerNotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_filing_extracts_sections() {
        let (_server, source) = mock_edgar().await;
        let doc = source.fetch_filing(&Ticker::new("CRWD"), 2024).await.unwrap();

        assert_eq!(doc.company_name, "CrowdStrike Holdings, Inc.");
        assert_eq!(doc.year, 2024);
        assert_eq!(doc.report_date, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(doc.filing_date, NaiveDate::from_ymd_opt(2024, 3, 7));
        assert!(doc.sections.risk_factors.as_deref().unwrap().contains("renewing"));
        assert!(doc.sections.cybersecurity.as_deref().unwrap().contains("CISO"));
    }

    #[tokio::test]
    async fn test_submissions_fetched_once_per_company() {
        let (server, source) = mock_edgar().await;
        let ticker = Ticker::new("CRWD");
        for year in [2021, 2022, 2024] {
            let _ = source.fetch_filing(&ticker, year).await;
        }
        source.fetch_filings(&ticker, &[2024]).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let submissions = requests
            .iter()
            .filter(|r| r.url.path() == "/submissions/CIK0001535527.json")
            .count();
        assert_eq!(submissions, 1);
    }

    #[tokio::test]
    async fn test_missing_year_is_not_available() {
        let (_server, source) = mock_edgar().await;
        let err = source
            .fetch_filing(&Ticker::new("CRWD"), 2021)
            .await
            .unwrap_err();
        assert!(matches!(err, DisclosureError::FilingNotAvailable { year: 2021, .. }));

        let docs = source
            .fetch_filings(&Ticker::new("CRWD"), &[2021, 2024])
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].year, 2024);
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/company_tickers.json"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/company_tickers.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tickers_json()))
            .mount(&server)
            .await;

        let source = EdgarSource::with_client(reqwest::Client::new())
            .with_base_urls(server.uri(), server.uri())
            .with_rate_limit(Duration::ZERO);
        let entry = source.get_cik(&Ticker::new("AAPL")).await.unwrap();
        assert_eq!(entry.cik, "0000320193");
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_after_last_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .mount(&server)
            .await;

        let source = EdgarSource::with_client(reqwest::Client::new())
            .with_base_urls(server.uri(), server.uri())
            .with_rate_limit(Duration::ZERO)
            .with_max_attempts(2);
        let err = source.get_cik(&Ticker::new("AAPL")).await.unwrap_err();
        assert!(matches!(
            err,
            DisclosureError::RateLimited { retry_after: Some(d), .. } if d == Duration::ZERO
        ));
    }

    #[test]
    fn test_annual_report_selection_and_url() {
        let submissions: Submissions = serde_json::from_value(submissions_json()).unwrap();
        let filing = annual_report_for_year(&submissions, 2023).unwrap();
        assert_eq!(filing.primary_document, "crwd-20230131.htm");
        assert!(annual_report_for_year(&submissions, 2025).is_none());

        let source = EdgarSource::with_client(reqwest::Client::new())
            .with_base_urls("http://data", "http://www/");
        assert_eq!(
            source.document_url("0001535527", &filing),
            "http://www/Archives/edgar/data/1535527/000153552723000009/crwd-20230131.htm"
        );
    }

    #[test]
    fn test_source_info() {
        let source = EdgarSource::new("Test/1.0 (test@example.com)");
        assert_eq!(source.name(), "SEC EDGAR");
        assert!(!source.description().is_empty());
    }
}
