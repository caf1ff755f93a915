//! Specificity scoring through a completion backend.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use disclosure_core::{
    CompletionClient, DisclosureCache, DisclosureError, FilingRecord, Result,
    SpecificityAssessment, Ticker,
};
use disclosure_text::{assessment, build_prompt, failed_assessment, parse_response};

/// Default number of completion attempts per filing.
pub const DEFAULT_MAX_ATTEMPTS: usize = 4;

/// Scores filings with a [`CompletionClient`], retrying failed calls.
///
/// Rate-limit errors wait for the service's hint (60 s without one); other
/// failures, including unparseable answers, wait 5 s. When every attempt fails
/// the filing gets an assessment with no judgments and a score of 0.
#[derive(Debug)]
pub struct SpecificityScorer<C> {
    client: C,
    max_attempts: usize,
    rate_limit_backoff: Duration,
    error_backoff: Duration,
}

impl<C: CompletionClient> SpecificityScorer<C> {
    /// Create a scorer with default retry settings.
    pub const fn new(client: C) -> Self {
        Self {
            client,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            rate_limit_backoff: Duration::from_secs(60),
            error_backoff: Duration::from_secs(5),
        }
    }

    /// Set the number of attempts per filing (at least one).
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the waits used when the service gives no retry hint and after other errors.
    #[must_use]
    pub const fn with_backoff(mut self, rate_limit: Duration, error: Duration) -> Self {
        self.rate_limit_backoff = rate_limit;
        self.error_backoff = error;
        self
    }

    /// The completion client.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Scores one filing text.
    ///
    /// Returns `Ok(None)` when the text is too short to score. Configuration
    /// errors from the client are returned as is; every other failure is retried
    /// and finally recorded as a failed assessment.
    #[instrument(skip(self, text), fields(client = self.client.name(), ticker = %ticker))]
    pub async fn assess(
        &self,
        ticker: &Ticker,
        year: i32,
        text: &str,
    ) -> Result<Option<SpecificityAssessment>> {
        let Some(prompt) = build_prompt(text) else {
            debug!("Text too short to score");
            return Ok(None);
        };

        for attempt in 1..=self.max_attempts {
            let wait = match self.client.complete(&prompt).await {
                Ok(raw) => match parse_response(&raw) {
                    Ok(judgments) => {
                        return Ok(Some(assessment(ticker.clone(), year, judgments)));
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "Unusable completion");
                        self.error_backoff
                    }
                },
                Err(
                    e @ (DisclosureError::InvalidParameter(_)
                    | DisclosureError::SourceNotConfigured(_)
                    | DisclosureError::NotSupported(_)),
                ) => return Err(e),
                Err(DisclosureError::RateLimited { retry_after, .. }) => {
                    let wait = retry_after.unwrap_or(self.rate_limit_backoff);
                    warn!(attempt, wait_secs = wait.as_secs_f64(), "Rate limited");
                    wait
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Completion failed");
                    self.error_backoff
                }
            };

            if attempt < self.max_attempts && !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }

        warn!(attempts = self.max_attempts, "Giving up, recording failed assessment");
        Ok(Some(failed_assessment(ticker.clone(), year)))
    }

    /// Scores every record not yet in `cache`, persisting each result as soon as it exists.
    ///
    /// Safe to rerun after an interruption: keys returned by
    /// [`DisclosureCache::scored_keys`] are skipped. Texts too short to score
    /// are stored as failed assessments so they are not retried either.
    /// Returns the assessments created by this call.
    pub async fn score_all(
        &self,
        records: &[FilingRecord],
        cache: &dyn DisclosureCache,
        pause: Duration,
    ) -> Result<Vec<SpecificityAssessment>> {
        let mut done: HashSet<(Ticker, i32)> = cache.scored_keys().await?;
        let pending = records
            .iter()
            .filter(|r| !done.contains(&(r.ticker.clone(), r.year)))
            .count();
        info!(
            already_scored = done.len(),
            pending,
            "Starting specificity scoring"
        );

        let mut scored = Vec::new();
        for record in records {
            let key = (record.ticker.clone(), record.year);
            if done.contains(&key) {
                continue;
            }

            let text = record.combined_text.as_deref().unwrap_or_default();
            let result = match self.assess(&record.ticker, record.year, text).await? {
                Some(result) => {
                    if !pause.is_zero() {
                        tokio::time::sleep(pause).await;
                    }
                    result
                }
                None => failed_assessment(record.ticker.clone(), record.year),
            };

            cache.put_assessment(&result).await?;
            debug!(
                ticker = %record.ticker,
                year = record.year,
                score = result.specificity_score,
                failed = result.is_failed(),
                "Scored filing"
            );
            done.insert(key);
            scored.push(result);
        }

        info!(scored = scored.len(), "Specificity scoring finished");
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use disclosure_cache::InMemoryCache;
    use disclosure_core::SpecificityCategory;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const GOOD: &str = r#"{"frameworks": {"score": 1, "rationale": "ISO/IEC 27001"},
        "specific_controls": {"score": 1, "rationale": "EDR"},
        "named_individuals": {"score": 1, "rationale": "our CISO, Jane Doe"},
        "quantitative_data": {"score": 0, "rationale": ""},
        "product_names": {"score": 0, "rationale": ""},
        "technical_details": {"score": 0, "rationale": ""},
        "llm_boilerplate": {"score": 3, "rationale": "threat actors"}}"#;

    /// Replays queued responses; answers with `GOOD` once the queue is empty.
    #[derive(Debug)]
    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(GOOD.to_string()))
        }
    }

    fn scorer(responses: Vec<Result<String>>) -> SpecificityScorer<ScriptedClient> {
        SpecificityScorer::new(ScriptedClient::new(responses))
            .with_backoff(Duration::ZERO, Duration::ZERO)
    }

    fn long_text() -> String {
        "We maintain an incident response plan aligned with ISO/IEC 27001. ".repeat(5)
    }

    fn record(ticker: &str, year: i32, text: Option<String>) -> FilingRecord {
        FilingRecord {
            ticker: Ticker::new(ticker),
            company_name: ticker.into(),
            sector: "Cybersecurity".into(),
            year,
            has_1c: true,
            combined_text: text,
        }
    }

    #[tokio::test]
    async fn test_assess_success() {
        let scorer = scorer(vec![]);
        let result = scorer
            .assess(&Ticker::new("CRWD"), 2024, &long_text())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.specificity_score, 0.5);
        assert_eq!(result.score(SpecificityCategory::LlmBoilerplate), Some(3));
        assert_eq!(scorer.client().calls(), 1);
    }

    #[tokio::test]
    async fn test_assess_short_text() {
        let scorer = scorer(vec![]);
        let result = scorer.assess(&Ticker::new("S"), 2024, "too short").await.unwrap();
        assert!(result.is_none());
        assert_eq!(scorer.client().calls(), 0);
    }

    #[tokio::test]
    async fn test_assess_retries_rate_limit_and_garbage() {
        let scorer = scorer(vec![
            Err(DisclosureError::RateLimited {
                provider: "scripted".into(),
                retry_after: Some(Duration::ZERO),
            }),
            Ok("not json".into()),
            Err(DisclosureError::Network("timeout".into())),
        ]);
        let result = scorer
            .assess(&Ticker::new("VRNS"), 2023, &long_text())
            .await
            .unwrap()
            .unwrap();
        assert!(!result.is_failed());
        assert_eq!(scorer.client().calls(), 4);
    }

    #[tokio::test]
    async fn test_assess_gives_up() {
        let scorer = scorer(vec![
            Ok("nope".into()),
            Ok("nope".into()),
            Ok("nope".into()),
        ])
        .with_max_attempts(3);
        let result = scorer
            .assess(&Ticker::new("PRGS"), 2024, &long_text())
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_failed());
        assert_eq!(result.specificity_score, 0.0);
        assert_eq!(scorer.client().calls(), 3);
    }

    #[tokio::test]
    async fn test_assess_configuration_error_is_returned() {
        let scorer = scorer(vec![Err(DisclosureError::SourceNotConfigured(
            "missing API key".into(),
        ))]);
        let err = scorer
            .assess(&Ticker::new("PANW"), 2024, &long_text())
            .await
            .unwrap_err();
        assert!(matches!(err, DisclosureError::SourceNotConfigured(_)));
        assert_eq!(scorer.client().calls(), 1);
    }

    #[tokio::test]
    async fn test_score_all_resumes() {
        let cache = InMemoryCache::new();
        let records = vec![
            record("RPD", 2023, Some(long_text())),
            record("RPD", 2024, Some(long_text())),
            record("RPD", 2025, None),
        ];

        let first = scorer(vec![]);
        let scored = first
            .score_all(&records[..1], &cache, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(scored.len(), 1);

        let second = scorer(vec![]);
        let scored = second
            .score_all(&records, &cache, Duration::ZERO)
            .await
            .unwrap();
        let years: Vec<i32> = scored.iter().map(|a| a.year).collect();
        assert_eq!(years, vec![2024, 2025]);
        assert!(scored[1].is_failed());
        // Only 2024 reached the client.
        assert_eq!(second.client().calls(), 1);

        let keys = cache.scored_keys().await.unwrap();
        assert_eq!(keys.len(), 3);

        let third = scorer(vec![]);
        assert!(
            third
                .score_all(&records, &cache, Duration::ZERO)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(third.client().calls(), 0);
    }
}
