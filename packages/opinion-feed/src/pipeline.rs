//! The orchestrator: scrape every court, reconcile, summarize, publish.
//!
//! Courts are processed one at a time with a politeness delay between
//! listing fetches. A court that fails is recorded in the report and the
//! run carries on; only state persistence and feed output abort a run.

use anthropic_client::AnthropicClient;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use court_extraction::{
    CourtConfig, CourtId, CourtScraper, HttpIngestor, ListingSource, Pacer, StrategyChain,
    StrategyKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{Config, ListingFetcher};
use crate::error::{CourtFailure, Result, SummaryFailure};
use crate::feed::{render_feeds, write_artifacts, FeedMeta};
use crate::reconcile::reconcile;
use crate::record::OpinionKey;
use crate::state::StateStore;
use crate::summarize::{ClaudeSummarizer, PdfTextExtractor, SummarizerAdapter};

/// The instant a run treats as "now", fixed at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunClock {
    pub now: DateTime<Utc>,
    /// Reference date for the lookback window
    pub today: NaiveDate,
}

impl RunClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            today: now.date_naive(),
        }
    }

    pub fn now() -> Self {
        Self::at(Utc::now())
    }
}

/// Overall result of a run, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    /// At least one court contributed nothing
    PartialSuccess,
    Failed,
}

impl RunStatus {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunStatus::Success => 0,
            RunStatus::Failed => 1,
            RunStatus::PartialSuccess => 2,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStatus::Success => "success",
            RunStatus::PartialSuccess => "partial success",
            RunStatus::Failed => "failed",
        })
    }
}

/// What one court contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourtSummary {
    pub listing_label: String,
    pub strategy: StrategyKind,
    /// Plausible opinions on the winning listing page
    pub listed: usize,
    /// Of those, filed within the lookback window
    pub in_lookback: usize,
    pub new_records: usize,
    pub skipped_records: usize,
}

#[derive(Debug, Clone)]
pub struct CourtOutcome {
    pub court: CourtId,
    pub result: std::result::Result<CourtSummary, CourtFailure>,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub courts: Vec<CourtOutcome>,
    pub new_records: usize,
    pub summarized: usize,
    pub summary_failures: Vec<(OpinionKey, SummaryFailure)>,
    /// Whether the summary step ran at all
    pub summaries_enabled: bool,
    pub feed_entries: usize,
}

impl RunReport {
    pub fn status(&self) -> RunStatus {
        if self.courts.iter().any(|c| c.result.is_err()) {
            RunStatus::PartialSuccess
        } else {
            RunStatus::Success
        }
    }

    pub fn failed_courts(&self) -> Vec<CourtId> {
        self.courts
            .iter()
            .filter(|c| c.result.is_err())
            .map(|c| c.court)
            .collect()
    }
}

/// Sequences one scrape-reconcile-summarize-publish run.
pub struct Pipeline {
    courts: Vec<CourtConfig>,
    source: Arc<dyn ListingSource>,
    chain: StrategyChain,
    court_pacer: Pacer,
    summarizer: Option<SummarizerAdapter>,
    feed: FeedMeta,
    output_dir: PathBuf,
    lookback_days: u32,
    retention_days: u32,
    max_summary_attempts: u32,
}

impl Pipeline {
    /// A pipeline with default windows, no pacing and no summarizer.
    pub fn new(
        courts: Vec<CourtConfig>,
        source: Arc<dyn ListingSource>,
        feed: FeedMeta,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            courts,
            source,
            chain: StrategyChain::default(),
            court_pacer: Pacer::unpaced(),
            summarizer: None,
            feed,
            output_dir: output_dir.into(),
            lookback_days: 7,
            retention_days: 30,
            max_summary_attempts: 3,
        }
    }

    /// Wire the configured listing source, the HTTP document fetcher and,
    /// when enabled, the Claude summarizer.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = http_ingestor(config)?;
        let source = listing_source(config, http.clone())?;

        let summarizer = match (&config.anthropic_api_key, config.summarize) {
            (Some(key), true) => {
                let client =
                    AnthropicClient::with_secret(SecretString::new(key.expose_secret().into()));
                let claude = ClaudeSummarizer::new(client, config.summary_model.clone());
                Some(
                    SummarizerAdapter::new(
                        http.clone(),
                        Arc::new(PdfTextExtractor::new(config.pdf_max_pages)),
                        Arc::new(claude),
                    )
                    .with_pacing(
                        Pacer::new(config.document_delay),
                        Pacer::new(config.summary_delay),
                    )
                    .with_max_chars(config.max_summary_chars),
                )
            }
            (None, true) => {
                warn!("ANTHROPIC_API_KEY not set, summaries will be skipped");
                None
            }
            (_, false) => None,
        };

        let mut pipeline = Self::new(
            config.courts.clone(),
            source,
            config.feed.clone(),
            config.output_dir.clone(),
        )
        .with_court_pacer(Pacer::new(config.court_delay))
        .with_windows(config.lookback_days, config.retention_days)
        .with_max_summary_attempts(config.max_summary_attempts);
        pipeline.summarizer = summarizer;
        Ok(pipeline)
    }

    pub fn with_summarizer(mut self, summarizer: SummarizerAdapter) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_chain(mut self, chain: StrategyChain) -> Self {
        self.chain = chain;
        self
    }

    /// Minimum spacing between listing fetches.
    pub fn with_court_pacer(mut self, pacer: Pacer) -> Self {
        self.court_pacer = pacer;
        self
    }

    pub fn with_windows(mut self, lookback_days: u32, retention_days: u32) -> Self {
        self.lookback_days = lookback_days;
        self.retention_days = retention_days;
        self
    }

    pub fn with_max_summary_attempts(mut self, attempts: u32) -> Self {
        self.max_summary_attempts = attempts;
        self
    }

    pub fn courts(&self) -> &[CourtConfig] {
        &self.courts
    }

    /// Run once against `store`.
    ///
    /// The store is persisted after every court that added records, after
    /// summarization, and before the feeds are written.
    pub async fn run(&self, store: &mut StateStore, clock: RunClock) -> Result<RunReport> {
        let mut report = RunReport {
            summaries_enabled: self.summarizer.is_some(),
            ..RunReport::default()
        };
        let mut new_keys = Vec::new();

        info!(
            courts = self.courts.len(),
            lookback_days = self.lookback_days,
            known_records = store.len(),
            "Starting run"
        );

        let scraper = CourtScraper::new(self.source.as_ref(), &self.chain, &self.court_pacer);
        for court in &self.courts {
            let scrape = match scraper.scrape(court, clock.today).await {
                Ok(scrape) => scrape,
                Err(e) => {
                    error!(court = %court.id, error = %e, "Court produced no results");
                    report.courts.push(CourtOutcome {
                        court: court.id,
                        result: Err(CourtFailure::from(e)),
                    });
                    continue;
                }
            };

            let recent = scrape.within_lookback(clock.today, self.lookback_days);
            let in_lookback = recent.len();
            let reconciliation = reconcile(store, recent, clock.now);

            if !reconciliation.new_records.is_empty() {
                store.persist(clock.now).await?;
            }

            info!(
                court = %court.id,
                strategy = %scrape.strategy,
                listed = scrape.opinions.len(),
                in_lookback,
                new = reconciliation.new_records.len(),
                skipped = reconciliation.skipped_records.len(),
                "Court reconciled"
            );

            new_keys.extend(reconciliation.new_keys());
            report.courts.push(CourtOutcome {
                court: court.id,
                result: Ok(CourtSummary {
                    listing_label: scrape.listing_label,
                    strategy: scrape.strategy,
                    listed: scrape.opinions.len(),
                    in_lookback,
                    new_records: reconciliation.new_records.len(),
                    skipped_records: reconciliation.skipped_records.len(),
                }),
            });
        }
        self.source.shutdown().await;
        report.new_records = new_keys.len();

        match &self.summarizer {
            Some(adapter) => {
                self.summarize(adapter, store, &new_keys, clock, &mut report)
                    .await
            }
            None => info!("Summarization disabled, records keep empty summaries"),
        }

        store.persist(clock.now).await?;

        let window = store.feed_window(clock.now, self.retention_days);
        let artifacts = render_feeds(&window, &self.feed, clock.now)?;
        write_artifacts(&self.output_dir, &artifacts).await?;
        report.feed_entries = artifacts.entries;

        info!(
            status = %report.status(),
            new = report.new_records,
            summarized = report.summarized,
            summary_failures = report.summary_failures.len(),
            feed_entries = report.feed_entries,
            "Run complete"
        );
        Ok(report)
    }

    /// New records first, then older records still owed a summary.
    async fn summarize(
        &self,
        adapter: &SummarizerAdapter,
        store: &mut StateStore,
        new_keys: &[OpinionKey],
        clock: RunClock,
        report: &mut RunReport,
    ) {
        let fresh: HashSet<&OpinionKey> = new_keys.iter().collect();
        let pending =
            store.pending_summaries(clock.now, self.retention_days, self.max_summary_attempts);
        let queue: Vec<OpinionKey> = new_keys
            .iter()
            .cloned()
            .chain(pending.into_iter().filter(|k| !fresh.contains(k)))
            .collect();

        info!(
            new = new_keys.len(),
            retries = queue.len() - new_keys.len(),
            "Summarizing"
        );

        for key in queue {
            let Some(record) = store.get(&key).cloned() else {
                continue;
            };
            if !record.needs_summary(self.max_summary_attempts) {
                continue;
            }

            match adapter.summarize(&record).await {
                Ok(summary) => {
                    store.record_summary_attempt(&key, Some(summary));
                    report.summarized += 1;
                }
                Err(failure) => {
                    warn!(
                        court = %key.court_id,
                        case_number = %key.case_number,
                        stage = %failure.stage,
                        error = %failure.message,
                        "Summary unavailable, publishing without one"
                    );
                    store.record_summary_attempt(&key, None);
                    report.summary_failures.push((key, failure));
                }
            }
        }
    }
}

/// HTTP client used for documents, and for listings unless a browser is configured.
pub fn http_ingestor(config: &Config) -> anyhow::Result<Arc<HttpIngestor>> {
    let http = HttpIngestor::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.http_timeout)
        .max_document_bytes(config.max_document_bytes)
        .build()
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(http))
}

/// The listing source selected by `LISTING_FETCHER`.
pub fn listing_source(
    config: &Config,
    http: Arc<HttpIngestor>,
) -> anyhow::Result<Arc<dyn ListingSource>> {
    match config.listing_fetcher {
        ListingFetcher::Http => Ok(http),
        #[cfg(feature = "browser")]
        ListingFetcher::Browser => {
            let mut builder = court_extraction::BrowserIngestor::builder()
                .navigation_timeout(config.http_timeout);
            if let Some(path) = &config.browser_executable {
                builder = builder.executable(path.clone());
            }
            Ok(Arc::new(builder.build()))
        }
        #[cfg(not(feature = "browser"))]
        ListingFetcher::Browser => {
            anyhow::bail!("Listing fetcher `browser` needs a build with the `browser` feature")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use court_extraction::{MockIngestor, RawDocument, RawPage};

    use crate::testing::{MockSummarizer, PlainTextExtractor};

    fn clock() -> RunClock {
        RunClock::at(Utc.with_ymd_and_hms(2024, 5, 10, 6, 0, 0).unwrap())
    }

    fn court(id: CourtId, host: &str) -> CourtConfig {
        CourtConfig::new(id, format!("https://{host}"))
            .with_listing("recent", format!("https://{host}/recent"))
    }

    fn listing(host: &str, case: &str, date: &str) -> RawPage {
        RawPage::new(
            format!("https://{host}/recent"),
            format!(
                r#"<table>
                  <tr><th>Case Number</th><th>Case Name</th><th>Date</th></tr>
                  <tr><td><a href="/docs/{case}.pdf">{case}</a></td><td>Doe v. Roe</td><td>{date}</td></tr>
                </table>"#
            ),
        )
    }

    #[test]
    fn test_status_and_exit_codes() {
        let mut report = RunReport::default();
        assert_eq!(report.status(), RunStatus::Success);

        report.courts.push(CourtOutcome {
            court: CourtId::ThirdDca,
            result: Err(CourtFailure::Unreachable("503".into())),
        });
        assert_eq!(report.status(), RunStatus::PartialSuccess);
        assert_eq!(report.failed_courts(), vec![CourtId::ThirdDca]);

        assert_eq!(RunStatus::Success.exit_code(), 0);
        assert_eq!(RunStatus::Failed.exit_code(), 1);
        assert_eq!(RunStatus::PartialSuccess.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_run_summarizes_new_then_pending() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockIngestor::new()
            .with_page(listing("1dca.flcourts.gov", "1D2024-0001", "05/09/2024"))
            .with_document(RawDocument::new(
                "https://1dca.flcourts.gov/docs/1D2024-0001.pdf",
                "The trial court erred.",
            ));
        let summarizer = MockSummarizer::new().with_response("Reversed.");
        let adapter = SummarizerAdapter::new(
            Arc::new(mock.clone()),
            Arc::new(PlainTextExtractor),
            Arc::new(summarizer.clone()),
        );

        let pipeline = Pipeline::new(
            vec![court(CourtId::FirstDca, "1dca.flcourts.gov")],
            Arc::new(mock.clone()),
            FeedMeta::default(),
            dir.path().join("docs"),
        )
        .with_summarizer(adapter);

        let mut store = StateStore::new(dir.path().join("state.json"));
        let report = pipeline.run(&mut store, clock()).await.unwrap();

        assert_eq!(report.status(), RunStatus::Success);
        assert_eq!(report.new_records, 1);
        assert_eq!(report.summarized, 1);
        assert_eq!(report.feed_entries, 1);
        assert_eq!(mock.shutdown_count(), 1);

        let key = OpinionKey::new(CourtId::FirstDca, "1D2024-0001");
        assert_eq!(store.get(&key).unwrap().summary.as_deref(), Some("Reversed."));

        // Second run: nothing new, nothing pending, no further calls.
        let again = pipeline.run(&mut store, clock()).await.unwrap();
        assert_eq!(again.new_records, 0);
        assert_eq!(summarizer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_pending_summary_retried_until_attempts_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockIngestor::new()
            .with_page(listing("2dca.flcourts.gov", "2D2024-0001", "05/09/2024"))
            .with_failure("https://2dca.flcourts.gov/docs/2D2024-0001.pdf", 500);
        let summarizer = MockSummarizer::new().with_response("unused");
        let adapter = SummarizerAdapter::new(
            Arc::new(mock.clone()),
            Arc::new(PlainTextExtractor),
            Arc::new(summarizer.clone()),
        );

        let pipeline = Pipeline::new(
            vec![court(CourtId::SecondDca, "2dca.flcourts.gov")],
            Arc::new(mock.clone()),
            FeedMeta::default(),
            dir.path().join("docs"),
        )
        .with_summarizer(adapter)
        .with_max_summary_attempts(2);

        let mut store = StateStore::new(dir.path().join("state.json"));
        let key = OpinionKey::new(CourtId::SecondDca, "2D2024-0001");

        let first = pipeline.run(&mut store, clock()).await.unwrap();
        assert_eq!(first.summary_failures.len(), 1);
        assert_eq!(store.get(&key).unwrap().summary_attempts, 1);

        let second = pipeline.run(&mut store, clock()).await.unwrap();
        assert_eq!(second.new_records, 0);
        assert_eq!(second.summary_failures.len(), 1);
        assert_eq!(store.get(&key).unwrap().summary_attempts, 2);

        let third = pipeline.run(&mut store, clock()).await.unwrap();
        assert!(third.summary_failures.is_empty());
        assert_eq!(mock.document_call_count(), 2);
        assert!(store.get(&key).unwrap().summary.is_none());
    }

    #[tokio::test]
    async fn test_unbounded_windows_do_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockIngestor::new()
            .with_page(listing("4dca.flcourts.gov", "4D2024-0001", "01/02/1990"));

        let pipeline = Pipeline::new(
            vec![court(CourtId::FourthDca, "4dca.flcourts.gov")],
            Arc::new(mock),
            FeedMeta::default(),
            dir.path().join("docs"),
        )
        .with_windows(u32::MAX, u32::MAX);

        let mut store = StateStore::new(dir.path().join("state.json"));
        let report = pipeline.run(&mut store, clock()).await.unwrap();

        assert_eq!(report.new_records, 1);
        assert_eq!(report.feed_entries, 1);
    }

    #[test]
    fn test_http_listing_source_from_config() {
        let config = Config::from_lookup(|_| None).unwrap();
        let http = http_ingestor(&config).unwrap();
        let source = listing_source(&config, http).unwrap();
        assert_eq!(source.name(), "http");
    }
}
