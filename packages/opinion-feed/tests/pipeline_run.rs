//! End-to-end runs against mock court sites.
//!
//! Covers:
//! 1. Dedup idempotence and key uniqueness across runs
//! 2. One unreachable court does not stop the other six
//! 3. Failed summaries still publish with the placeholder
//! 4. Feed ordering by filing date, court, case number
//! 5. Lookback and retention windows
//! 6. Corrupt state and feed write failures abort without damage

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use court_extraction::{florida_courts, CourtConfig, CourtId, MockIngestor, RawDocument, RawPage};
use opinion_feed::feed::{ATOM_FILE, HTML_FILE, RSS_FILE};
use opinion_feed::testing::{MockSummarizer, PlainTextExtractor};
use opinion_feed::{
    CourtFailure, FeedMeta, OpinionKey, Pipeline, PipelineError, RunClock, RunStatus, StateStore,
    SummarizerAdapter, SUMMARY_PLACEHOLDER,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 6, 0, 0).unwrap()
}

fn clock() -> RunClock {
    RunClock::at(now())
}

fn case_number(court: CourtId, n: u32) -> String {
    match court {
        CourtId::SupremeCourt => format!("SC2024-{n:04}"),
        other => format!("{}D2024-{n:04}", &other.to_string()[..1]),
    }
}

/// A table listing page; `rows` are (case number, caption, filing date).
fn table_page(url: &str, rows: &[(String, &str, NaiveDate)]) -> RawPage {
    let body: String = rows
        .iter()
        .map(|(case, caption, date)| {
            format!(
                r#"<tr><td><a href="/opinions/{case}.pdf">{case}</a></td><td>{caption}</td><td>{}</td></tr>"#,
                date.format("%m/%d/%Y")
            )
        })
        .collect();
    RawPage::new(
        url,
        format!(
            "<html><body><table><tr><th>Case Number</th><th>Case Name</th><th>Date Filed</th></tr>{body}</table></body></html>"
        ),
    )
}

fn primary_url(court: &CourtConfig) -> &str {
    &court.listing_urls[0].url
}

fn document_url(court: &CourtConfig, case: &str) -> String {
    format!("{}/opinions/{case}.pdf", court.base_url.trim_end_matches('/'))
}

/// One opinion per court, filed yesterday, with a fetchable document.
fn catalogue_mock(today: NaiveDate) -> MockIngestor {
    let mock = MockIngestor::new();
    for court in florida_courts() {
        let case = case_number(court.id, 100);
        let page = table_page(
            primary_url(&court),
            &[(case.clone(), "Doe v. Roe", today - Duration::days(1))],
        );
        mock.add_page(page);
        mock.add_document(RawDocument::new(
            document_url(&court, &case),
            format!("Opinion text for {case}."),
        ));
    }
    mock
}

fn pipeline(courts: Vec<CourtConfig>, mock: &MockIngestor, out: &Path) -> Pipeline {
    Pipeline::new(courts, Arc::new(mock.clone()), FeedMeta::default(), out)
}

fn adapter(mock: &MockIngestor, summarizer: &MockSummarizer) -> SummarizerAdapter {
    SummarizerAdapter::new(
        Arc::new(mock.clone()),
        Arc::new(PlainTextExtractor),
        Arc::new(summarizer.clone()),
    )
}

#[tokio::test]
async fn test_second_run_with_same_listings_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mock = catalogue_mock(clock().today);
    let summarizer = MockSummarizer::new().with_response("Affirmed.");
    let pipeline = pipeline(florida_courts(), &mock, &dir.path().join("docs"))
        .with_summarizer(adapter(&mock, &summarizer));

    let state_path = dir.path().join("state.json");
    let mut store = StateStore::load(&state_path).await.unwrap();
    let first = pipeline.run(&mut store, clock()).await.unwrap();
    assert_eq!(first.status(), RunStatus::Success);
    assert_eq!(first.new_records, 7);
    assert_eq!(first.summarized, 7);

    // A fresh process reloads the persisted store.
    let later = RunClock::at(now() + Duration::hours(24));
    let mut reloaded = StateStore::load(&state_path).await.unwrap();
    let second = pipeline.run(&mut reloaded, later).await.unwrap();
    assert_eq!(second.new_records, 0);
    assert_eq!(summarizer.call_count(), 7);

    let keys: Vec<OpinionKey> = reloaded.records().map(|r| r.key()).collect();
    let unique: HashSet<&OpinionKey> = keys.iter().collect();
    assert_eq!(keys.len(), 7);
    assert_eq!(unique.len(), keys.len());

    // First-seen timestamps survive the second run.
    assert!(reloaded.records().all(|r| r.first_seen_at == now()));
}

#[tokio::test]
async fn test_unreachable_court_does_not_block_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let mock = catalogue_mock(clock().today);
    let courts = florida_courts();
    let broken = courts
        .iter()
        .find(|c| c.id == CourtId::ThirdDca)
        .unwrap()
        .clone();
    for listing in &broken.listing_urls {
        mock.add_failure(listing.url.clone(), 503);
    }

    let summarizer = MockSummarizer::new().with_response("Reversed and remanded.");
    let pipeline = pipeline(courts, &mock, &dir.path().join("docs"))
        .with_summarizer(adapter(&mock, &summarizer));
    let mut store = StateStore::new(dir.path().join("state.json"));

    let report = pipeline.run(&mut store, clock()).await.unwrap();

    assert_eq!(report.status(), RunStatus::PartialSuccess);
    assert_eq!(report.status().exit_code(), 2);
    assert_eq!(report.failed_courts(), vec![CourtId::ThirdDca]);
    let failure = report
        .courts
        .iter()
        .find(|c| c.court == CourtId::ThirdDca)
        .unwrap();
    assert!(matches!(failure.result, Err(CourtFailure::Unreachable(_))));

    assert_eq!(report.new_records, 6);
    assert_eq!(report.summarized, 6);
    assert_eq!(report.feed_entries, 6);

    let rss = tokio::fs::read_to_string(dir.path().join("docs").join(RSS_FILE))
        .await
        .unwrap();
    assert_eq!(rss.matches("<item>").count(), 6);
    assert!(!rss.contains("3D2024-0100"));
    assert!(rss.contains("SC2024-0100"));
}

#[tokio::test]
async fn test_failed_summary_still_publishes_with_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let mock = catalogue_mock(clock().today);
    let courts: Vec<CourtConfig> = florida_courts()
        .into_iter()
        .filter(|c| matches!(c.id, CourtId::FourthDca | CourtId::FifthDca))
        .collect();
    let summarizer = MockSummarizer::new()
        .with_response("The court affirmed the judgment.")
        .failing_for("4D2024-0100");

    let pipeline = pipeline(courts, &mock, &dir.path().join("docs"))
        .with_summarizer(adapter(&mock, &summarizer));
    let mut store = StateStore::new(dir.path().join("state.json"));
    let report = pipeline.run(&mut store, clock()).await.unwrap();

    assert_eq!(report.status(), RunStatus::Success);
    assert_eq!(report.summary_failures.len(), 1);
    assert_eq!(report.feed_entries, 2);

    let key = OpinionKey::new(CourtId::FourthDca, "4D2024-0100");
    let record = store.get(&key).unwrap();
    assert!(record.summary.is_none());
    assert_eq!(record.summary_attempts, 1);

    let docs = dir.path().join("docs");
    for file in [RSS_FILE, ATOM_FILE, HTML_FILE] {
        let text = tokio::fs::read_to_string(docs.join(file)).await.unwrap();
        assert!(text.contains("4D2024-0100"), "{file} dropped the entry");
        assert!(text.contains(SUMMARY_PLACEHOLDER), "{file} lacks placeholder");
        assert!(text.contains("The court affirmed the judgment."));
    }
}

#[tokio::test]
async fn test_summaries_disabled_publishes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let mock = catalogue_mock(clock().today);
    let pipeline = pipeline(florida_courts(), &mock, &dir.path().join("docs"));
    let mut store = StateStore::new(dir.path().join("state.json"));

    let report = pipeline.run(&mut store, clock()).await.unwrap();

    assert!(!report.summaries_enabled);
    assert_eq!(report.feed_entries, 7);
    assert_eq!(mock.document_call_count(), 0);
    assert!(store.records().all(|r| r.summary.is_none() && r.summary_attempts == 0));
}

#[tokio::test]
async fn test_feed_orders_by_date_then_court() {
    let dir = tempfile::tempdir().unwrap();
    let courts: Vec<CourtConfig> = florida_courts()
        .into_iter()
        .filter(|c| matches!(c.id, CourtId::FirstDca | CourtId::SecondDca | CourtId::ThirdDca))
        .collect();
    let may = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();

    let mock = MockIngestor::new();
    for (court, day) in courts.iter().zip([1, 2, 1]) {
        let case = case_number(court.id, 7);
        mock.add_page(table_page(
            primary_url(court),
            &[(case, "Estate of Doe", may(day))],
        ));
    }

    let pipeline = pipeline(courts, &mock, &dir.path().join("docs")).with_windows(14, 30);
    let mut store = StateStore::new(dir.path().join("state.json"));
    let report = pipeline.run(&mut store, clock()).await.unwrap();
    assert_eq!(report.feed_entries, 3);

    let rss = tokio::fs::read_to_string(dir.path().join("docs").join(RSS_FILE))
        .await
        .unwrap();
    let a = rss.find("1D2024-0007").unwrap();
    let b = rss.find("2D2024-0007").unwrap();
    let c = rss.find("3D2024-0007").unwrap();
    assert!(b < a && a < c, "expected B, A, C");

    let html = tokio::fs::read_to_string(dir.path().join("docs").join(HTML_FILE))
        .await
        .unwrap();
    let a = html.find("1D2024-0007").unwrap();
    let b = html.find("2D2024-0007").unwrap();
    let c = html.find("3D2024-0007").unwrap();
    assert!(b < a && a < c, "expected B, A, C");
}

#[tokio::test]
async fn test_lookback_edge_and_retention() {
    let dir = tempfile::tempdir().unwrap();
    let court = florida_courts()
        .into_iter()
        .find(|c| c.id == CourtId::SixthDca)
        .unwrap();
    let today = clock().today;

    let mock = MockIngestor::new().with_page(table_page(
        primary_url(&court),
        &[
            ("6D2024-0007".into(), "Seven Days v. Ago", today - Duration::days(7)),
            ("6D2024-0008".into(), "Eight Days v. Ago", today - Duration::days(8)),
        ],
    ));

    let mut store = StateStore::new(dir.path().join("state.json"));
    // Recorded on an earlier run, long before this listing was fetched.
    let mut old = opinion_feed::OpinionRecord {
        court_id: CourtId::SixthDca,
        case_number: "6D2023-0999".into(),
        case_name: "Retained v. Record".into(),
        date_filed: today - Duration::days(20),
        document_url: "https://6dca.flcourts.gov/old.pdf".into(),
        summary: Some("Earlier summary.".into()),
        first_seen_at: now() - Duration::days(20),
        opinion_type: None,
        lower_tribunal: None,
        page_url: None,
        summary_attempts: 1,
    };
    store.insert(old.clone());
    old.case_number = "6D2023-0001".into();
    old.first_seen_at = now() - Duration::days(31);
    store.insert(old);

    let pipeline = pipeline(vec![court], &mock, &dir.path().join("docs")).with_windows(7, 30);
    let report = pipeline.run(&mut store, clock()).await.unwrap();

    assert_eq!(report.new_records, 1);
    assert!(store.contains(&OpinionKey::new(CourtId::SixthDca, "6D2024-0007")));
    assert!(!store.contains(&OpinionKey::new(CourtId::SixthDca, "6D2024-0008")));

    // In the feed: the new record and the 20-day-old one; the 31-day-old
    // record stays in the store but has left the feed.
    assert_eq!(report.feed_entries, 2);
    assert_eq!(store.len(), 3);
    let atom = tokio::fs::read_to_string(dir.path().join("docs").join(ATOM_FILE))
        .await
        .unwrap();
    assert!(atom.contains("6D2023-0999"));
    assert!(!atom.contains("6D2023-0001"));
}

#[tokio::test]
async fn test_corrupt_state_is_rejected_before_anything_changes() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    tokio::fs::write(&state_path, b"{\"version\": 1, \"records\": [").await.unwrap();

    let err = StateStore::load(&state_path).await.unwrap_err();
    assert!(err.is_corruption());

    let untouched = tokio::fs::read(&state_path).await.unwrap();
    assert_eq!(untouched, b"{\"version\": 1, \"records\": [");
    assert!(!dir.path().join("docs").exists());
}

#[tokio::test]
async fn test_feed_failure_aborts_and_keeps_previous_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    tokio::fs::create_dir_all(&docs).await.unwrap();
    tokio::fs::write(docs.join(RSS_FILE), b"previous feed").await.unwrap();
    tokio::fs::create_dir(docs.join(ATOM_FILE)).await.unwrap();

    let mock = catalogue_mock(clock().today);
    let pipeline = pipeline(florida_courts(), &mock, &docs);
    let mut store = StateStore::new(dir.path().join("state.json"));

    let err = pipeline.run(&mut store, clock()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Feed(_)));

    let rss = tokio::fs::read_to_string(docs.join(RSS_FILE)).await.unwrap();
    assert_eq!(rss, "previous feed");

    // State was persisted before the feed step, so the next run will not
    // treat these opinions as new.
    let reloaded = StateStore::load(dir.path().join("state.json")).await.unwrap();
    assert_eq!(reloaded.len(), 7);
}

#[tokio::test]
async fn test_invalid_feed_metadata_is_a_render_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mock = catalogue_mock(clock().today);
    let meta = FeedMeta {
        link: "not-a-url".into(),
        ..FeedMeta::default()
    };
    let pipeline = Pipeline::new(florida_courts(), Arc::new(mock), meta, dir.path().join("docs"));
    let mut store = StateStore::new(dir.path().join("state.json"));

    let err = pipeline.run(&mut store, clock()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Feed(_)));
    assert!(!dir.path().join("docs").exists());
}
