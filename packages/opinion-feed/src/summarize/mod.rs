//! Summarizer adapter: document fetch, text extraction, summary call.
//!
//! Every step is a boundary that can fail. A failure is reported as a
//! [`SummaryFailure`] naming the stage; the caller keeps the record and
//! leaves its summary empty.

pub mod claude;
pub mod pdf;
pub mod prompts;

pub use claude::{ClaudeSummarizer, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
pub use pdf::{PdfTextExtractor, DEFAULT_MAX_PAGES};

use async_trait::async_trait;
use chrono::NaiveDate;
use court_extraction::{DocumentFetcher, Pacer, RawDocument};
use std::sync::Arc;
use tracing::debug;

use crate::error::SummaryFailure;
use crate::record::OpinionRecord;

/// Default excerpt length sent for summarization.
pub const DEFAULT_MAX_SUMMARY_CHARS: usize = 12_000;

/// What the summarizer is told about one opinion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub court_name: String,
    pub case_number: String,
    pub case_name: String,
    pub date_filed: NaiveDate,
    /// Bounded excerpt of the opinion text
    pub excerpt: String,
}

/// Text in, short summary out.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummaryFailure>;

    /// Name for logging
    fn name(&self) -> &str;
}

/// Document bytes in, plain text out.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, document: &RawDocument) -> Result<String, SummaryFailure>;
}

/// Runs the fetch, extract and summarize steps for one record at a time.
#[derive(Clone)]
pub struct SummarizerAdapter {
    documents: Arc<dyn DocumentFetcher>,
    extractor: Arc<dyn TextExtractor>,
    summarizer: Arc<dyn Summarizer>,
    document_pacer: Pacer,
    summary_pacer: Pacer,
    max_chars: usize,
}

impl SummarizerAdapter {
    pub fn new(
        documents: Arc<dyn DocumentFetcher>,
        extractor: Arc<dyn TextExtractor>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            documents,
            extractor,
            summarizer,
            document_pacer: Pacer::unpaced(),
            summary_pacer: Pacer::unpaced(),
            max_chars: DEFAULT_MAX_SUMMARY_CHARS,
        }
    }

    /// Minimum spacing before each document fetch and each summary call.
    pub fn with_pacing(mut self, document_pacer: Pacer, summary_pacer: Pacer) -> Self {
        self.document_pacer = document_pacer;
        self.summary_pacer = summary_pacer;
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Produce a summary for `record`, or say which stage failed.
    pub async fn summarize(&self, record: &OpinionRecord) -> Result<String, SummaryFailure> {
        self.document_pacer.wait().await;
        let document = self
            .documents
            .fetch_document(&record.document_url)
            .await
            .map_err(SummaryFailure::fetch)?;

        // lopdf parsing is CPU-bound.
        let extractor = Arc::clone(&self.extractor);
        let text = tokio::task::spawn_blocking(move || extractor.extract_text(&document))
            .await
            .map_err(SummaryFailure::extract)??;

        let request = SummaryRequest {
            court_name: record.court_name().to_string(),
            case_number: record.case_number.clone(),
            case_name: record.case_name.clone(),
            date_filed: record.date_filed,
            excerpt: prompts::excerpt(&text, self.max_chars),
        };

        self.summary_pacer.wait().await;
        let summary = self.summarizer.summarize(&request).await?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(SummaryFailure::summarize("empty summary returned"));
        }

        debug!(
            court = %record.court_id,
            case_number = %record.case_number,
            summarizer = self.summarizer.name(),
            chars = summary.len(),
            "Summary generated"
        );
        Ok(summary.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SummaryStage;
    use crate::testing::{MockSummarizer, PlainTextExtractor};
    use chrono::Utc;
    use court_extraction::{CourtId, MockIngestor};

    fn record(url: &str) -> OpinionRecord {
        OpinionRecord {
            court_id: CourtId::FourthDca,
            case_number: "4D2024-0077".into(),
            case_name: "Nguyen v. Palm Beach County".into(),
            date_filed: NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
            document_url: url.into(),
            summary: None,
            first_seen_at: Utc::now(),
            opinion_type: None,
            lower_tribunal: None,
            page_url: None,
            summary_attempts: 0,
        }
    }

    fn adapter(mock: &MockIngestor, summarizer: &MockSummarizer) -> SummarizerAdapter {
        SummarizerAdapter::new(
            Arc::new(mock.clone()),
            Arc::new(PlainTextExtractor),
            Arc::new(summarizer.clone()),
        )
    }

    #[tokio::test]
    async fn test_happy_path_truncates_excerpt() {
        let url = "https://4dca.flcourts.gov/op.pdf";
        let mock = MockIngestor::new().with_document(RawDocument::new(url, "x".repeat(50)));
        let summarizer = MockSummarizer::new().with_response("  The court reversed.  ");

        let summary = adapter(&mock, &summarizer)
            .with_max_chars(10)
            .summarize(&record(url))
            .await
            .unwrap();

        assert_eq!(summary, "The court reversed.");
        let requests = summarizer.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].excerpt.starts_with(&"x".repeat(10)));
        assert!(requests[0].excerpt.ends_with(prompts::TRUNCATION_MARKER));
        assert_eq!(requests[0].court_name, "Fourth District Court of Appeal");
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_summary_call() {
        let url = "https://4dca.flcourts.gov/missing.pdf";
        let mock = MockIngestor::new().with_failure(url, 404);
        let summarizer = MockSummarizer::new().with_response("unused");

        let err = adapter(&mock, &summarizer)
            .summarize(&record(url))
            .await
            .unwrap_err();

        assert_eq!(err.stage, SummaryStage::Fetch);
        assert!(summarizer.requests().is_empty());
    }

    #[tokio::test]
    async fn test_summarizer_failure_and_empty_summary() {
        let url = "https://4dca.flcourts.gov/op.pdf";
        let mock = MockIngestor::new().with_document(RawDocument::new(url, "opinion text"));

        let failing = MockSummarizer::new().failing();
        let err = adapter(&mock, &failing).summarize(&record(url)).await.unwrap_err();
        assert_eq!(err.stage, SummaryStage::Summarize);

        let blank = MockSummarizer::new().with_response("   ");
        let err = adapter(&mock, &blank).summarize(&record(url)).await.unwrap_err();
        assert_eq!(err.stage, SummaryStage::Summarize);
    }
}
