//! Test doubles for the summarization boundary.
//!
//! Listing and document sources are mocked by
//! [`court_extraction::MockIngestor`].

use async_trait::async_trait;
use court_extraction::RawDocument;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::error::SummaryFailure;
use crate::summarize::{SummaryRequest, Summarizer, TextExtractor};

/// Summarizer that answers with canned text and records every request.
///
/// # Example
///
/// ```rust
/// use opinion_feed::testing::MockSummarizer;
///
/// let summarizer = MockSummarizer::new()
///     .with_response("The court affirmed.")
///     .failing_for("4D2024-0001");
/// ```
#[derive(Default)]
pub struct MockSummarizer {
    /// `None` makes every call fail
    response: Option<String>,
    /// Case numbers whose calls fail regardless of `response`
    failing_cases: Arc<RwLock<HashSet<String>>>,
    /// Track calls for verification
    requests: Arc<RwLock<Vec<SummaryRequest>>>,
}

impl MockSummarizer {
    /// A summarizer that fails until given a response.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Fail every call.
    pub fn failing(mut self) -> Self {
        self.response = None;
        self
    }

    /// Fail calls for one case number.
    pub fn failing_for(self, case_number: impl Into<String>) -> Self {
        self.failing_cases
            .write()
            .unwrap()
            .insert(case_number.into());
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<SummaryRequest> {
        self.requests.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.read().unwrap().len()
    }
}

impl Clone for MockSummarizer {
    fn clone(&self) -> Self {
        Self {
            response: self.response.clone(),
            failing_cases: Arc::clone(&self.failing_cases),
            requests: Arc::clone(&self.requests),
        }
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummaryFailure> {
        self.requests.write().unwrap().push(request.clone());

        if self
            .failing_cases
            .read()
            .unwrap()
            .contains(&request.case_number)
        {
            return Err(SummaryFailure::summarize(format!(
                "mock failure for {}",
                request.case_number
            )));
        }

        self.response
            .clone()
            .ok_or_else(|| SummaryFailure::summarize("mock summarizer has no response"))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Treats document bytes as UTF-8 text; stands in for PDF parsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, document: &RawDocument) -> Result<String, SummaryFailure> {
        let text = String::from_utf8_lossy(&document.bytes).trim().to_string();
        if text.is_empty() {
            return Err(SummaryFailure::extract("document is empty"));
        }
        Ok(text)
    }
}
