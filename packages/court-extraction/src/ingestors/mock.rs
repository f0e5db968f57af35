//! Mock ingestor for testing.
//!
//! Serves canned listing pages and documents by URL and records every
//! request so tests can assert on fetch order and pacing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{FetchError, FetchResult};
use crate::traits::ingestor::{DocumentFetcher, ListingSource, RawDocument, RawPage};

/// Mock ingestor for testing.
///
/// Unknown URLs answer with a 404 so a court with no configured page
/// behaves like an unreachable site.
///
/// # Example
///
/// ```rust
/// use court_extraction::{MockIngestor, RawPage};
///
/// let mock = MockIngestor::new()
///     .with_page(RawPage::new("https://1dca.flcourts.gov/Opinions", "<html></html>"))
///     .with_failure("https://2dca.flcourts.gov/Opinions", 503);
/// ```
#[derive(Default)]
pub struct MockIngestor {
    /// Canned listing pages indexed by URL
    pages: Arc<RwLock<HashMap<String, RawPage>>>,
    /// Canned documents indexed by URL
    documents: Arc<RwLock<HashMap<String, RawDocument>>>,
    /// URLs that answer with the given HTTP status
    failures: Arc<RwLock<HashMap<String, u16>>>,
    /// Track calls for verification
    listing_calls: Arc<RwLock<Vec<String>>>,
    document_calls: Arc<RwLock<Vec<String>>>,
    shutdowns: Arc<RwLock<usize>>,
}

impl MockIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listing page keyed by its URL.
    pub fn add_page(&self, page: RawPage) {
        let mut pages = self.pages.write().unwrap();
        pages.insert(page.url.clone(), page);
    }

    /// Add a document keyed by its URL.
    pub fn add_document(&self, document: RawDocument) {
        let mut documents = self.documents.write().unwrap();
        documents.insert(document.url.clone(), document);
    }

    /// Make a URL fail with an HTTP status.
    pub fn add_failure(&self, url: impl Into<String>, status: u16) {
        self.failures.write().unwrap().insert(url.into(), status);
    }

    pub fn with_page(self, page: RawPage) -> Self {
        self.add_page(page);
        self
    }

    pub fn with_document(self, document: RawDocument) -> Self {
        self.add_document(document);
        self
    }

    pub fn with_failure(self, url: impl Into<String>, status: u16) -> Self {
        self.add_failure(url, status);
        self
    }

    /// URLs requested through [`ListingSource::fetch_listing`], in order.
    pub fn listing_calls(&self) -> Vec<String> {
        self.listing_calls.read().unwrap().clone()
    }

    /// URLs requested through [`DocumentFetcher::fetch_document`], in order.
    pub fn document_calls(&self) -> Vec<String> {
        self.document_calls.read().unwrap().clone()
    }

    pub fn document_call_count(&self) -> usize {
        self.document_calls.read().unwrap().len()
    }

    /// How many times [`ListingSource::shutdown`] was called.
    pub fn shutdown_count(&self) -> usize {
        *self.shutdowns.read().unwrap()
    }

    /// Clear all recorded calls.
    pub fn reset_calls(&self) {
        self.listing_calls.write().unwrap().clear();
        self.document_calls.write().unwrap().clear();
    }

    fn check_failure(&self, url: &str) -> FetchResult<()> {
        match self.failures.read().unwrap().get(url) {
            Some(status) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Ok(()),
        }
    }
}

impl Clone for MockIngestor {
    fn clone(&self) -> Self {
        Self {
            pages: Arc::clone(&self.pages),
            documents: Arc::clone(&self.documents),
            failures: Arc::clone(&self.failures),
            listing_calls: Arc::clone(&self.listing_calls),
            document_calls: Arc::clone(&self.document_calls),
            shutdowns: Arc::clone(&self.shutdowns),
        }
    }
}

#[async_trait]
impl ListingSource for MockIngestor {
    async fn fetch_listing(&self, url: &str) -> FetchResult<RawPage> {
        self.listing_calls.write().unwrap().push(url.to_string());
        self.check_failure(url)?;

        self.pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }

    fn name(&self) -> &str {
        "mock"
    }

    async fn shutdown(&self) {
        *self.shutdowns.write().unwrap() += 1;
    }
}

#[async_trait]
impl DocumentFetcher for MockIngestor {
    async fn fetch_document(&self, url: &str) -> FetchResult<RawDocument> {
        self.document_calls.write().unwrap().push(url.to_string());
        self.check_failure(url)?;

        self.documents
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}
