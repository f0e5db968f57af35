//! Ingestor traits for fetching listing pages and opinion documents.
//!
//! The pipeline only talks to these traits, so HTTP, fixtures and mocks
//! are interchangeable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchResult;

/// A fetched listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPage {
    /// URL that was requested
    pub url: String,

    /// URL after redirects
    pub final_url: String,

    /// Raw HTML
    pub html: String,

    /// When the content was fetched
    pub fetched_at: DateTime<Utc>,
}

impl RawPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            html: html.into(),
            fetched_at: Utc::now(),
        }
    }

    pub fn with_final_url(mut self, final_url: impl Into<String>) -> Self {
        self.final_url = final_url.into();
        self
    }

    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }
}

/// A fetched opinion document (usually a PDF).
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub url: String,

    /// MIME type from the response headers, if any
    pub content_type: Option<String>,

    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Whether the header or the magic bytes say PDF.
    pub fn looks_like_pdf(&self) -> bool {
        let header_says_pdf = self
            .content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("application/pdf"))
            .unwrap_or(false);
        header_says_pdf || self.bytes.starts_with(b"%PDF")
    }
}

/// Source of court listing pages.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch one listing page.
    async fn fetch_listing(&self, url: &str) -> FetchResult<RawPage>;

    /// Name of this source (for logging)
    fn name(&self) -> &str;

    /// Release anything held between fetches. The source stays usable.
    async fn shutdown(&self) {}
}

/// Source of opinion documents.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch one document's bytes.
    async fn fetch_document(&self, url: &str) -> FetchResult<RawDocument>;
}
