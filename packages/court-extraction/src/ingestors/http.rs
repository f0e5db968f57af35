//! HTTP-based ingestor implementation.
//!
//! Fetches listing pages as text and opinion documents as bytes. Pacing is
//! left to the caller (see [`crate::pacing::Pacer`]).

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::traits::ingestor::{DocumentFetcher, ListingSource, RawDocument, RawPage};

/// Browser-like user agent; several court sites reject obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Largest opinion document accepted (50 MiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 50 * 1024 * 1024;

/// HTTP ingestor for court sites.
///
/// # Example
///
/// ```rust,ignore
/// use court_extraction::{HttpIngestor, ListingSource};
///
/// let ingestor = HttpIngestor::builder().timeout_secs(30).build()?;
/// let page = ingestor.fetch_listing("https://1dca.flcourts.gov/Opinions").await?;
/// ```
pub struct HttpIngestor {
    client: reqwest::Client,
    max_document_bytes: usize,
}

impl HttpIngestor {
    /// Create an ingestor with default settings.
    pub fn new() -> FetchResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> HttpIngestorBuilder {
        HttpIngestorBuilder::default()
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }

    pub fn with_max_document_bytes(mut self, max_document_bytes: usize) -> Self {
        self.max_document_bytes = max_document_bytes;
        self
    }

    fn too_large(&self, url: &str) -> FetchError {
        warn!(url = %url, limit = self.max_document_bytes, "Document exceeds size cap");
        FetchError::TooLarge {
            url: url.to_string(),
            limit: self.max_document_bytes,
        }
    }

    async fn get(&self, url: &str) -> FetchResult<reqwest::Response> {
        reqwest::Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        debug!(url = %url, "HTTP fetch starting");
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "HTTP request failed");
            FetchError::from_reqwest(url, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ListingSource for HttpIngestor {
    async fn fetch_listing(&self, url: &str) -> FetchResult<RawPage> {
        let response = self.get(url).await?;
        let final_url = response.url().to_string();

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        debug!(url = %url, final_url = %final_url, size = html.len(), "Listing page fetched");

        Ok(RawPage::new(url, html)
            .with_final_url(final_url)
            .with_fetched_at(Utc::now()))
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[async_trait]
impl DocumentFetcher for HttpIngestor {
    async fn fetch_document(&self, url: &str) -> FetchResult<RawDocument> {
        let mut response = self.get(url).await?;

        // Declared length first, then the running total for chunked bodies.
        let declared = response.content_length();
        if declared.is_some_and(|len| len > self.max_document_bytes as u64) {
            return Err(self.too_large(url));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut bytes = Vec::with_capacity(declared.unwrap_or(0) as usize);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?
        {
            if bytes.len() + chunk.len() > self.max_document_bytes {
                return Err(self.too_large(url));
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!(url = %url, size = bytes.len(), content_type = ?content_type, "Document fetched");

        let mut document = RawDocument::new(url, bytes);
        if let Some(ct) = content_type {
            document = document.with_content_type(ct);
        }
        Ok(document)
    }
}

/// Builder for [`HttpIngestor`].
#[derive(Debug, Clone)]
pub struct HttpIngestorBuilder {
    user_agent: String,
    timeout: Duration,
    max_redirects: usize,
    max_document_bytes: usize,
}

impl Default for HttpIngestorBuilder {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_redirects: 5,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl HttpIngestorBuilder {
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout(Duration::from_secs(secs))
    }

    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Reject documents larger than this many bytes.
    pub fn max_document_bytes(mut self, max_document_bytes: usize) -> Self {
        self.max_document_bytes = max_document_bytes;
        self
    }

    pub fn build(self) -> FetchResult<HttpIngestor> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,application/pdf,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(self.max_redirects))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(HttpIngestor::with_client(client).with_max_document_bytes(self.max_document_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = HttpIngestorBuilder::default();
        assert_eq!(builder.timeout, Duration::from_secs(30));
        assert_eq!(builder.max_redirects, 5);
        assert_eq!(builder.max_document_bytes, DEFAULT_MAX_DOCUMENT_BYTES);
        assert!(builder.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_builder_overrides() {
        let builder = HttpIngestor::builder()
            .user_agent("CourtOpinionFeed/1.0")
            .timeout_secs(10)
            .max_redirects(2);
        assert_eq!(builder.user_agent, "CourtOpinionFeed/1.0");
        assert_eq!(builder.timeout, Duration::from_secs(10));
        assert_eq!(builder.max_redirects, 2);
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_before_request() {
        let ingestor = HttpIngestor::new().unwrap();
        let err = ingestor.fetch_listing("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    /// Serve one canned HTTP response on a loopback port.
    async fn serve_once(response: String) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/opinions/5D2024-0100.pdf")
    }

    fn capped_ingestor(max_bytes: usize) -> HttpIngestor {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpIngestor::with_client(client).with_max_document_bytes(max_bytes)
    }

    #[tokio::test]
    async fn test_document_over_declared_length_rejected() {
        let body = "%PDF-".to_string() + &"x".repeat(95);
        let url = serve_once(format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ))
        .await;

        let err = capped_ingestor(16).fetch_document(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { limit: 16, .. }));
    }

    #[tokio::test]
    async fn test_chunked_document_over_cap_rejected_while_streaming() {
        let chunk = "y".repeat(10);
        let url = serve_once(format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\na\r\n{chunk}\r\na\r\n{chunk}\r\n0\r\n\r\n"
        ))
        .await;

        let err = capped_ingestor(16).fetch_document(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_document_within_cap_fetched() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: 8\r\nConnection: close\r\n\r\n%PDF-1.7"
                .to_string(),
        )
        .await;

        let document = capped_ingestor(16).fetch_document(&url).await.unwrap();
        assert_eq!(document.bytes, b"%PDF-1.7");
        assert!(document.looks_like_pdf());
    }
}
