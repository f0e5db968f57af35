//! Headless Chromium ingestor.
//!
//! Several flcourts.gov listings arrive as an empty shell and fill in their
//! results from script. This ingestor loads the page in Chromium, waits for
//! [`LISTING_CONTENT_SELECTOR`] to match (or gives up after a timeout and
//! takes whatever rendered), lets lazy content settle, then hands the
//! rendered DOM to the strategy chain.
//!
//! Only listings go through the browser. Documents are plain downloads and
//! stay with [`HttpIngestor`](super::HttpIngestor).
//!
//! One browser process is launched on the first fetch and reused until
//! [`ListingSource::shutdown`] is called.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use chrono::Utc;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::http::DEFAULT_USER_AGENT;
use super::LISTING_CONTENT_SELECTOR;
use crate::error::{FetchError, FetchResult};
use crate::traits::ingestor::{ListingSource, RawPage};

const SELECTOR_POLL: Duration = Duration::from_millis(250);

struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// Listing source that renders pages in headless Chromium.
///
/// # Example
///
/// ```rust,ignore
/// use court_extraction::{BrowserIngestor, ListingSource};
///
/// let browser = BrowserIngestor::builder().build();
/// let page = browser.fetch_listing("https://1dca.flcourts.gov/Opinions").await?;
/// browser.shutdown().await;
/// ```
pub struct BrowserIngestor {
    user_agent: String,
    executable: Option<PathBuf>,
    navigation_timeout: Duration,
    selector_timeout: Duration,
    settle: Duration,
    session: Mutex<Option<Session>>,
}

impl BrowserIngestor {
    pub fn builder() -> BrowserIngestorBuilder {
        BrowserIngestorBuilder::default()
    }

    async fn launch(&self) -> FetchResult<Session> {
        let mut config = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(self.navigation_timeout)
            .arg(format!("--user-agent={}", self.user_agent));
        if let Some(path) = &self.executable {
            config = config.chrome_executable(path);
        }
        let config = config.build().map_err(FetchError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        // The CDP connection only makes progress while its handler is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!("Headless browser launched");
        Ok(Session { browser, handler })
    }

    async fn render(&self, browser: &Browser, url: &str) -> FetchResult<RawPage> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        let result = self.load(&page, url).await;
        if let Err(e) = page.close().await {
            debug!(url = %url, error = %e, "Closing browser tab failed");
        }
        result
    }

    async fn load(&self, page: &Page, url: &str) -> FetchResult<RawPage> {
        debug!(url = %url, "Browser navigation starting");
        match tokio::time::timeout(self.navigation_timeout, page.goto(url)).await {
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                })
            }
            Ok(Err(e)) => return Err(FetchError::Browser(e.to_string())),
            Ok(Ok(_)) => {}
        }

        if !self.wait_for_content(page).await {
            debug!(url = %url, "No listing content appeared, parsing what rendered");
        }
        tokio::time::sleep(self.settle).await;

        let html = page
            .content()
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;
        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        debug!(url = %url, final_url = %final_url, size = html.len(), "Listing page rendered");

        Ok(RawPage::new(url, html)
            .with_final_url(final_url)
            .with_fetched_at(Utc::now()))
    }

    async fn wait_for_content(&self, page: &Page) -> bool {
        let deadline = Instant::now() + self.selector_timeout;
        loop {
            if page.find_element(LISTING_CONTENT_SELECTOR).await.is_ok() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(SELECTOR_POLL).await;
        }
    }
}

#[async_trait]
impl ListingSource for BrowserIngestor {
    async fn fetch_listing(&self, url: &str) -> FetchResult<RawPage> {
        url::Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        let mut slot = self.session.lock().await;
        let session = match slot.take() {
            Some(session) => session,
            None => self.launch().await?,
        };

        let result = self.render(&session.browser, url).await;
        *slot = Some(session);
        result
    }

    fn name(&self) -> &str {
        "browser"
    }

    async fn shutdown(&self) {
        let Some(mut session) = self.session.lock().await.take() else {
            return;
        };

        if let Err(e) = session.browser.close().await {
            warn!(error = %e, "Browser did not close cleanly");
        }
        if let Err(e) = session.browser.wait().await {
            debug!(error = %e, "Waiting for browser exit failed");
        }
        session.handler.abort();
        info!("Headless browser closed");
    }
}

/// Builder for [`BrowserIngestor`].
#[derive(Debug, Clone)]
pub struct BrowserIngestorBuilder {
    user_agent: String,
    executable: Option<PathBuf>,
    navigation_timeout: Duration,
    selector_timeout: Duration,
    settle: Duration,
}

impl Default for BrowserIngestorBuilder {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            executable: None,
            navigation_timeout: Duration::from_secs(30),
            selector_timeout: Duration::from_secs(10),
            settle: Duration::from_secs(2),
        }
    }
}

impl BrowserIngestorBuilder {
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Chromium binary to launch instead of the one found on `PATH`.
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// How long to wait for listing content before parsing anyway.
    pub fn selector_timeout(mut self, timeout: Duration) -> Self {
        self.selector_timeout = timeout;
        self
    }

    /// Extra pause after content appears, for lazily loaded rows.
    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn build(self) -> BrowserIngestor {
        BrowserIngestor {
            user_agent: self.user_agent,
            executable: self.executable,
            navigation_timeout: self.navigation_timeout,
            selector_timeout: self.selector_timeout,
            settle: self.settle,
            session: Mutex::new(None),
        }
    }
}
