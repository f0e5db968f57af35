//! Typed errors for the court extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur while fetching listing pages or documents.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Connection timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Body exceeds the configured size cap
    #[error("{url} is larger than {limit} bytes")]
    TooLarge { url: String, limit: usize },

    /// HTTP client could not be constructed
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    /// Headless browser failed to launch or render
    #[error("browser error: {0}")]
    Browser(String),
}

impl FetchError {
    /// Map a reqwest error, keeping timeouts distinguishable.
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Http(Box::new(error))
        }
    }
}

/// Errors raised while preparing or running the extraction chain.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A court pattern failed to compile
    #[error("invalid {field} pattern for {court}: {source}")]
    Pattern {
        court: String,
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    /// The listing page URL could not be parsed
    #[error("invalid page URL: {0}")]
    PageUrl(#[from] url::ParseError),
}

/// Why one listing URL of a court produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingMiss {
    /// The page could not be fetched
    Fetch { label: String, error: String },

    /// The page was fetched but no strategy matched
    NoMatch {
        label: String,
        case_numbers_seen: usize,
    },
}

impl std::fmt::Display for ListingMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingMiss::Fetch { label, error } => write!(f, "{label}: fetch failed ({error})"),
            ListingMiss::NoMatch {
                label,
                case_numbers_seen,
            } => write!(
                f,
                "{label}: no strategy matched ({case_numbers_seen} case numbers seen)"
            ),
        }
    }
}

/// Errors from scraping one court.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Court configuration is unusable
    #[error(transparent)]
    Setup(#[from] ExtractionError),

    /// Every listing URL failed or matched nothing
    #[error("no listing page of {court} produced opinions: {}", join_misses(.misses))]
    NoResults {
        court: String,
        misses: Vec<ListingMiss>,
    },
}

impl ScrapeError {
    /// Whether every listing URL failed at the network level.
    pub fn is_unreachable(&self) -> bool {
        match self {
            ScrapeError::Setup(_) => false,
            ScrapeError::NoResults { misses, .. } => {
                !misses.is_empty() && misses.iter().all(|m| matches!(m, ListingMiss::Fetch { .. }))
            }
        }
    }
}

fn join_misses(misses: &[ListingMiss]) -> String {
    if misses.is_empty() {
        return "no listing URLs configured".to_string();
    }
    misses
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for extraction setup.
pub type Result<T> = std::result::Result<T, ExtractionError>;
