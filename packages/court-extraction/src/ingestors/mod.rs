//! Ingestor implementations for court sites.
//!
//! # Available Ingestors
//!
//! - `HttpIngestor` - reqwest-backed fetching of listings and documents
//! - `BrowserIngestor` - headless Chromium for script-rendered listings
//!   (feature `browser`)
//! - `MockIngestor` - For testing
//!
//! # Example
//!
//! ```rust,ignore
//! use court_extraction::ingestors::{HttpIngestor, ListingSource};
//!
//! let ingestor = HttpIngestor::builder().user_agent("CourtOpinionFeed/1.0").build()?;
//! let page = ingestor.fetch_listing("https://supremecourt.flcourts.gov/Opinions").await?;
//! ```

#[cfg(feature = "browser")]
mod browser;
mod http;
mod mock;

#[cfg(feature = "browser")]
pub use browser::{BrowserIngestor, BrowserIngestorBuilder};
pub use http::{HttpIngestor, HttpIngestorBuilder, DEFAULT_MAX_DOCUMENT_BYTES, DEFAULT_USER_AGENT};
pub use mock::MockIngestor;

/// Elements whose presence means a listing has finished rendering.
pub const LISTING_CONTENT_SELECTOR: &str =
    "table, a[href*='download'], a[href*='.pdf'], [class*='opinion'], [class*='case']";

// Re-export from traits for convenience
pub use crate::traits::ingestor::{DocumentFetcher, ListingSource, RawDocument, RawPage};
