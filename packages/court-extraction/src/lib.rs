//! Court Listing Extraction Library
//!
//! Reads appellate court listing pages and turns them into plausible
//! opinion listings, whatever markup the court happens to use this month.
//!
//! # Usage
//!
//! ```rust,ignore
//! use court_extraction::{florida_courts, CourtScraper, HttpIngestor, Pacer, StrategyChain};
//!
//! let ingestor = HttpIngestor::new()?;
//! let chain = StrategyChain::default();
//! let pacer = Pacer::from_millis(1000);
//! let scraper = CourtScraper::new(&ingestor, &chain, &pacer);
//!
//! for court in florida_courts() {
//!     let scrape = scraper.scrape(&court, today).await?;
//!     let recent = scrape.within_lookback(today, 7);
//! }
//! ```
//!
//! # Modules
//!
//! - [`types`] - Court catalogue, candidates, date parsing
//! - [`strategies`] - The extraction strategy chain
//! - [`traits`] - Listing and document source abstractions
//! - [`ingestors`] - HTTP, headless browser (feature `browser`) and mock sources
//! - [`scrape`] - Per-court scraping across listing URLs
//! - [`pacing`] - Minimum spacing between outbound requests
//! - [`inspect`] - Page structure diagnostics

pub mod error;
pub mod ingestors;
pub mod inspect;
pub mod pacing;
pub mod scrape;
pub mod strategies;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ExtractionError, FetchError, FetchResult, ListingMiss, ScrapeError};
#[cfg(feature = "browser")]
pub use ingestors::{BrowserIngestor, BrowserIngestorBuilder};
pub use ingestors::{
    HttpIngestor, HttpIngestorBuilder, MockIngestor, DEFAULT_MAX_DOCUMENT_BYTES,
    DEFAULT_USER_AGENT, LISTING_CONTENT_SELECTOR,
};
pub use inspect::{PageReport, TableSummary};
pub use pacing::Pacer;
pub use scrape::{CourtScrape, CourtScraper};
pub use strategies::{ChainOutcome, PageContext, Strategy, StrategyChain, StrategyKind};
pub use traits::ingestor::{DocumentFetcher, ListingSource, RawDocument, RawPage};
pub use types::{
    candidate::{Candidate, ListedOpinion},
    court::{florida_courts, CourtConfig, CourtId, CourtPatterns, ListingUrl},
    date::{find_date, parse_date},
};
