//! Florida Appellate Opinion Feed
//!
//! Scrapes the listing pages of Florida's Supreme Court and six District
//! Courts of Appeal, deduplicates opinions against a persisted state
//! store, summarizes new opinions and publishes RSS, Atom and HTML feeds.
//!
//! # Usage
//!
//! ```rust,ignore
//! use opinion_feed::{Config, Pipeline, RunClock, StateStore};
//!
//! let config = Config::from_env()?;
//! let pipeline = Pipeline::from_config(&config)?;
//! let mut store = StateStore::load(&config.state_file).await?;
//! let report = pipeline.run(&mut store, RunClock::now()).await?;
//! std::process::exit(report.status().exit_code().into());
//! ```
//!
//! # Modules
//!
//! - [`record`] - The opinion record and its dedup key
//! - [`state`] - Persisted state store
//! - [`reconcile`] - New vs. already-seen partitioning
//! - [`summarize`] - Document fetch, text extraction and summary boundary
//! - [`feed`] - RSS, Atom and HTML rendering
//! - [`pipeline`] - The per-run orchestrator
//! - [`inspect`] - Listing page diagnostics
//! - [`testing`] - Test doubles for the summary boundary

pub mod atomic;
pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod inspect;
pub mod pipeline;
pub mod reconcile;
pub mod record;
pub mod state;
pub mod summarize;
pub mod testing;

pub use config::{Config, ListingFetcher};
pub use error::{CourtFailure, FeedError, PipelineError, StateError, SummaryFailure, SummaryStage};
pub use feed::{render_feeds, write_artifacts, FeedArtifacts, FeedMeta, SUMMARY_PLACEHOLDER};
pub use pipeline::{CourtOutcome, CourtSummary, Pipeline, RunClock, RunReport, RunStatus};
pub use reconcile::{reconcile, Reconciliation};
pub use record::{OpinionKey, OpinionRecord};
pub use state::StateStore;
pub use summarize::{Summarizer, SummarizerAdapter, SummaryRequest, TextExtractor};
