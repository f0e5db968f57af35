//! Error types for the opinion feed pipeline.
//!
//! Only [`StateError`] and [`FeedError`] abort a run. Court and summary
//! failures are recorded in the run report and the run carries on.

use court_extraction::ScrapeError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors loading or persisting the state store.
#[derive(Debug, Error)]
pub enum StateError {
    /// The state file exists but could not be read
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file is malformed or violates key uniqueness
    #[error("state file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// The state file was written by an incompatible version
    #[error("state file {path} has unsupported version {found}")]
    Version { path: PathBuf, found: u32 },

    /// The state file could not be written
    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StateError {
    /// Whether the persisted state itself is bad (as opposed to I/O trouble).
    pub fn is_corruption(&self) -> bool {
        matches!(self, StateError::Corrupt { .. } | StateError::Version { .. })
    }
}

/// Errors rendering or writing feed artifacts.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Feed metadata cannot produce a valid document
    #[error("invalid feed metadata: {0}")]
    Metadata(String),

    #[error("failed to render feed: {0}")]
    Render(#[from] std::fmt::Error),

    /// An artifact could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Step of the summarization path that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStage {
    Fetch,
    Extract,
    Summarize,
}

impl fmt::Display for SummaryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SummaryStage::Fetch => "document fetch",
            SummaryStage::Extract => "text extraction",
            SummaryStage::Summarize => "summarization",
        })
    }
}

/// A summary could not be produced for one opinion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed: {message}")]
pub struct SummaryFailure {
    pub stage: SummaryStage,
    pub message: String,
}

impl SummaryFailure {
    pub fn new(stage: SummaryStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }

    pub fn fetch(message: impl fmt::Display) -> Self {
        Self::new(SummaryStage::Fetch, message.to_string())
    }

    pub fn extract(message: impl fmt::Display) -> Self {
        Self::new(SummaryStage::Extract, message.to_string())
    }

    pub fn summarize(message: impl fmt::Display) -> Self {
        Self::new(SummaryStage::Summarize, message.to_string())
    }
}

/// Why one court contributed nothing to a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CourtFailure {
    /// Every listing URL failed at the network level
    #[error("listing unreachable: {0}")]
    Unreachable(String),

    /// Pages were fetched but no strategy produced opinions
    #[error("no opinions extracted: {0}")]
    NoResults(String),

    /// The court's patterns or URLs are unusable
    #[error("invalid court configuration: {0}")]
    Config(String),
}

impl From<ScrapeError> for CourtFailure {
    fn from(error: ScrapeError) -> Self {
        match &error {
            ScrapeError::Setup(_) => CourtFailure::Config(error.to_string()),
            ScrapeError::NoResults { .. } if error.is_unreachable() => {
                CourtFailure::Unreachable(error.to_string())
            }
            ScrapeError::NoResults { .. } => CourtFailure::NoResults(error.to_string()),
        }
    }
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("state store failure: {0}")]
    State(#[from] StateError),

    #[error("feed generation failure: {0}")]
    Feed(#[from] FeedError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
