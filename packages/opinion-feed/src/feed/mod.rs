//! Feed generation: RSS 2.0, Atom 1.0 and an HTML index.
//!
//! Rendering is a pure function of the records, the feed metadata and the
//! build time. Writing stages all three artifacts before replacing any of
//! them, so a failed run leaves the previous feed in place.

mod atom;
mod escape;
mod html;
mod rss;

pub use escape::escape;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

use crate::atomic::StagedFile;
use crate::error::FeedError;
use crate::record::OpinionRecord;

pub const RSS_FILE: &str = "feed.xml";
pub const ATOM_FILE: &str = "atom.xml";
pub const HTML_FILE: &str = "index.html";

/// Shown in place of a summary that is missing for any reason.
pub const SUMMARY_PLACEHOLDER: &str = "Summary not available.";

/// Longest caption shown in an entry title.
pub const MAX_TITLE_CAPTION_CHARS: usize = 150;

pub const DEFAULT_FEED_TITLE: &str = "Florida Appellate Court Opinions";
pub const DEFAULT_FEED_DESCRIPTION: &str =
    "Daily summaries of new opinions from Florida's Supreme Court and District Courts of Appeal";
pub const DEFAULT_FEED_LINK: &str = "https://flcourts.gov";
pub const DEFAULT_FEED_LANGUAGE: &str = "en";
pub const DEFAULT_GENERATOR: &str = "Florida Court Opinion Scraper";

/// Feed identifier used when no public site URL is configured.
const FALLBACK_FEED_ID: &str = "https://github.com/florida-court-opinions";

/// Channel-level metadata shared by all three artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMeta {
    pub title: String,
    pub description: String,
    /// Human-facing site the feed describes
    pub link: String,
    pub language: String,
    /// Public URL the artifacts are served from, for self links
    pub site_url: Option<String>,
    pub generator: String,
}

impl Default for FeedMeta {
    fn default() -> Self {
        Self {
            title: DEFAULT_FEED_TITLE.to_string(),
            description: DEFAULT_FEED_DESCRIPTION.to_string(),
            link: DEFAULT_FEED_LINK.to_string(),
            language: DEFAULT_FEED_LANGUAGE.to_string(),
            site_url: None,
            generator: DEFAULT_GENERATOR.to_string(),
        }
    }
}

impl FeedMeta {
    /// Reject metadata that cannot produce a valid feed.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.title.trim().is_empty() {
            return Err(FeedError::Metadata("feed title is empty".into()));
        }
        require_http_url("feed link", &self.link)?;
        if let Some(site_url) = &self.site_url {
            require_http_url("site URL", site_url)?;
        }
        Ok(())
    }

    /// Public URL of an artifact, when the site URL is known.
    pub fn public_url(&self, file: &str) -> Option<String> {
        self.site_url
            .as_deref()
            .map(|site| format!("{}/{}", site.trim_end_matches('/'), file))
    }

    fn feed_id(&self) -> &str {
        self.site_url.as_deref().unwrap_or(FALLBACK_FEED_ID)
    }
}

fn require_http_url(what: &str, value: &str) -> Result<(), FeedError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(FeedError::Metadata(format!(
            "{what} must be http(s), got scheme {}",
            url.scheme()
        ))),
        Err(e) => Err(FeedError::Metadata(format!("{what} {value:?} is not absolute: {e}"))),
    }
}

/// The three rendered documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedArtifacts {
    pub rss: String,
    pub atom: String,
    pub html: String,
    /// Number of entries in each document
    pub entries: usize,
}

impl FeedArtifacts {
    fn files(&self) -> [(&'static str, &str); 3] {
        [
            (RSS_FILE, self.rss.as_str()),
            (ATOM_FILE, self.atom.as_str()),
            (HTML_FILE, self.html.as_str()),
        ]
    }
}

/// Newest filing first; ties by court catalogue order, then case number.
pub fn sort_records(records: &mut [&OpinionRecord]) {
    records.sort_by(|a, b| {
        b.date_filed
            .cmp(&a.date_filed)
            .then_with(|| a.court_id.cmp(&b.court_id))
            .then_with(|| a.case_number.cmp(&b.case_number))
    });
}

/// Bracketed court name, case number and caption (cut at 150 characters).
pub fn entry_title(record: &OpinionRecord) -> String {
    format!(
        "[{}] {} \u{2014} {}",
        record.court_name(),
        record.case_number,
        caption(record)
    )
}

fn caption(record: &OpinionRecord) -> String {
    record
        .case_name
        .chars()
        .take(MAX_TITLE_CAPTION_CHARS)
        .collect()
}

/// `court_id:case_number`, stable across runs.
pub fn entry_id(record: &OpinionRecord) -> String {
    record.key().to_string()
}

/// Publication time of an entry: its filing date at midnight UTC.
pub fn published_at(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

/// Long-form date as shown to readers.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Summary as HTML paragraphs, or the placeholder.
fn summary_html(record: &OpinionRecord) -> String {
    match record.summary.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(summary) => summary
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| format!("<p>{}</p>", escape(p)))
            .collect::<Vec<_>>()
            .join("\n"),
        None => format!("<p><em>{SUMMARY_PLACEHOLDER}</em></p>"),
    }
}

/// HTML body of an entry, shared by the RSS description and Atom content.
fn entry_body(record: &OpinionRecord) -> Result<String, std::fmt::Error> {
    let mut out = summary_html(record);
    out.push('\n');
    if let Some(kind) = &record.opinion_type {
        writeln!(out, "<p><strong>Opinion Type:</strong> {}</p>", escape(kind))?;
    }
    if let Some(tribunal) = &record.lower_tribunal {
        writeln!(out, "<p><strong>Lower Tribunal:</strong> {}</p>", escape(tribunal))?;
    }
    writeln!(out, "<p><strong>Court:</strong> {}</p>", escape(record.court_name()))?;
    writeln!(out, "<p><strong>Case Number:</strong> {}</p>", escape(&record.case_number))?;
    writeln!(out, "<p><strong>Date:</strong> {}</p>", display_date(record.date_filed))?;
    write!(
        out,
        "<p><a href=\"{}\">View Full Opinion (PDF)</a></p>",
        escape(&record.document_url)
    )?;
    Ok(out)
}

/// Render all three artifacts for `records`.
pub fn render_feeds(
    records: &[&OpinionRecord],
    meta: &FeedMeta,
    now: DateTime<Utc>,
) -> Result<FeedArtifacts, FeedError> {
    meta.validate()?;

    let mut sorted = records.to_vec();
    sort_records(&mut sorted);

    let artifacts = FeedArtifacts {
        rss: rss::render(&sorted, meta, now)?,
        atom: atom::render(&sorted, meta, now)?,
        html: html::render(&sorted, meta, now)?,
        entries: sorted.len(),
    };
    debug!(entries = artifacts.entries, "Feeds rendered");
    Ok(artifacts)
}

/// Write the artifacts into `dir`, replacing the previous set.
///
/// Nothing is replaced unless all three temp files were written.
pub async fn write_artifacts(dir: &Path, artifacts: &FeedArtifacts) -> Result<(), FeedError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| FeedError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

    let mut staged = Vec::with_capacity(3);
    for (file, contents) in artifacts.files() {
        let path = dir.join(file);
        match StagedFile::write(&path, contents.as_bytes()).await {
            Ok(file) => staged.push(file),
            Err(source) => {
                for file in staged {
                    file.discard().await;
                }
                return Err(FeedError::Write { path, source });
            }
        }
    }

    let mut staged = staged.into_iter();
    while let Some(file) = staged.next() {
        let path = file.target().to_path_buf();
        if let Err(source) = file.commit().await {
            for rest in staged {
                rest.discard().await;
            }
            return Err(FeedError::Write { path, source });
        }
    }

    info!(dir = %dir.display(), entries = artifacts.entries, "Feeds written");
    Ok(())
}
