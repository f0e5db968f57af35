//! The court catalogue: identifiers, listing URLs and per-court patterns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default case-number pattern shared by every court.
///
/// Prefixed forms come first so `1D2023-1234` is captured whole instead of
/// as the bare `2023-1234` suffix.
pub const DEFAULT_CASE_NUMBER_PATTERN: &str =
    r"(SC\d{2,4}-\d{1,5}|[1-6]D\d{2,4}-\d{1,5}|\d{4}-\d{2,5})";

/// Default pattern for hrefs that point at an opinion document.
pub const DEFAULT_DOCUMENT_LINK_PATTERN: &str = r"(?i)(\.pdf|/download/|/content/download)";

/// Default class pattern for generic opinion containers.
pub const DEFAULT_CONTAINER_CLASS_PATTERN: &str =
    r"(?i)(opinion|case|result|item|entry|row|record|search)";

/// One of the seven monitored courts.
///
/// Declaration order is the tie-break order used when sorting feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CourtId {
    #[serde(rename = "florida_supreme_court")]
    SupremeCourt,
    #[serde(rename = "1dca")]
    FirstDca,
    #[serde(rename = "2dca")]
    SecondDca,
    #[serde(rename = "3dca")]
    ThirdDca,
    #[serde(rename = "4dca")]
    FourthDca,
    #[serde(rename = "5dca")]
    FifthDca,
    #[serde(rename = "6dca")]
    SixthDca,
}

impl CourtId {
    /// All courts in catalogue order.
    pub const ALL: [CourtId; 7] = [
        CourtId::SupremeCourt,
        CourtId::FirstDca,
        CourtId::SecondDca,
        CourtId::ThirdDca,
        CourtId::FourthDca,
        CourtId::FifthDca,
        CourtId::SixthDca,
    ];

    /// Stable code used in state files and feed identifiers.
    pub fn code(&self) -> &'static str {
        match self {
            CourtId::SupremeCourt => "florida_supreme_court",
            CourtId::FirstDca => "1dca",
            CourtId::SecondDca => "2dca",
            CourtId::ThirdDca => "3dca",
            CourtId::FourthDca => "4dca",
            CourtId::FifthDca => "5dca",
            CourtId::SixthDca => "6dca",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CourtId::SupremeCourt => "Supreme Court of Florida",
            CourtId::FirstDca => "First District Court of Appeal",
            CourtId::SecondDca => "Second District Court of Appeal",
            CourtId::ThirdDca => "Third District Court of Appeal",
            CourtId::FourthDca => "Fourth District Court of Appeal",
            CourtId::FifthDca => "Fifth District Court of Appeal",
            CourtId::SixthDca => "Sixth District Court of Appeal",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            CourtId::SupremeCourt => "FLSC",
            CourtId::FirstDca => "1st DCA",
            CourtId::SecondDca => "2nd DCA",
            CourtId::ThirdDca => "3rd DCA",
            CourtId::FourthDca => "4th DCA",
            CourtId::FifthDca => "5th DCA",
            CourtId::SixthDca => "6th DCA",
        }
    }
}

impl fmt::Display for CourtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CourtId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        CourtId::ALL
            .into_iter()
            .find(|c| c.code() == needle || c.short_name().to_lowercase() == needle)
            .ok_or_else(|| format!("unknown court: {}", s))
    }
}

/// A labelled listing page for a court ("recent", "archive", "main").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingUrl {
    pub label: String,
    pub url: String,
}

impl ListingUrl {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Patterns used by the extraction strategies for one court.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtPatterns {
    #[serde(default = "default_case_number_pattern")]
    pub case_number: String,

    #[serde(default = "default_document_link_pattern")]
    pub document_link: String,

    #[serde(default = "default_container_class_pattern")]
    pub container_class: String,
}

fn default_case_number_pattern() -> String {
    DEFAULT_CASE_NUMBER_PATTERN.to_string()
}

fn default_document_link_pattern() -> String {
    DEFAULT_DOCUMENT_LINK_PATTERN.to_string()
}

fn default_container_class_pattern() -> String {
    DEFAULT_CONTAINER_CLASS_PATTERN.to_string()
}

impl Default for CourtPatterns {
    fn default() -> Self {
        Self {
            case_number: default_case_number_pattern(),
            document_link: default_document_link_pattern(),
            container_class: default_container_class_pattern(),
        }
    }
}

/// Scraping configuration for one court.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtConfig {
    pub id: CourtId,

    /// Base URL of the court site
    pub base_url: String,

    /// Listing pages in priority order
    pub listing_urls: Vec<ListingUrl>,

    #[serde(default)]
    pub patterns: CourtPatterns,
}

impl CourtConfig {
    pub fn new(id: CourtId, base_url: impl Into<String>) -> Self {
        Self {
            id,
            base_url: base_url.into(),
            listing_urls: Vec::new(),
            patterns: CourtPatterns::default(),
        }
    }

    /// Append a listing page; earlier pages take priority.
    pub fn with_listing(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.listing_urls.push(ListingUrl::new(label, url));
        self
    }

    pub fn with_patterns(mut self, patterns: CourtPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }
}

/// The built-in catalogue of all seven Florida appellate courts.
pub fn florida_courts() -> Vec<CourtConfig> {
    let supreme = "https://supremecourt.flcourts.gov";
    let mut courts = vec![CourtConfig::new(CourtId::SupremeCourt, supreme)
        .with_listing(
            "recent",
            format!("{supreme}/case-information/opinions/most-recent-opinions"),
        )
        .with_listing("archive", format!("{supreme}/Opinions/Archived-Opinions"))
        .with_listing(
            "main",
            format!("{supreme}/content/download/opinion-search-results"),
        )];

    for id in &CourtId::ALL[1..] {
        let base = format!("https://{}.flcourts.gov", id.code());
        // The Third DCA names its recent page differently.
        let recent = if *id == CourtId::ThirdDca {
            format!("{base}/Opinions/Most-Recent-Opinion-Release")
        } else {
            format!("{base}/Opinions/Most-Recent-Written-Opinions")
        };
        courts.push(
            CourtConfig::new(*id, base.clone())
                .with_listing("recent", recent)
                .with_listing("archive", format!("{base}/Opinions/Opinions-Archive"))
                .with_listing("main", format!("{base}/Opinions")),
        );
    }

    courts
}
