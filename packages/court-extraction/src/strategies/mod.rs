//! Extraction strategy chain.
//!
//! Each strategy reads one parsed listing page and lazily yields
//! [`Candidate`] rows. The chain tries them in a fixed priority order and
//! keeps the output of the first strategy that yields at least one
//! plausible opinion:
//!
//! 1. [`TableStrategy`] - structured rows with labelled columns
//! 2. [`DocumentLinkStrategy`] - anchors pointing at opinion documents
//! 3. [`ContainerStrategy`] - generic blocks whose class looks like a result
//! 4. [`CaseLinkStrategy`] - any anchor whose text carries a case number
//!
//! Well-structured pages are read by the strict strategy; ad hoc markup
//! falls through to the looser heuristics.

pub mod case_link;
pub mod container;
pub mod link;
pub mod table;
pub mod text;

pub use case_link::CaseLinkStrategy;
pub use container::ContainerStrategy;
pub use link::DocumentLinkStrategy;
pub use table::TableStrategy;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};
use url::Url;

use crate::error::{ExtractionError, Result};
use crate::types::candidate::{Candidate, ListedOpinion};
use crate::types::court::{CourtConfig, CourtId};

/// Identifies a strategy in logs and run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Table,
    DocumentLink,
    Container,
    CaseLink,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Table => "table",
            StrategyKind::DocumentLink => "document-link",
            StrategyKind::Container => "container",
            StrategyKind::CaseLink => "case-link",
        };
        f.write_str(name)
    }
}

/// Everything a strategy needs to know about the page it is reading.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub court: CourtId,
    pub page_url: Url,
    pub today: NaiveDate,
    case_number: Regex,
    document_link: Regex,
    container_class: Regex,
}

impl PageContext {
    /// Compile the court's patterns for one listing page.
    pub fn new(court: &CourtConfig, page_url: &str, today: NaiveDate) -> Result<Self> {
        let compile = |field: &'static str, pattern: &str| {
            Regex::new(pattern).map_err(|source| ExtractionError::Pattern {
                court: court.id.to_string(),
                field,
                source,
            })
        };

        Ok(Self {
            court: court.id,
            page_url: Url::parse(page_url)?,
            today,
            case_number: compile("case number", &court.patterns.case_number)?,
            document_link: compile("document link", &court.patterns.document_link)?,
            container_class: compile("container class", &court.patterns.container_class)?,
        })
    }

    /// First case number in `text`, skipping matches that are really dates
    /// (`2024-05-01` would otherwise read as `2024-05`).
    pub fn find_case_number(&self, text: &str) -> Option<String> {
        self.case_numbers(text).next()
    }

    /// Number of distinct case numbers in `text`.
    pub fn count_case_numbers(&self, text: &str) -> usize {
        self.distinct_case_numbers(text).len()
    }

    /// Distinct case numbers in `text`, in order of first appearance.
    pub fn distinct_case_numbers(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.case_numbers(text)
            .filter(|n| seen.insert(n.clone()))
            .collect()
    }

    fn case_numbers<'t>(&'t self, text: &'t str) -> impl Iterator<Item = String> + 't {
        self.case_number.find_iter(text).filter_map(move |m| {
            let mut rest = text[m.end()..].chars();
            let date_like = matches!(
                (rest.next(), rest.next()),
                (Some('-' | '/'), Some(d)) if d.is_ascii_digit()
            );
            (!date_like).then(|| m.as_str().to_string())
        })
    }

    pub fn is_document_href(&self, href: &str) -> bool {
        self.document_link.is_match(href)
    }

    pub fn is_container_class(&self, class: &str) -> bool {
        self.container_class.is_match(class)
    }

    /// Resolve an href against the page URL; only http(s) targets survive.
    pub fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            return None;
        }

        self.page_url
            .join(href)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .map(|u| u.to_string())
    }

    /// Nearest date found in the element's ancestors, closest first.
    pub(crate) fn date_near(&self, element: ElementRef<'_>, depth: usize) -> Option<NaiveDate> {
        element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take(depth)
            .find_map(|ancestor| crate::types::date::find_date(&text::element_text(ancestor)))
    }
}

/// One way of reading candidate rows out of a listing page.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Lazily produce candidates; plausibility is judged by the chain.
    fn candidates<'a>(
        &'a self,
        document: &'a Html,
        ctx: &'a PageContext,
    ) -> Box<dyn Iterator<Item = Candidate> + 'a>;
}

/// Result of running the chain over one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// A strategy produced plausible opinions
    Matched {
        strategy: StrategyKind,
        opinions: Vec<ListedOpinion>,
    },

    /// No strategy produced anything plausible
    NoMatch {
        /// Distinct case-number patterns seen in the page text
        case_numbers_seen: usize,
    },
}

impl ChainOutcome {
    pub fn opinions(&self) -> &[ListedOpinion] {
        match self {
            ChainOutcome::Matched { opinions, .. } => opinions,
            ChainOutcome::NoMatch { .. } => &[],
        }
    }

    pub fn strategy(&self) -> Option<StrategyKind> {
        match self {
            ChainOutcome::Matched { strategy, .. } => Some(*strategy),
            ChainOutcome::NoMatch { .. } => None,
        }
    }
}

/// Ordered fallback chain of strategies.
pub struct StrategyChain {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(TableStrategy),
            Box::new(DocumentLinkStrategy),
            Box::new(ContainerStrategy),
            Box::new(CaseLinkStrategy),
        ])
    }
}

impl StrategyChain {
    /// Build a chain from strategies in priority order.
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Parse `html` and run the strategies until one is plausible.
    pub fn extract(&self, html: &str, ctx: &PageContext) -> ChainOutcome {
        let document = Html::parse_document(html);
        self.extract_document(&document, ctx)
    }

    /// Run the strategies over an already-parsed document.
    pub fn extract_document(&self, document: &Html, ctx: &PageContext) -> ChainOutcome {
        for strategy in &self.strategies {
            let mut seen = HashSet::new();
            let opinions: Vec<ListedOpinion> = strategy
                .candidates(document, ctx)
                .filter_map(|c| c.into_listed(ctx.court, ctx.page_url.as_str(), ctx.today))
                .filter(|o| seen.insert(o.case_number.clone()))
                .collect();

            if opinions.is_empty() {
                debug!(
                    court = %ctx.court,
                    strategy = %strategy.kind(),
                    "Strategy produced no plausible records"
                );
                continue;
            }

            info!(
                court = %ctx.court,
                strategy = %strategy.kind(),
                count = opinions.len(),
                "Parsed opinions"
            );
            return ChainOutcome::Matched {
                strategy: strategy.kind(),
                opinions,
            };
        }

        let page_text = text::element_text(document.root_element());
        ChainOutcome::NoMatch {
            case_numbers_seen: ctx.count_case_numbers(&page_text),
        }
    }
}
