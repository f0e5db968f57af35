//! Structure diagnostics for a listing page.
//!
//! When a court site changes its markup the chain quietly stops matching.
//! [`PageReport`] summarizes what the page does contain (tables, document
//! links, containers, embedded frames, scripts that load results later) so
//! an operator can see which pattern needs adjusting.

use lazy_static::lazy_static;
use scraper::{Html, Selector};
use serde::Serialize;
use std::fmt;

use crate::ingestors::LISTING_CONTENT_SELECTOR;
use crate::strategies::text::{element_text, truncate_chars};
use crate::strategies::{ChainOutcome, PageContext, StrategyChain, StrategyKind};

const MAX_EXAMPLES: usize = 5;
const MAX_CELL_CHARS: usize = 40;

lazy_static! {
    static ref TABLE: Selector = Selector::parse("table").expect("valid selector");
    static ref ROW: Selector = Selector::parse("tr").expect("valid selector");
    static ref CELL: Selector = Selector::parse("td, th").expect("valid selector");
    static ref LINK: Selector = Selector::parse("a[href]").expect("valid selector");
    static ref CLASSED: Selector =
        Selector::parse("div[class], article[class], section[class], li[class]")
            .expect("valid selector");
    static ref IFRAME: Selector = Selector::parse("iframe").expect("valid selector");
    static ref SCRIPT: Selector = Selector::parse("script").expect("valid selector");
    static ref CONTENT: Selector =
        Selector::parse(LISTING_CONTENT_SELECTOR).expect("valid selector");
}

/// Markers of scripts that load listings after page load.
const DYNAMIC_MARKERS: &[&str] = &["ajax", "xmlhttprequest", "fetch(", "api/"];

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    /// Text of the first row's cells, shortened
    pub first_row: Vec<String>,
}

/// What a listing page contains, from the chain's point of view.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub page_url: String,
    pub tables: Vec<TableSummary>,
    pub document_links: usize,
    pub document_link_examples: Vec<String>,
    pub case_numbers: usize,
    pub case_number_examples: Vec<String>,
    pub containers: usize,
    pub iframes: Vec<String>,
    pub dynamic_scripts: usize,
    /// Whether anything a rendered listing would contain is present
    pub content_present: bool,
    /// Strategy the chain would pick, if any
    pub strategy: Option<StrategyKind>,
    pub opinions: usize,
}

impl PageReport {
    pub fn analyze(html: &str, ctx: &PageContext) -> Self {
        let document = Html::parse_document(html);

        let tables = document
            .select(&TABLE)
            .map(|table| {
                let rows: Vec<_> = table.select(&ROW).collect();
                let first_row = rows
                    .first()
                    .map(|row| {
                        row.select(&CELL)
                            .map(|cell| truncate_chars(&element_text(cell), MAX_CELL_CHARS))
                            .collect()
                    })
                    .unwrap_or_default();
                TableSummary {
                    rows: rows.len(),
                    first_row,
                }
            })
            .collect();

        let document_hrefs: Vec<String> = document
            .select(&LINK)
            .filter_map(|link| link.value().attr("href"))
            .filter(|href| ctx.is_document_href(href))
            .filter_map(|href| ctx.resolve(href))
            .collect();

        let page_text = element_text(document.root_element());
        let case_numbers = ctx.distinct_case_numbers(&page_text);

        let containers = document
            .select(&CLASSED)
            .filter(|el| {
                el.value()
                    .attr("class")
                    .map(|class| ctx.is_container_class(class))
                    .unwrap_or(false)
            })
            .count();

        let iframes = document
            .select(&IFRAME)
            .map(|frame| frame.value().attr("src").unwrap_or("").to_string())
            .collect();

        let dynamic_scripts = document
            .select(&SCRIPT)
            .filter(|script| {
                let body = script.text().collect::<String>().to_lowercase();
                DYNAMIC_MARKERS.iter().any(|marker| body.contains(marker))
            })
            .count();

        let content_present = document.select(&CONTENT).next().is_some();

        let outcome = StrategyChain::default().extract_document(&document, ctx);
        let (strategy, opinions) = match &outcome {
            ChainOutcome::Matched { strategy, opinions } => (Some(*strategy), opinions.len()),
            ChainOutcome::NoMatch { .. } => (None, 0),
        };

        Self {
            page_url: ctx.page_url.to_string(),
            tables,
            document_links: document_hrefs.len(),
            document_link_examples: document_hrefs.into_iter().take(MAX_EXAMPLES).collect(),
            case_numbers: case_numbers.len(),
            case_number_examples: case_numbers.into_iter().take(MAX_EXAMPLES).collect(),
            containers,
            iframes,
            dynamic_scripts,
            content_present,
            strategy,
            opinions,
        }
    }

    /// Whether the page looks like it renders its listing client-side.
    pub fn looks_dynamic(&self) -> bool {
        self.strategy.is_none()
            && self.case_numbers == 0
            && !self.content_present
            && (!self.iframes.is_empty() || self.dynamic_scripts > 0)
    }
}

impl fmt::Display for PageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Page: {}", self.page_url)?;
        writeln!(f, "  Tables: {}", self.tables.len())?;
        for (i, table) in self.tables.iter().enumerate() {
            writeln!(
                f,
                "    #{} rows={} first=[{}]",
                i + 1,
                table.rows,
                table.first_row.join(" | ")
            )?;
        }
        writeln!(f, "  Document links: {}", self.document_links)?;
        for href in &self.document_link_examples {
            writeln!(f, "    {}", href)?;
        }
        writeln!(
            f,
            "  Case numbers: {} [{}]",
            self.case_numbers,
            self.case_number_examples.join(", ")
        )?;
        writeln!(f, "  Containers: {}", self.containers)?;
        writeln!(f, "  Iframes: {}", self.iframes.len())?;
        for src in &self.iframes {
            writeln!(f, "    {}", src)?;
        }
        writeln!(f, "  Dynamic scripts: {}", self.dynamic_scripts)?;
        writeln!(
            f,
            "  Listing content: {}",
            if self.content_present { "present" } else { "missing" }
        )?;
        match self.strategy {
            Some(strategy) => write!(f, "  Strategy: {} ({} opinions)", strategy, self.opinions),
            None => write!(f, "  Strategy: none"),
        }
    }
}
