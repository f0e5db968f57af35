//! Table strategy: rows of a `<table>` with labelled columns.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use super::text::{element_text, is_generic_link_text};
use super::{PageContext, Strategy, StrategyKind};
use crate::types::candidate::Candidate;
use crate::types::date::{find_date, parse_date};

lazy_static! {
    static ref TABLE: Selector = Selector::parse("table").expect("valid selector");
    static ref ROW: Selector = Selector::parse("tr").expect("valid selector");
    static ref CELL: Selector = Selector::parse("th, td").expect("valid selector");
    static ref HEADER_CELL: Selector = Selector::parse("th").expect("valid selector");
    static ref LINK: Selector = Selector::parse("a[href]").expect("valid selector");
}

/// Reads structured rows. Header rows (`<th>`) label the columns of the
/// rows below them; headerless rows are read positionally.
pub struct TableStrategy;

impl Strategy for TableStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Table
    }

    fn candidates<'a>(
        &'a self,
        document: &'a Html,
        ctx: &'a PageContext,
    ) -> Box<dyn Iterator<Item = Candidate> + 'a> {
        Box::new(document.select(&TABLE).flat_map(move |table| {
            table
                .select(&ROW)
                .scan(None::<ColumnMap>, move |columns, row| {
                    if row.select(&HEADER_CELL).next().is_some() {
                        let headers: Vec<String> = row
                            .select(&CELL)
                            .map(|c| element_text(c).to_lowercase())
                            .collect();
                        *columns = Some(ColumnMap::from_headers(&headers));
                        return Some(None);
                    }
                    Some(parse_row(row, columns.as_ref(), ctx))
                })
                .flatten()
        }))
    }
}

/// Column indices recognized from a header row.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ColumnMap {
    case_number: Option<usize>,
    case_name: Option<usize>,
    date: Option<usize>,
    opinion_type: Option<usize>,
    lower_tribunal: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Self {
        let mut map = ColumnMap::default();
        for (i, h) in headers.iter().enumerate() {
            let h = h.trim_end_matches(':');
            if (h.contains("case") && h.contains("number")) || h == "case no" || h == "case no." {
                map.case_number.get_or_insert(i);
            } else if (h.contains("case") && h.contains("name"))
                || h.contains("style")
                || h.contains("caption")
                || h.contains("title")
            {
                map.case_name.get_or_insert(i);
            } else if h.contains("date")
                || h.contains("disposition")
                || h.contains("filed")
                || h.contains("released")
            {
                map.date.get_or_insert(i);
            } else if h.contains("type") {
                map.opinion_type.get_or_insert(i);
            } else if h.contains("tribunal") || h.contains("lower") {
                map.lower_tribunal.get_or_insert(i);
            }
        }
        map
    }
}

fn cell(texts: &[String], index: Option<usize>) -> String {
    index
        .and_then(|i| texts.get(i))
        .cloned()
        .unwrap_or_default()
}

fn parse_row(row: ElementRef<'_>, columns: Option<&ColumnMap>, ctx: &PageContext) -> Option<Candidate> {
    let texts: Vec<String> = row.select(&CELL).map(element_text).collect();
    if texts.len() < 2 {
        return None;
    }

    let mut candidate = Candidate::default();
    let mut date_text = String::new();

    match columns {
        Some(map) => {
            candidate.case_number = cell(&texts, map.case_number);
            candidate.case_name = cell(&texts, map.case_name);
            date_text = cell(&texts, map.date);
            candidate.opinion_type = Some(cell(&texts, map.opinion_type));
            candidate.lower_tribunal = Some(cell(&texts, map.lower_tribunal));
        }
        None if texts.len() >= 3 => {
            candidate.case_number = texts[0].clone();
            candidate.case_name = texts[1].clone();
            date_text = texts[2].clone();
            candidate.opinion_type = texts.get(3).cloned();
        }
        None => {}
    }

    for link in row.select(&LINK) {
        let href = link.value().attr("href").unwrap_or_default();
        let link_text = element_text(link);

        if candidate.document_url.is_none() && ctx.is_document_href(href) {
            candidate.document_url = ctx.resolve(href);
        }
        if candidate.case_name.is_empty() && !is_generic_link_text(&link_text) {
            candidate.case_name = link_text.clone();
        }
        if candidate.case_number.is_empty() {
            if let Some(number) = ctx.find_case_number(&link_text) {
                candidate.case_number = number;
            }
        }
    }

    // A labelled cell may carry extra words ("Case No. 1D2023-1234").
    candidate.case_number = ctx
        .find_case_number(&candidate.case_number)
        .or_else(|| texts.iter().find_map(|t| ctx.find_case_number(t)))
        .unwrap_or_default();

    if candidate.case_number.is_empty() {
        return None;
    }

    candidate.date_filed = parse_date(&date_text).or_else(|| find_date(&element_text(row)));
    Some(candidate)
}
