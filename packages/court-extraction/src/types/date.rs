//! Filing-date parsing for the formats courts publish.

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

/// Formats tried in order by [`parse_date`].
pub const DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%m/%d/%y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%Y-%m-%d",
    "%d-%b-%Y",
    "%m-%d-%Y",
];

lazy_static! {
    static ref DATE_IN_TEXT: Regex = Regex::new(
        r"(\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{2}-\d{2}|\d{1,2}-[A-Za-z]{3}-\d{4}|\d{1,2}-\d{1,2}-\d{4}|[A-Za-z]{3,9}\.? \d{1,2},? \d{4})"
    )
    .expect("date pattern is valid");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("whitespace pattern is valid");
}

/// Parse a date string in any of the supported formats.
///
/// A format that parses but yields a year before 1900 is skipped, so
/// `05/01/24` is read through `%y` rather than as the year 24.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = WHITESPACE.replace_all(raw.trim(), " ").replace('.', "");
    if cleaned.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
        .find(|date| date.year() >= 1900)
}

/// Find the first parseable date anywhere in free text.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    DATE_IN_TEXT
        .find_iter(text)
        .find_map(|m| parse_date(m.as_str()))
}

/// Byte ranges of date-looking substrings, used to strip dates from captions.
pub(crate) fn date_spans(text: &str) -> Vec<(usize, usize)> {
    DATE_IN_TEXT
        .find_iter(text)
        .filter(|m| parse_date(m.as_str()).is_some())
        .map(|m| (m.start(), m.end()))
        .collect()
}
