//! Text helpers shared by the strategies.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::ElementRef;

use crate::types::date::date_spans;

/// Longest caption kept from free-form context text.
pub const MAX_CAPTION_CHARS: usize = 300;

/// Link texts that say nothing about the case.
const GENERIC_LINK_TEXTS: &[&str] = &[
    "pdf",
    "download",
    "view",
    "view pdf",
    "opinion",
    "view opinion",
    "click here",
    "here",
];

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("whitespace pattern is valid");
    static ref GENERIC_TOKEN: Regex =
        Regex::new(r"(?i)[\[(]?\b(pdf|download)\b[\])]?").expect("generic token pattern is valid");
}

/// Collapse runs of whitespace and trim.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Visible text of an element, whitespace-normalized.
pub fn element_text(element: ElementRef<'_>) -> String {
    let joined = element.text().collect::<Vec<_>>().join(" ");
    normalize_whitespace(&joined)
}

/// Truncate on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Whether link text is a generic label ("PDF", "Download", ...).
pub fn is_generic_link_text(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    lower.is_empty() || GENERIC_LINK_TEXTS.contains(&lower.as_str())
}

/// Turn block text into a caption: drop the case number and dates,
/// trim separators, cap the length.
pub fn clean_caption(text: &str, case_number: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in date_spans(text) {
        if start >= cursor {
            stripped.push_str(&text[cursor..start]);
            stripped.push(' ');
            cursor = end;
        }
    }
    stripped.push_str(&text[cursor..]);

    if !case_number.is_empty() {
        stripped = stripped.replace(case_number, " ");
    }
    let stripped = GENERIC_TOKEN.replace_all(&stripped, " ");

    let collapsed = normalize_whitespace(&stripped);
    let trimmed = collapsed.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | '–' | '—' | '|' | ',' | ':' | ';')
    });

    if is_generic_link_text(trimmed) {
        return String::new();
    }

    truncate_chars(trimmed, MAX_CAPTION_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 50), "short");
    }

    #[test]
    fn test_clean_caption_strips_number_and_date() {
        let caption = clean_caption("1D2023-1234 — Doe v. Roe | 05/01/2024", "1D2023-1234");
        assert_eq!(caption, "Doe v. Roe");
    }

    #[test]
    fn test_clean_caption_drops_file_labels() {
        assert_eq!(
            clean_caption("May 9, 2024 PDF Brown v. Department of Revenue", ""),
            "Brown v. Department of Revenue"
        );
        assert_eq!(clean_caption("Doe v. Roe (PDF)", ""), "Doe v. Roe");
    }

    #[test]
    fn test_clean_caption_generic_text_is_empty() {
        assert_eq!(clean_caption("PDF", "SC2024-0001"), "");
        assert_eq!(clean_caption("SC2024-0001", "SC2024-0001"), "");
    }
}
