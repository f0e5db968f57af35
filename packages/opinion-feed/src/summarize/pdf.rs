//! PDF text extraction.

use lopdf::Document;
use tracing::debug;

use super::TextExtractor;
use crate::error::SummaryFailure;
use court_extraction::RawDocument;

/// Default number of pages read from an opinion.
pub const DEFAULT_MAX_PAGES: usize = 30;

/// Extracts text from the first pages of a PDF using `lopdf`.
#[derive(Debug, Clone)]
pub struct PdfTextExtractor {
    max_pages: usize,
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAGES)
    }
}

impl PdfTextExtractor {
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages: max_pages.max(1),
        }
    }

    fn clean_text(text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut prev_was_whitespace = false;

        for c in text.chars() {
            if c.is_whitespace() {
                if !prev_was_whitespace {
                    result.push(if c == '\n' { '\n' } else { ' ' });
                    prev_was_whitespace = true;
                }
            } else {
                result.push(c);
                prev_was_whitespace = false;
            }
        }

        result.trim().to_string()
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, document: &RawDocument) -> Result<String, SummaryFailure> {
        if !document.looks_like_pdf() {
            return Err(SummaryFailure::extract(format!(
                "not a PDF (content type {})",
                document.content_type.as_deref().unwrap_or("unknown")
            )));
        }

        let pdf = Document::load_mem(&document.bytes)
            .map_err(|e| SummaryFailure::extract(format!("unreadable PDF: {e}")))?;

        let pages = pdf.get_pages();
        let parts: Vec<String> = pages
            .keys()
            .take(self.max_pages)
            .filter_map(|page_num| pdf.extract_text(&[*page_num]).ok())
            .map(|text| Self::clean_text(&text))
            .filter(|text| !text.is_empty())
            .collect();

        let text = parts.join("\n\n");
        debug!(
            url = %document.url,
            pages = pages.len(),
            chars = text.len(),
            "PDF text extracted"
        );

        if text.is_empty() {
            return Err(SummaryFailure::extract("PDF contains no extractable text"));
        }
        Ok(text)
    }
}
