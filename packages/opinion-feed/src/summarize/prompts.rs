//! Prompts for opinion summaries.

use super::SummaryRequest;

pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are a legal analyst who summarizes Florida appellate court opinions for a general legal audience.

For each opinion, provide a concise summary (3-5 sentences) that covers:
1. The key legal issue(s) in the case
2. The court's holding/decision
3. The practical significance or notable aspects of the ruling

Use clear, professional language. Avoid excessive legalese but don't oversimplify.
If the opinion is a Per Curiam Affirmed (PCA) with no written opinion, note that.
If you cannot determine the substance of the opinion from the text provided, say so briefly."#;

/// Appended to an excerpt that was cut short.
pub const TRUNCATION_MARKER: &str = "\n\n[... remainder truncated for summarization ...]";

/// Build the user prompt for one opinion.
pub fn summary_user_prompt(request: &SummaryRequest) -> String {
    format!(
        r#"Summarize this Florida appellate court opinion:

Court: {court}
Case Number: {case_number}
Case Name: {case_name}
Date: {date}

Opinion Text (excerpt):
{excerpt}"#,
        court = request.court_name,
        case_number = request.case_number,
        case_name = request.case_name,
        date = request.date_filed.format("%B %d, %Y"),
        excerpt = request.excerpt,
    )
}

/// First `max_chars` characters of `text`, marked when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{}", &text[..idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
