//! Static HTML index, grouped by filing date.

use chrono::{DateTime, Utc};
use std::fmt::{self, Write as _};

use super::{
    caption, display_date, escape, FeedMeta, ATOM_FILE, RSS_FILE, SUMMARY_PLACEHOLDER,
};
use crate::record::OpinionRecord;

const STYLE: &str = r#"        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 900px;
            margin: 0 auto;
            padding: 2rem 1rem;
            background: #fafafa;
            color: #333;
        }
        header { margin-bottom: 2rem; padding-bottom: 1rem; border-bottom: 2px solid #1a365d; }
        h1 { color: #1a365d; font-size: 1.8rem; margin-bottom: 0.5rem; }
        .subtitle { color: #666; font-size: 0.95rem; }
        .feed-links { margin: 1rem 0; padding: 1rem; background: #e8f0fe; border-radius: 8px; }
        .feed-links a { color: #1a365d; margin-right: 1.5rem; text-decoration: none; font-weight: 500; }
        .feed-links a:hover { text-decoration: underline; }
        .opinion {
            background: white;
            border: 1px solid #e2e8f0;
            border-radius: 8px;
            padding: 1.25rem;
            margin-bottom: 1rem;
        }
        .opinion:hover { border-color: #cbd5e0; }
        .court-badge {
            display: inline-block;
            background: #1a365d;
            color: white;
            font-size: 0.75rem;
            padding: 2px 8px;
            border-radius: 4px;
            margin-bottom: 0.5rem;
        }
        .opinion h2 { font-size: 1.1rem; color: #2d3748; margin-bottom: 0.5rem; }
        .opinion h2 a { color: inherit; text-decoration: none; }
        .opinion h2 a:hover { color: #1a365d; }
        .meta { font-size: 0.85rem; color: #718096; margin-bottom: 0.75rem; }
        .summary { font-size: 0.95rem; line-height: 1.6; color: #4a5568; }
        .summary.missing { font-style: italic; color: #a0aec0; }
        .date-group {
            font-size: 1.1rem;
            font-weight: 600;
            color: #1a365d;
            margin: 1.5rem 0 0.75rem;
            padding-bottom: 0.25rem;
            border-bottom: 1px solid #e2e8f0;
        }
        footer {
            margin-top: 2rem;
            padding-top: 1rem;
            border-top: 1px solid #e2e8f0;
            text-align: center;
            color: #a0aec0;
            font-size: 0.85rem;
        }
"#;

pub(super) fn render(
    records: &[&OpinionRecord],
    meta: &FeedMeta,
    now: DateTime<Utc>,
) -> Result<String, fmt::Error> {
    let title = escape(&meta.title);
    let mut out = String::new();

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, r#"<html lang="{}">"#, escape(&meta.language))?;
    writeln!(out, "<head>")?;
    writeln!(out, r#"    <meta charset="UTF-8">"#)?;
    writeln!(
        out,
        r#"    <meta name="viewport" content="width=device-width, initial-scale=1.0">"#
    )?;
    writeln!(out, "    <title>{title}</title>")?;
    writeln!(
        out,
        r#"    <link rel="alternate" type="application/rss+xml" title="{title}" href="{RSS_FILE}">"#
    )?;
    writeln!(
        out,
        r#"    <link rel="alternate" type="application/atom+xml" title="{title}" href="{ATOM_FILE}">"#
    )?;
    write!(out, "    <style>\n{STYLE}    </style>\n")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "    <header>")?;
    writeln!(out, "        <h1>{title}</h1>")?;
    writeln!(
        out,
        r#"        <p class="subtitle">{}</p>"#,
        escape(&meta.description)
    )?;
    writeln!(out, r#"        <div class="feed-links">"#)?;
    writeln!(out, r#"            <a href="{RSS_FILE}">RSS Feed</a>"#)?;
    writeln!(out, r#"            <a href="{ATOM_FILE}">Atom Feed</a>"#)?;
    writeln!(out, "        </div>")?;
    writeln!(out, "    </header>")?;
    writeln!(out, "    <main>")?;

    let mut current_date = None;
    for record in records {
        if current_date != Some(record.date_filed) {
            current_date = Some(record.date_filed);
            writeln!(
                out,
                r#"        <div class="date-group">{}</div>"#,
                display_date(record.date_filed)
            )?;
        }
        opinion(&mut out, record)?;
    }
    if records.is_empty() {
        writeln!(out, r#"        <p class="subtitle">No opinions in the current window.</p>"#)?;
    }

    writeln!(out, "    </main>")?;
    writeln!(out, "    <footer>")?;
    writeln!(
        out,
        "        <p>Updated {} UTC</p>",
        now.format("%B %d, %Y at %I:%M %p")
    )?;
    writeln!(out, "        <p>Built with the {}</p>", escape(&meta.generator))?;
    writeln!(out, "    </footer>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(out)
}

fn opinion(out: &mut String, record: &OpinionRecord) -> fmt::Result {
    writeln!(out, r#"        <div class="opinion">"#)?;
    writeln!(
        out,
        r#"            <span class="court-badge">{}</span>"#,
        escape(record.court_name())
    )?;
    writeln!(
        out,
        "            <h2><a href=\"{}\">{} \u{2014} {}</a></h2>",
        escape(&record.document_url),
        escape(&record.case_number),
        escape(&caption(record))
    )?;

    write!(out, r#"            <div class="meta">"#)?;
    if let Some(kind) = &record.opinion_type {
        write!(out, "Type: {} | ", escape(kind))?;
    }
    if let Some(tribunal) = &record.lower_tribunal {
        write!(out, "From: {} | ", escape(tribunal))?;
    }
    writeln!(
        out,
        "Case No. {} | {}</div>",
        escape(&record.case_number),
        display_date(record.date_filed)
    )?;

    match record.summary.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(summary) => writeln!(
            out,
            r#"            <div class="summary">{}</div>"#,
            escape(summary)
        )?,
        None => writeln!(
            out,
            r#"            <div class="summary missing">{SUMMARY_PLACEHOLDER}</div>"#
        )?,
    }
    writeln!(out, "        </div>")
}
