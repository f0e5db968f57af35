//! RSS 2.0 rendering.

use chrono::{DateTime, Utc};
use std::fmt::{self, Write as _};

use super::{entry_body, entry_id, entry_title, escape, published_at, FeedMeta, RSS_FILE};
use crate::record::OpinionRecord;

pub(super) fn render(
    records: &[&OpinionRecord],
    meta: &FeedMeta,
    now: DateTime<Utc>,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">"#
    )?;
    writeln!(out, "  <channel>")?;
    writeln!(out, "    <title>{}</title>", escape(&meta.title))?;
    writeln!(out, "    <link>{}</link>", escape(&meta.link))?;
    writeln!(out, "    <description>{}</description>", escape(&meta.description))?;
    if let Some(self_url) = meta.public_url(RSS_FILE) {
        writeln!(
            out,
            r#"    <atom:link href="{}" rel="self" type="application/rss+xml"/>"#,
            escape(&self_url)
        )?;
    }
    writeln!(out, "    <language>{}</language>", escape(&meta.language))?;
    writeln!(out, "    <lastBuildDate>{}</lastBuildDate>", now.to_rfc2822())?;
    writeln!(out, "    <generator>{}</generator>", escape(&meta.generator))?;

    for record in records {
        item(&mut out, record)?;
    }

    writeln!(out, "  </channel>")?;
    writeln!(out, "</rss>")?;
    Ok(out)
}

fn item(out: &mut String, record: &OpinionRecord) -> fmt::Result {
    writeln!(out, "    <item>")?;
    writeln!(out, "      <title>{}</title>", escape(&entry_title(record)))?;
    writeln!(out, "      <link>{}</link>", escape(&record.document_url))?;
    writeln!(
        out,
        "      <description>{}</description>",
        escape(&entry_body(record)?)
    )?;
    writeln!(out, "      <author>{}</author>", escape(record.court_name()))?;
    writeln!(out, "      <category>{}</category>", escape(record.court_name()))?;
    if let Some(kind) = &record.opinion_type {
        writeln!(out, "      <category>{}</category>", escape(kind))?;
    }
    writeln!(
        out,
        r#"      <guid isPermaLink="false">{}</guid>"#,
        escape(&entry_id(record))
    )?;
    writeln!(
        out,
        "      <pubDate>{}</pubDate>",
        published_at(record.date_filed).to_rfc2822()
    )?;
    writeln!(out, "    </item>")
}
