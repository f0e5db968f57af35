//! Atom 1.0 rendering.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::{self, Write as _};

use super::{
    entry_body, entry_id, entry_title, escape, published_at, FeedMeta, ATOM_FILE,
};
use crate::record::OpinionRecord;

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(super) fn render(
    records: &[&OpinionRecord],
    meta: &FeedMeta,
    now: DateTime<Utc>,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="{}">"#,
        escape(&meta.language)
    )?;
    writeln!(out, "  <id>{}</id>", escape(meta.feed_id()))?;
    writeln!(out, "  <title>{}</title>", escape(&meta.title))?;
    writeln!(out, "  <subtitle>{}</subtitle>", escape(&meta.description))?;
    writeln!(out, "  <updated>{}</updated>", timestamp(now))?;
    writeln!(
        out,
        r#"  <link href="{}" rel="alternate"/>"#,
        escape(&meta.link)
    )?;
    if let Some(self_url) = meta.public_url(ATOM_FILE) {
        writeln!(out, r#"  <link href="{}" rel="self"/>"#, escape(&self_url))?;
    }
    writeln!(out, "  <generator>{}</generator>", escape(&meta.generator))?;

    for record in records {
        entry(&mut out, record)?;
    }

    writeln!(out, "</feed>")?;
    Ok(out)
}

fn entry(out: &mut String, record: &OpinionRecord) -> fmt::Result {
    let published = timestamp(published_at(record.date_filed));

    writeln!(out, "  <entry>")?;
    writeln!(
        out,
        "    <id>urn:court-opinion:{}</id>",
        escape(&entry_id(record))
    )?;
    writeln!(out, "    <title>{}</title>", escape(&entry_title(record)))?;
    writeln!(
        out,
        r#"    <link href="{}" rel="alternate"/>"#,
        escape(&record.document_url)
    )?;
    writeln!(out, "    <published>{published}</published>")?;
    writeln!(out, "    <updated>{published}</updated>")?;
    writeln!(
        out,
        "    <author><name>{}</name></author>",
        escape(record.court_name())
    )?;
    writeln!(
        out,
        r#"    <category term="{}"/>"#,
        escape(record.court_name())
    )?;
    if let Some(kind) = &record.opinion_type {
        writeln!(out, r#"    <category term="{}"/>"#, escape(kind))?;
    }
    writeln!(
        out,
        r#"    <content type="html">{}</content>"#,
        escape(&entry_body(record)?)
    )?;
    writeln!(out, "  </entry>")
}
