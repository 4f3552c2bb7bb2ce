//! Atom feed parsing for the arXiv export API.
//!
//! quick-xml is used because Atom namespaces make regex parsing brittle.
//! Parsing is deliberately lenient: a malformed tail yields the entries
//! read so far rather than an error.

use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::warn;

/// One `<entry>` from the feed, before date filtering.
#[derive(Debug, Clone, Default)]
pub struct FeedEntry {
    /// Canonical abs URL from `<id>`.
    pub id_url: String,
    pub title: String,
    pub summary: String,
    /// Published timestamp truncated to calendar date; `None` when the
    /// timestamp is missing or unparsable.
    pub published: Option<NaiveDate>,
    /// Author names in feed order.
    pub authors: Vec<String>,
    /// Category terms in feed order.
    pub categories: Vec<String>,
    /// Optional `<arxiv:comment>` annotation.
    pub comment: Option<String>,
}

pub fn parse_feed(body: &str) -> Vec<FeedEntry> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut cur = FeedEntry::default();
    let mut in_entry = false;
    let mut in_author = false;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                match local_name(&e) {
                    "entry" => {
                        cur = FeedEntry::default();
                        in_entry = true;
                    }
                    "author" if in_entry => in_author = true,
                    "category" if in_entry => push_category(&mut cur, &e),
                    _ => {}
                }
                text.clear();
            }
            Ok(Event::Empty(e)) => {
                if in_entry && local_name(&e) == "category" {
                    push_category(&mut cur, &e);
                }
            }
            Ok(Event::Text(t)) => {
                if in_entry {
                    text.push_str(&t.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(e)) => {
                if in_entry {
                    let value = text.trim().to_string();
                    match local_name_str(e.name().as_ref()) {
                        "id" => cur.id_url = value,
                        "title" => cur.title = value,
                        "summary" => cur.summary = value,
                        "published" => cur.published = parse_published(&value),
                        "comment" if !value.is_empty() => cur.comment = Some(value),
                        "name" if in_author && !value.is_empty() => cur.authors.push(value),
                        "author" => in_author = false,
                        "entry" => {
                            in_entry = false;
                            entries.push(std::mem::take(&mut cur));
                        }
                        _ => {}
                    }
                }
                text.clear();
            }
            Err(e) => {
                warn!(error = %e, parsed = entries.len(), "malformed feed, keeping entries read so far");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    entries
}

/// Element name without its namespace prefix (`arxiv:comment` -> `comment`).
fn local_name<'a>(e: &'a BytesStart<'_>) -> &'a str {
    local_name_str(e.name().into_inner())
}

fn local_name_str(name: &[u8]) -> &str {
    let name = std::str::from_utf8(name).unwrap_or_default();
    name.rsplit(':').next().unwrap_or(name)
}

fn push_category(entry: &mut FeedEntry, e: &BytesStart<'_>) {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"term" {
            let term = attr.unescape_value().unwrap_or_default().to_string();
            if !term.trim().is_empty() {
                entry.categories.push(term);
            }
        }
    }
}

fn parse_published(value: &str) -> Option<NaiveDate> {
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}
