//! Defines [`Entry`], the publish-ready view of a [`Content`], and the
//! derivations of its URL and identifier.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDateTime};
use gtmpl::Value;
use sha1::{Digest, Sha1};

use crate::content::{Content, DATE_FORMAT};
use crate::tag::{parse_tags, Tag};

/// A page model derived from a rendered [`Content`]. Entries are cheap to
/// rebuild and are never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// The rendered HTML body. Empty if the content was never rendered.
    pub rendered_body: String,
    pub date: NaiveDateTime,
    pub title: String,
    pub tags: Vec<Tag>,

    /// `/YYYY/MM/DD/{permalink}/`
    pub url: String,

    /// Hex SHA-1 of `YYYY-MM-DD-{permalink}`. Stable across rebuilds.
    pub id: String,
}

impl Entry {
    pub fn new(content: &Content) -> Entry {
        Entry {
            rendered_body: content.rendered().unwrap_or_default().to_owned(),
            date: content.date(),
            title: content.title().to_owned(),
            tags: parse_tags(content.meta("tags")),
            url: entry_url(&content.date(), content.permalink()),
            id: entry_id(&content.date(), content.permalink()),
        }
    }
}

pub fn entry_url(date: &NaiveDateTime, permalink: &str) -> String {
    format!(
        "/{:04}/{:02}/{:02}/{}/",
        date.year(),
        date.month(),
        date.day(),
        permalink
    )
}

pub fn entry_id(date: &NaiveDateTime, permalink: &str) -> String {
    let key = format!(
        "{:04}-{:02}-{:02}-{}",
        date.year(),
        date.month(),
        date.day(),
        permalink
    );
    hex::encode(Sha1::digest(key.as_bytes()))
}

impl From<&Entry> for Value {
    /// Converts an [`Entry`] into a [`Value`] for templating. The body is
    /// exposed as `content`.
    fn from(e: &Entry) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("id".to_owned(), Value::String(e.id.clone()));
        m.insert("url".to_owned(), Value::String(e.url.clone()));
        m.insert("title".to_owned(), Value::String(e.title.clone()));
        m.insert(
            "date".to_owned(),
            Value::String(e.date.format(DATE_FORMAT).to_string()),
        );
        m.insert("content".to_owned(), Value::String(e.rendered_body.clone()));
        m.insert(
            "tags".to_owned(),
            Value::Array(e.tags.iter().map(Value::from).collect()),
        );
        Value::Object(m)
    }
}
