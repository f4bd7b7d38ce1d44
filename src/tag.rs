//! Defines the [`Tag`] type, which represents an [`crate::entry::Entry`] tag.

use gtmpl::Value;
use serde_yaml::Value as Yaml;
use std::collections::HashMap;

/// Represents an [`crate::entry::Entry`] tag. Tags are derived from the
/// `tags` metadata of a [`crate::content::Content`] and are never indexed
/// back to their entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    /// The tag's name, trimmed of surrounding whitespace.
    pub name: String,

    /// The site-relative URL for the tag's listing, `/tags/{name}/`.
    pub url: String,
}

impl Tag {
    pub fn new(name: &str) -> Tag {
        let name = name.trim();
        Tag {
            name: name.to_owned(),
            url: format!("/tags/{}/", name),
        }
    }
}

/// Derives the tag list from the value of a `tags` metadata key. A string is
/// split on commas; pieces that are empty after trimming still become tags.
/// A sequence yields one tag per element. An absent or null value yields no
/// tags.
pub fn parse_tags(value: Option<&Yaml>) -> Vec<Tag> {
    match value {
        None | Some(Yaml::Null) => Vec::new(),
        Some(Yaml::String(s)) => s.split(',').map(Tag::new).collect(),
        Some(Yaml::Sequence(items)) => items.iter().map(|item| Tag::new(&scalar(item))).collect(),
        Some(other) => vec![Tag::new(&scalar(other))],
    }
}

fn scalar(value: &Yaml) -> String {
    match value {
        Yaml::String(s) => s.clone(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

impl From<&Tag> for Value {
    /// Converts [`Tag`]s into [`Value`]s for templating.
    fn from(t: &Tag) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("tag".to_owned(), Value::String(t.name.clone()));
        m.insert("url".to_owned(), Value::String(t.url.clone()));
        Value::Object(m)
    }
}
