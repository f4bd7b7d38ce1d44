//! Defines the [`Content`] and [`Error`] types, and the logic for parsing a
//! source document into a [`Content`]. A source document is a YAML metadata
//! block fenced by `---` lines followed by a markdown body:
//!
//! ```md
//! ---
//! title: Hello, world!
//! permalink: hello-world
//! date: 2021-04-16 08:30:00
//! tags: greet, meta
//! ---
//! # Hello
//!
//! World
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::markdown::{rewrite_code_blocks, MarkupRenderer};

const TITLE: &str = "title";
const PERMALINK: &str = "permalink";
const DATE: &str = "date";

/// The format tried first for string dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

lazy_static! {
    static ref DOCUMENT: Regex = Regex::new(
        r"(?s)\A\s*---[ \t]*\r?\n(?:(?P<meta>.*?)\r?\n)?---[ \t]*(?:\r?\n(?P<body>.*))?\z"
    )
    .unwrap();
}

/// A parsed source document. The metadata is kept verbatim in `meta`; the
/// required fields are additionally decoded into typed fields. The only
/// mutable state is the rendered body, which [`Content::render`] fills in
/// once.
#[derive(Clone, Debug)]
pub struct Content {
    body: String,
    title: String,
    permalink: String,
    date: NaiveDateTime,
    meta: Mapping,
    rendered: Option<String>,
}

impl Content {
    /// Reads and parses the document at `path`. Errors are annotated with
    /// the path so the offending file can be identified.
    pub fn read(path: &Path) -> Result<Content> {
        let parse = || -> Result<Content> {
            let input = std::fs::read_to_string(path)?;
            Content::parse(&input)
        };
        match parse() {
            Ok(content) => {
                debug!("parsed `{}` ({})", path.display(), content.permalink);
                Ok(content)
            }
            Err(e) => Err(Error::Annotated(path.to_owned(), Box::new(e))),
        }
    }

    /// Parses a document from its raw text.
    pub fn parse(input: &str) -> Result<Content> {
        let captures = DOCUMENT.captures(input).ok_or(Error::MalformedDocument)?;
        let meta = captures.name("meta").map_or("", |m| m.as_str());
        let body = captures.name("body").map_or("", |m| m.as_str());

        let meta: Mapping = match meta.trim().is_empty() {
            true => Mapping::new(),
            false => serde_yaml::from_str(meta)?,
        };

        let title = scalar_string(TITLE, required(&meta, TITLE)?)?;
        let permalink = check_permalink(scalar_string(PERMALINK, required(&meta, PERMALINK)?)?)?;
        let date = match required(&meta, DATE)? {
            Value::String(s) => parse_date(s)?,
            Value::Number(n) => return Err(Error::InvalidDate(n.to_string())),
            other => return Err(Error::InvalidDate(format!("{:?}", other))),
        };

        Ok(Content {
            body: body.to_owned(),
            title,
            permalink,
            date,
            meta,
            rendered: None,
        })
    }

    /// Converts the body to HTML with `renderer` and caches the result.
    /// Only the first call does any work.
    pub fn render(&mut self, renderer: &dyn MarkupRenderer) {
        if self.rendered.is_none() {
            self.rendered = Some(rewrite_code_blocks(&renderer.render(&self.body)));
        }
    }

    /// The rendered body, if [`Content::render`] has run.
    pub fn rendered(&self) -> Option<&str> {
        self.rendered.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn permalink(&self) -> &str {
        &self.permalink
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    /// Looks up a metadata key. Unknown keys yield `None`.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(&Value::String(key.to_owned()))
    }
}

fn required<'a>(meta: &'a Mapping, field: &'static str) -> Result<&'a Value> {
    match meta.get(&Value::String(field.to_owned())) {
        None | Some(Value::Null) => Err(Error::MissingRequiredField(field)),
        Some(value) => Ok(value),
    }
}

fn scalar_string(field: &'static str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::InvalidField {
            field,
            value: format!("{:?}", other),
        }),
    }
}

/// A permalink becomes a single path segment of the entry URL, so it must be
/// non-empty and free of separators and `..`.
fn check_permalink(permalink: String) -> Result<String> {
    if permalink.trim().is_empty()
        || permalink.contains('/')
        || permalink.contains('\\')
        || permalink.contains("..")
    {
        return Err(Error::InvalidField {
            field: PERMALINK,
            value: format!("{:?}", permalink),
        });
    }
    Ok(permalink)
}

/// RFC 2822 layouts without a zone, tried after the strict parser.
const MESSAGE_DATE_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%d %b %Y %H:%M",
];

/// Parses a date string. Tries, in order: [`DATE_FORMAT`], the ISO 8601
/// timestamp forms YAML allows (with or without an offset, or a bare date
/// meaning midnight), then RFC 2822, with or without a zone. Offsets are
/// discarded and the wall-clock fields kept.
pub fn parse_date(input: &str) -> Result<NaiveDateTime> {
    let s = input.trim();
    NaiveDateTime::parse_from_str(s, DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.naive_local()))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| DateTime::parse_from_rfc2822(s).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            MESSAGE_DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        })
        .ok_or_else(|| Error::InvalidDate(input.to_owned()))
}

/// Represents the result of a [`Content`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Content`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the document lacks the pair of `---` lines fencing the
    /// metadata block.
    MalformedDocument,

    /// Returned when the metadata block isn't a valid YAML mapping.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when `title`, `permalink` or `date` is absent.
    MissingRequiredField(&'static str),

    /// Returned when a required field holds a sequence or mapping, or when
    /// `permalink` isn't a single URL path segment.
    InvalidField { field: &'static str, value: String },

    /// Returned when `date` matches none of the accepted formats.
    InvalidDate(String),

    /// Returned for I/O errors reading a source file.
    Io(std::io::Error),

    /// An error with the path of the file it came from.
    Annotated(PathBuf, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MalformedDocument => {
                write!(f, "document must start with a `---` fenced metadata block")
            }
            Error::DeserializeYaml(err) => write!(f, "decoding metadata: {}", err),
            Error::MissingRequiredField(field) => {
                write!(f, "missing required field `{}`", field)
            }
            Error::InvalidField { field, value } => {
                write!(f, "invalid value for `{}`: {}", field, value)
            }
            Error::InvalidDate(value) => write!(f, "invalid date: {}", value),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(path, err) => {
                write!(f, "parsing `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DeserializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
