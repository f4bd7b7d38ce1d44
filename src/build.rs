//! Exports the [`build_site`] function which stitches together the high-level
//! steps of a build: parsing every source document ([`crate::content`]),
//! loading the templates ([`crate::render`]), and writing the entry and index
//! pages ([`crate::blog`]). All documents are parsed before the first page is
//! written, so a bad document leaves the output directory untouched.

use crate::blog::{Blog, Error as WriteError};
use crate::config::{Config, Error as ConfigError};
use crate::content::{Content, Error as ParseError};
use crate::markdown::CommonMark;
use crate::render::{Error as RenderError, Printer};
use log::info;
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use walkdir::WalkDir;

/// The extension of source documents.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Builds the site described by `config`.
pub fn build_site(config: &Config) -> Result<()> {
    let contents = load_contents(&config.posts_directory)?;
    info!(
        "parsed {} documents from `{}`",
        contents.len(),
        config.posts_directory.display()
    );

    let printer = Printer::new(
        &config.templates_directory,
        &config.output_directory,
        &Blog::templates(config)[..],
    )?;
    Blog::new(contents, &printer, config).write(&CommonMark)?;
    Ok(())
}

/// Walks `dir` and parses every `.md` file beneath it, in file-name order.
/// The first document that fails to parse aborts the walk.
pub fn load_contents(dir: &Path) -> Result<Vec<Content>> {
    let mut contents = Vec::new();
    for result in WalkDir::new(dir).sort_by(|a, b| a.file_name().cmp(b.file_name())) {
        let entry = result?;
        if entry.file_type().is_file()
            && entry.path().extension() == Some(OsStr::new(MARKDOWN_EXTENSION))
        {
            contents.push(Content::read(entry.path())?);
        }
    }
    Ok(contents)
}

/// The result of a build step.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can come from loading the
/// configuration, parsing documents, loading templates, or writing pages.
#[derive(Debug)]
pub enum Error {
    /// Returned for problems loading the project file.
    Config(ConfigError),

    /// Returned for errors parsing a source document.
    Parse(ParseError),

    /// Returned for errors loading templates.
    Template(RenderError),

    /// Returned for errors writing pages.
    Write(WriteError),

    /// Returned for errors walking the posts directory.
    WalkDir(walkdir::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(err) => err.fmt(f),
            Error::Parse(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(err),
            Error::Parse(err) => Some(err),
            Error::Template(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::WalkDir(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    /// Converts [`ConfigError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ConfigError) -> Error {
        Error::Config(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<RenderError> for Error {
    /// Converts [`RenderError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: RenderError) -> Error {
        Error::Template(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
