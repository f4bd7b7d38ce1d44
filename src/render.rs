//! The page-emission seam. [`Renderer`] takes a target path, a [`Context`] and
//! a template name; [`Printer`] is the implementation that applies `gtmpl`
//! templates and writes the results under an output directory.

use gtmpl::{Template, Value};
use log::info;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// The data handed to a template for one page.
pub type Context = HashMap<String, Value>;

/// Produces and persists one HTML document per call.
pub trait Renderer {
    /// Renders `template` with `context` and stores the result at `target`,
    /// a site-relative path. A target ending in `/` (or empty) denotes the
    /// `index.html` inside that directory.
    fn write(&self, target: &str, context: Context, template: &str) -> Result<()>;
}

/// Writes pages to disk. All templates are loaded and parsed up front, so a
/// missing or broken template fails the build before any page is written.
pub struct Printer {
    /// The directory pages are written into.
    output_directory: PathBuf,

    /// Parsed templates keyed by file name.
    templates: HashMap<String, Template>,
}

impl Printer {
    /// Loads the templates named in `names` from `templates_directory`.
    pub fn new<S: AsRef<str>>(
        templates_directory: &Path,
        output_directory: &Path,
        names: &[S],
    ) -> Result<Printer> {
        let mut templates = HashMap::new();
        for name in names {
            let name = name.as_ref();
            templates.insert(
                name.to_owned(),
                parse_template(name, &templates_directory.join(name))?,
            );
        }
        Ok(Printer {
            output_directory: output_directory.to_owned(),
            templates,
        })
    }

    /// Maps a site-relative target onto a file path in the output directory.
    pub fn output_path(&self, target: &str) -> PathBuf {
        let target = target.trim_start_matches('/');
        if target.is_empty() || target.ends_with('/') {
            self.output_directory.join(format!("{}index.html", target))
        } else {
            self.output_directory.join(target)
        }
    }
}

impl Renderer for Printer {
    fn write(&self, target: &str, context: Context, template: &str) -> Result<()> {
        let tmpl = self
            .templates
            .get(template)
            .ok_or_else(|| Error::TemplateNotFound(template.to_owned()))?;

        let path = self.output_path(target);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let context = gtmpl::Context::from(Value::Object(context)).map_err(Error::Render)?;
        tmpl.execute(&mut File::create(&path)?, &context)
            .map_err(Error::Render)?;
        info!(".. {}", path.display());
        Ok(())
    }
}

fn parse_template(name: &str, path: &Path) -> Result<Template> {
    let contents = std::fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => Error::TemplateNotFound(name.to_owned()),
        _ => Error::OpenTemplateFile {
            path: path.to_owned(),
            err,
        },
    })?;

    let mut template = Template::default();
    template
        .parse(&contents)
        .map_err(|err| Error::ParseTemplate {
            name: name.to_owned(),
            err,
        })?;
    Ok(template)
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// No template by that name exists in the templates directory.
    TemplateNotFound(String),

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate { name: String, err: String },

    /// An error while executing a template.
    Render(String),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::TemplateNotFound(name) => write!(f, "template not found: {}", name),
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate { name, err } => {
                write!(f, "Parsing template '{}': {}", name, err)
            }
            Error::Render(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}
