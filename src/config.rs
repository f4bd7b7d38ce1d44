//! Project configuration, read from an `ngemeng.yaml` file at the project
//! root. Every key is optional and unknown keys are ignored.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "ngemeng.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

#[derive(Deserialize, Default)]
struct Project {
    #[serde(default)]
    analytics_id: Option<String>,

    #[serde(default)]
    page_size: PageSize,

    #[serde(default)]
    archive: bool,

    posts_directory: Option<PathBuf>,
    templates_directory: Option<PathBuf>,
    output_directory: Option<PathBuf>,
}

/// The resolved configuration for one build. Directory paths have already
/// been joined onto the project root.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The analytics tracking identifier exposed to every template as
    /// `analytics_id`.
    pub analytics_id: Option<String>,

    /// The number of entries per index page.
    pub page_size: usize,

    /// Whether to emit the daily and monthly archive pages.
    pub archive: bool,

    pub posts_directory: PathBuf,
    pub templates_directory: PathBuf,
    pub output_directory: PathBuf,
}

impl Config {
    /// Looks for [`PROJECT_FILE`] in `dir` and then in each of its ancestors,
    /// and loads the first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(Error::NotFound),
            }
        }
    }

    /// Loads the project file at `path`. Relative directories in the file are
    /// resolved against the file's parent directory.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = match contents.trim().is_empty() {
            true => Project::default(),
            false => serde_yaml::from_str(&contents).map_err(|err| Error::Deserialize {
                path: path.to_owned(),
                err,
            })?,
        };
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Config::resolve(project, root))
    }

    /// The configuration used for a project rooted at `root` with no project
    /// file keys set.
    pub fn with_defaults(root: &Path) -> Config {
        Config::resolve(Project::default(), root)
    }

    fn resolve(project: Project, root: &Path) -> Config {
        let dir = |configured: Option<PathBuf>, default: &str| {
            root.join(configured.unwrap_or_else(|| PathBuf::from(default)))
        };
        Config {
            analytics_id: project.analytics_id,
            page_size: project.page_size.0.max(1),
            archive: project.archive,
            posts_directory: dir(project.posts_directory, "_posts"),
            templates_directory: dir(project.templates_directory, "_templates"),
            output_directory: dir(project.output_directory, "_build"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem locating or loading the project file.
#[derive(Debug)]
pub enum Error {
    /// No project file in the directory or any of its ancestors.
    NotFound,

    /// The project file couldn't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// The project file isn't valid YAML or has mistyped keys.
    Deserialize {
        path: PathBuf,
        err: serde_yaml::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::Open { path, err } => {
                write!(f, "Opening project file `{}`: {}", path.display(), err)
            }
            Error::Deserialize { path, err } => {
                write!(f, "Loading configuration `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound => None,
            Error::Open { path: _, err } => Some(err),
            Error::Deserialize { path: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::with_defaults(Path::new("/blog"));
        assert_eq!(None, config.analytics_id);
        assert_eq!(10, config.page_size);
        assert!(!config.archive);
        assert_eq!(PathBuf::from("/blog/_posts"), config.posts_directory);
        assert_eq!(PathBuf::from("/blog/_templates"), config.templates_directory);
        assert_eq!(PathBuf::from("/blog/_build"), config.output_directory);
    }

    #[test]
    fn test_project_file() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_FILE),
            "analytics_id: UA-1234\npage_size: 5\narchive: true\noutput_directory: public\nunknown_key: 1\n",
        )
        .unwrap();

        let nested = dir.path().join("_posts/2020");
        std::fs::create_dir_all(&nested).unwrap();
        let config = Config::from_directory(&nested)?;

        assert_eq!(Some("UA-1234".to_owned()), config.analytics_id);
        assert_eq!(5, config.page_size);
        assert!(config.archive);
        assert_eq!(dir.path().join("public"), config.output_directory);
        assert_eq!(dir.path().join("_posts"), config.posts_directory);
        Ok(())
    }

    #[test]
    fn test_empty_project_file() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_FILE), "").unwrap();
        let config = Config::from_project_file(&dir.path().join(PROJECT_FILE))?;
        assert_eq!(Config::with_defaults(dir.path()), config);
        Ok(())
    }

    #[test]
    fn test_bad_project_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_FILE), "page_size: many\n").unwrap();
        assert!(matches!(
            Config::from_project_file(&dir.path().join(PROJECT_FILE)),
            Err(Error::Deserialize { .. })
        ));
    }
}
