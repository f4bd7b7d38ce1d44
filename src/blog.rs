//! Defines [`Blog`], which turns a set of parsed [`Content`]s into pages:
//! one page per entry, then the paginated index (most recent first), and
//! optionally the daily and monthly archive pages.
//!
//! Every page is emitted through a [`Renderer`] with a [`Context`] that merges
//! the page-specific values into [`Blog::default_context`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::Datelike;
use gtmpl::Value;
use log::info;

use crate::config::Config;
use crate::content::Content;
use crate::entry::{entry_url, Entry};
use crate::markdown::MarkupRenderer;
use crate::render::{self, Context, Renderer};

pub const ENTRY_TEMPLATE: &str = "blog_entry.html";
pub const INDEX_TEMPLATE: &str = "blog_index.html";
pub const DAILY_TEMPLATE: &str = "blog_daily.html";
pub const MONTHLY_TEMPLATE: &str = "blog_monthly.html";

/// The ordered set of all [`Content`]s for one build.
pub struct Blog<'a> {
    contents: Vec<Content>,
    renderer: &'a dyn Renderer,
    config: &'a Config,
}

impl<'a> Blog<'a> {
    pub fn new(contents: Vec<Content>, renderer: &'a dyn Renderer, config: &'a Config) -> Blog<'a> {
        Blog {
            contents,
            renderer,
            config,
        }
    }

    /// The names of the templates a build with `config` will use.
    pub fn templates(config: &Config) -> Vec<&'static str> {
        match config.archive {
            false => vec![ENTRY_TEMPLATE, INDEX_TEMPLATE],
            true => vec![ENTRY_TEMPLATE, INDEX_TEMPLATE, DAILY_TEMPLATE, MONTHLY_TEMPLATE],
        }
    }

    /// The contents, in date order once [`Blog::write`] has run.
    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    /// The values every page receives.
    pub fn default_context(&self) -> Context {
        let mut context = Context::new();
        context.insert(
            "analytics_id".to_owned(),
            match &self.config.analytics_id {
                Some(id) => Value::String(id.clone()),
                None => Value::Nil,
            },
        );
        context
    }

    fn context(&self, extra: Context) -> Context {
        let mut context = self.default_context();
        context.extend(extra);
        context
    }

    /// Renders every body, sorts by date, and writes all pages. Output paths
    /// are checked for collisions before the first page is written.
    pub fn write(&mut self, markup: &dyn MarkupRenderer) -> Result<()> {
        for content in self.contents.iter_mut() {
            content.render(markup);
        }
        self.contents.sort_by_key(|c| c.date());
        check_collisions(&self.contents)?;

        self.write_entries()?;
        if self.config.archive {
            self.write_archives()?;
        }
        self.write_index()?;

        info!(
            "wrote {} entries across {} index pages",
            self.contents.len(),
            paginate(self.contents.len(), self.config.page_size).len()
        );
        Ok(())
    }

    fn write_entries(&self) -> Result<()> {
        for content in &self.contents {
            let entry = Entry::new(content);
            let mut context = Context::new();
            context.insert("entry".to_owned(), Value::from(&entry));
            context.insert("title".to_owned(), Value::String(entry.title.clone()));
            self.renderer
                .write(&entry.url, self.context(context), ENTRY_TEMPLATE)?;
        }
        Ok(())
    }

    fn write_index(&self) -> Result<()> {
        let newest_first: Vec<&Content> = self.contents.iter().rev().collect();
        for page in paginate(newest_first.len(), self.config.page_size) {
            let mut context = Context::new();
            context.insert(
                "entries".to_owned(),
                entries_value(&newest_first[page.start..page.end]),
            );
            context.insert("prev".to_owned(), link_value(page.prev));
            context.insert("next".to_owned(), link_value(page.next));
            self.renderer
                .write(&page.path, self.context(context), INDEX_TEMPLATE)?;
        }
        Ok(())
    }

    /// Writes a page per day (`YYYY/MM/DD/`) listing that day's entries and
    /// a page per month (`YYYY/MM/`) listing its days.
    fn write_archives(&self) -> Result<()> {
        let mut tree: BTreeMap<(i32, u32), BTreeMap<u32, Vec<&Content>>> = BTreeMap::new();
        for content in &self.contents {
            let date = content.date();
            tree.entry((date.year(), date.month()))
                .or_default()
                .entry(date.day())
                .or_default()
                .push(content);
        }

        for ((year, month), days) in &tree {
            let mut day_values = Vec::with_capacity(days.len());
            for (day, contents) in days {
                let mut context = Context::new();
                context.insert(
                    "date".to_owned(),
                    Value::String(format!("{:04}-{:02}-{:02}", year, month, day)),
                );
                context.insert("entries".to_owned(), entries_value(contents));
                day_values.push(Value::Object(context.clone()));

                self.renderer.write(
                    &format!("{:04}/{:02}/{:02}/", year, month, day),
                    self.context(context),
                    DAILY_TEMPLATE,
                )?;
            }

            let mut context = Context::new();
            context.insert(
                "date".to_owned(),
                Value::String(format!("{:04}-{:02}", year, month)),
            );
            context.insert("days".to_owned(), Value::Array(day_values));
            self.renderer.write(
                &format!("{:04}/{:02}/", year, month),
                self.context(context),
                MONTHLY_TEMPLATE,
            )?;
        }
        Ok(())
    }
}

fn entries_value(contents: &[&Content]) -> Value {
    Value::Array(
        contents
            .iter()
            .map(|c| Value::from(&Entry::new(c)))
            .collect(),
    )
}

fn link_value(link: Option<String>) -> Value {
    match link {
        Some(link) => Value::String(link),
        None => Value::Nil,
    }
}

fn check_collisions(contents: &[Content]) -> Result<()> {
    let mut seen = HashSet::with_capacity(contents.len());
    for content in contents {
        let url = entry_url(&content.date(), content.permalink());
        if !seen.insert(url.clone()) {
            return Err(Error::DuplicateUrl(url));
        }
    }
    Ok(())
}

/// One page of the index: the slice `start..end` of the newest-first
/// entries, its file name, and the file names of its neighbours.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexPage {
    pub path: String,
    pub start: usize,
    pub end: usize,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// The file name of the zero-based index page `page`: `index.html`, then
/// `index2.html`, `index3.html`, ...
pub fn index_path(page: usize) -> String {
    match page {
        0 => String::from("index.html"),
        _ => format!("index{}.html", page + 1),
    }
}

/// Splits `total` entries into pages of `page_size`. There is always at
/// least one page, even when `total` is zero.
pub fn paginate(total: usize, page_size: usize) -> Vec<IndexPage> {
    let page_size = page_size.max(1);
    let pages = match total % page_size {
        0 => total / page_size,
        _ => total / page_size + 1,
    }
    .max(1);

    (0..pages)
        .map(|i| IndexPage {
            path: index_path(i),
            start: (i * page_size).min(total),
            end: ((i + 1) * page_size).min(total),
            prev: match i {
                0 => None,
                _ => Some(index_path(i - 1)),
            },
            next: match i + 1 < pages {
                false => None,
                true => Some(index_path(i + 1)),
            },
        })
        .collect()
}

/// The result of a fallible [`Blog::write`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing the blog's pages.
#[derive(Debug)]
pub enum Error {
    /// Returned when the renderer fails to produce a page.
    Render(render::Error),

    /// Returned when two entries share a date and permalink.
    DuplicateUrl(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Render(err) => err.fmt(f),
            Error::DuplicateUrl(url) => {
                write!(f, "more than one entry resolves to `{}`", url)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Render(err) => Some(err),
            Error::DuplicateUrl(_) => None,
        }
    }
}

impl From<render::Error> for Error {
    /// Converts a [`render::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator on [`Renderer::write`].
    fn from(err: render::Error) -> Error {
        Error::Render(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::markdown::CommonMark;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::path::Path;

    #[derive(Default)]
    struct Recorder {
        pages: RefCell<Vec<(String, Context, String)>>,
    }

    impl Renderer for Recorder {
        fn write(&self, target: &str, context: Context, template: &str) -> render::Result<()> {
            self.pages
                .borrow_mut()
                .push((target.to_owned(), context, template.to_owned()));
            Ok(())
        }
    }

    impl Recorder {
        fn with_template(&self, template: &str) -> Vec<(String, Context)> {
            self.pages
                .borrow()
                .iter()
                .filter(|(_, _, t)| t == template)
                .map(|(target, context, _)| (target.clone(), context.clone()))
                .collect()
        }
    }

    fn string(value: Option<&Value>) -> Option<String> {
        match value {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn titles(context: &Context, key: &str) -> Vec<String> {
        match context.get(key) {
            Some(Value::Array(entries)) => entries
                .iter()
                .map(|e| match e {
                    Value::Object(m) => string(m.get("title")).unwrap_or_default(),
                    _ => String::new(),
                })
                .collect(),
            _ => panic!("`{}` is not an array", key),
        }
    }

    fn content(title: &str, permalink: &str, date: &str) -> Content {
        Content::parse(&format!(
            "---\ntitle: {}\npermalink: {}\ndate: {}\n---\nBody of *{}*\n",
            title, permalink, date, title
        ))
        .unwrap()
    }

    /// `count` contents spread over three days, numbered in date order and
    /// supplied in reverse.
    fn contents(count: usize) -> Vec<Content> {
        (1..=count)
            .rev()
            .map(|i| {
                content(
                    &format!("post-{}", i),
                    &format!("p{}", i),
                    &format!("2020-03-{:02} 00:{:02}:00", 1 + (i - 1) / 8, i),
                )
            })
            .collect()
    }

    fn config() -> Config {
        let mut config = Config::with_defaults(Path::new("."));
        config.analytics_id = Some("UA-42".to_owned());
        config
    }

    #[test]
    fn test_paginate() {
        assert_eq!(
            vec![
                IndexPage {
                    path: "index.html".to_owned(),
                    start: 0,
                    end: 10,
                    prev: None,
                    next: Some("index2.html".to_owned()),
                },
                IndexPage {
                    path: "index2.html".to_owned(),
                    start: 10,
                    end: 20,
                    prev: Some("index.html".to_owned()),
                    next: Some("index3.html".to_owned()),
                },
                IndexPage {
                    path: "index3.html".to_owned(),
                    start: 20,
                    end: 23,
                    prev: Some("index2.html".to_owned()),
                    next: None,
                },
            ],
            paginate(23, 10)
        );
    }

    #[test]
    fn test_paginate_page_counts() {
        for (total, pages) in [(0, 1), (1, 1), (10, 1), (11, 2), (20, 2), (21, 3)].iter() {
            let got = paginate(*total, 10);
            assert_eq!(*pages, got.len(), "total = {}", total);
            assert_eq!(None, got[0].prev);
            assert_eq!(None, got[got.len() - 1].next);
            // every entry lands on exactly one page
            let covered: usize = got.iter().map(|p| p.end - p.start).sum();
            assert_eq!(*total, covered);
        }
    }

    #[test]
    fn test_paginate_empty() {
        assert_eq!(
            vec![IndexPage {
                path: "index.html".to_owned(),
                start: 0,
                end: 0,
                prev: None,
                next: None,
            }],
            paginate(0, 10)
        );
    }

    #[test]
    fn test_index_path() {
        assert_eq!("index.html", index_path(0));
        assert_eq!("index2.html", index_path(1));
        assert_eq!("index10.html", index_path(9));
    }

    #[test]
    fn test_write_23_entries() -> Result<()> {
        let recorder = Recorder::default();
        let config = config();
        let mut blog = Blog::new(contents(23), &recorder, &config);
        blog.write(&CommonMark)?;

        let entries = recorder.with_template(ENTRY_TEMPLATE);
        assert_eq!(23, entries.len());
        assert_eq!("/2020/03/01/p1/", entries[0].0);
        assert_eq!("/2020/03/03/p23/", entries[22].0);
        assert_eq!(Some("post-1".to_owned()), string(entries[0].1.get("title")));

        let index = recorder.with_template(INDEX_TEMPLATE);
        let paths: Vec<&str> = index.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(vec!["index.html", "index2.html", "index3.html"], paths);

        let expected = |range: std::ops::RangeInclusive<usize>| -> Vec<String> {
            range.rev().map(|i| format!("post-{}", i)).collect()
        };
        assert_eq!(expected(14..=23), titles(&index[0].1, "entries"));
        assert_eq!(expected(4..=13), titles(&index[1].1, "entries"));
        assert_eq!(expected(1..=3), titles(&index[2].1, "entries"));

        assert_eq!(None, string(index[0].1.get("prev")));
        assert_eq!(Some("index2.html".to_owned()), string(index[0].1.get("next")));
        assert_eq!(Some("index.html".to_owned()), string(index[1].1.get("prev")));
        assert_eq!(Some("index3.html".to_owned()), string(index[1].1.get("next")));
        assert_eq!(Some("index2.html".to_owned()), string(index[2].1.get("prev")));
        assert_eq!(None, string(index[2].1.get("next")));

        // archive pages are off by default
        assert!(recorder.with_template(DAILY_TEMPLATE).is_empty());
        Ok(())
    }

    #[test]
    fn test_default_context_on_every_page() -> Result<()> {
        let recorder = Recorder::default();
        let config = config();
        Blog::new(contents(3), &recorder, &config).write(&CommonMark)?;
        for (target, context, _) in recorder.pages.borrow().iter() {
            assert_eq!(
                Some("UA-42".to_owned()),
                string(context.get("analytics_id")),
                "page {}",
                target
            );
        }
        Ok(())
    }

    #[test]
    fn test_entry_context_is_rendered() -> Result<()> {
        let recorder = Recorder::default();
        let config = config();
        Blog::new(vec![content("One", "one", "2020-01-01 00:00:00")], &recorder, &config)
            .write(&CommonMark)?;
        let entries = recorder.with_template(ENTRY_TEMPLATE);
        match entries[0].1.get("entry") {
            Some(Value::Object(entry)) => assert_eq!(
                Some("<p>Body of <em>One</em></p>\n".to_owned()),
                string(entry.get("content"))
            ),
            _ => panic!("missing entry"),
        }
        Ok(())
    }

    #[test]
    fn test_empty_blog() -> Result<()> {
        let recorder = Recorder::default();
        let config = config();
        Blog::new(Vec::new(), &recorder, &config).write(&CommonMark)?;
        let index = recorder.with_template(INDEX_TEMPLATE);
        assert_eq!(1, index.len());
        assert_eq!("index.html", index[0].0);
        assert!(titles(&index[0].1, "entries").is_empty());
        assert_eq!(None, string(index[0].1.get("next")));
        Ok(())
    }

    #[test]
    fn test_sort_is_stable() -> Result<()> {
        let recorder = Recorder::default();
        let config = config();
        let mut blog = Blog::new(
            vec![
                content("b", "b", "2020-01-02 00:00:00"),
                content("a1", "a1", "2020-01-01 00:00:00"),
                content("a2", "a2", "2020-01-01 00:00:00"),
            ],
            &recorder,
            &config,
        );
        blog.write(&CommonMark)?;
        let order: Vec<&str> = blog.contents().iter().map(|c| c.title()).collect();
        assert_eq!(vec!["a1", "a2", "b"], order);
        Ok(())
    }

    #[test]
    fn test_duplicate_url_writes_nothing() {
        let recorder = Recorder::default();
        let config = config();
        let result = Blog::new(
            vec![
                content("first", "same", "2020-01-01 08:00:00"),
                content("second", "same", "2020-01-01 20:00:00"),
            ],
            &recorder,
            &config,
        )
        .write(&CommonMark);
        match result {
            Err(Error::DuplicateUrl(url)) => assert_eq!("/2020/01/01/same/", url),
            _ => panic!("expected DuplicateUrl"),
        }
        assert!(recorder.pages.borrow().is_empty());
    }

    #[test]
    fn test_archives() -> Result<()> {
        let recorder = Recorder::default();
        let mut config = config();
        config.archive = true;
        Blog::new(
            vec![
                content("c", "c", "2020-02-01 00:00:00"),
                content("a", "a", "2020-01-05 00:00:00"),
                content("b", "b", "2020-01-05 01:00:00"),
            ],
            &recorder,
            &config,
        )
        .write(&CommonMark)?;

        let daily = recorder.with_template(DAILY_TEMPLATE);
        let paths: Vec<&str> = daily.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(vec!["2020/01/05/", "2020/02/01/"], paths);
        assert_eq!(vec!["a", "b"], titles(&daily[0].1, "entries"));

        let monthly = recorder.with_template(MONTHLY_TEMPLATE);
        let paths: Vec<&str> = monthly.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(vec!["2020/01/", "2020/02/"], paths);
        assert_eq!(Some("2020-01".to_owned()), string(monthly[0].1.get("date")));
        match monthly[0].1.get("days") {
            Some(Value::Array(days)) => assert_eq!(1, days.len()),
            _ => panic!("missing days"),
        }
        Ok(())
    }

    #[test]
    fn test_templates() {
        let mut config = config();
        assert_eq!(vec![ENTRY_TEMPLATE, INDEX_TEMPLATE], Blog::templates(&config));
        config.archive = true;
        assert_eq!(4, Blog::templates(&config).len());
    }
}
