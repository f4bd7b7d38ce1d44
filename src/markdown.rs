//! Markup to HTML conversion. The [`MarkupRenderer`] trait is the seam;
//! [`CommonMark`] is the implementation used for real builds. Whatever the
//! renderer, [`rewrite_code_blocks`] runs over its output.

use lazy_static::lazy_static;
use pulldown_cmark::{html, Options, Parser};
use regex::{Captures, Regex};

/// Converts a markup body into an HTML fragment.
pub trait MarkupRenderer {
    fn render(&self, markup: &str) -> String;
}

/// Renders CommonMark with `pulldown_cmark`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommonMark;

impl MarkupRenderer for CommonMark {
    fn render(&self, markup: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut out = String::with_capacity(markup.len() * 2);
        html::push_html(&mut out, Parser::new_ext(markup, options));
        out
    }
}

lazy_static! {
    static ref CODE_BLOCK: Regex =
        Regex::new(r"(?s)<pre><code>(?:#!(?P<lang>\w+)\n)?(?P<code>.*?)</code></pre>").unwrap();
}

/// Rewrites literal code blocks (`<pre><code>` without a class). A leading
/// `#!lang` line is removed from the code and becomes the class of the
/// `<code>` element. Blocks without that line are still marked as literal
/// blocks but get no class. Blocks that already carry a class are left
/// alone, which also makes the rewrite idempotent.
pub fn rewrite_code_blocks(html: &str) -> String {
    CODE_BLOCK
        .replace_all(html, |caps: &Captures| {
            let code = &caps["code"];
            match caps.name("lang") {
                Some(lang) => format!(
                    r#"<pre class="literal-block"><code class="{}">{}</code></pre>"#,
                    lang.as_str(),
                    code
                ),
                None => format!(r#"<pre class="literal-block"><code>{}</code></pre>"#, code),
            }
        })
        .into_owned()
}
