//! The library code for the `ngemeng` static blog generator. A build has two
//! distinct steps:
//!
//! 1. Parsing source documents from disk into [`content::Content`]s
//! 2. Converting the contents into output pages ([`blog`])
//!
//! The second step renders each document's markdown once
//! ([`markdown`]), orders the documents by date, and emits one page per
//! [`entry::Entry`] followed by the paginated index, most recent entries
//! first. An index page holds `page_size` entries; the first is written to
//! `index.html` and the following ones to `index2.html`, `index3.html`, and
//! so on. Daily and monthly archive pages can be switched on in the project
//! file ([`config`]).
//!
//! Every page goes through a [`render::Renderer`], which applies a named
//! template to a context and stores the result.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod blog;
pub mod build;
pub mod config;
pub mod content;
pub mod entry;
pub mod markdown;
pub mod render;
pub mod tag;
