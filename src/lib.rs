//! crestmirror: mirror a club crest collection and catalog it
//!
//! The crawl walks the site below one root segment (country -> division ->
//! crest pages), downloads every PNG (and optionally ZIP pack) into the same
//! folder layout on disk, and the catalog step turns that tree into a flat
//! JSON index.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod crawl;
pub mod download;
pub mod error;
pub mod parse;
pub mod progress;

pub use config::Config;
pub use error::{Error, Result};
