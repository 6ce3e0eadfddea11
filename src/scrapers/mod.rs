//! Scraping for the listing page and the articles it links to.
//!
//! Scraping happens in two phases:
//!
//! 1. **Indexing** ([`links`]): discover article references on the listing page
//! 2. **Content** ([`content`]): download each article and extract its body
//!
//! Both phases take a [`crate::http::PageFetcher`] so tests can serve markup
//! from memory.

pub mod content;
pub mod links;
