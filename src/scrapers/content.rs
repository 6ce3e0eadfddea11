//! Article body extraction.
//!
//! The body is the text of the `<p>` elements inside the page's first
//! `<article>` element, one paragraph per line. Pages without an `<article>`
//! fall back to every `<p>` on the page.

use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};

use crate::error::FetchError;
use crate::http::PageFetcher;

static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Fetch an article page and extract its body text.
///
/// `Ok(None)` means the page was retrieved but held no text; the caller skips
/// the article rather than treating it as an error.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_content<F: PageFetcher>(fetcher: &F, url: &str) -> Result<Option<String>, FetchError> {
    let html = fetcher.fetch(url).await?;
    let content = extract_body(&html);
    if let Some(text) = &content {
        info!(bytes = text.len(), "Parsed article body");
    }
    Ok(content)
}

/// Extract the body text from article markup, or `None` if it is blank.
pub fn extract_body(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let content = match document.select(&ARTICLE_SELECTOR).next() {
        Some(article) => article
            .select(&PARAGRAPH_SELECTOR)
            .map(|p| p.text().collect::<String>())
            .join("\n"),
        None => {
            debug!("No <article> element; using every paragraph on the page");
            document
                .select(&PARAGRAPH_SELECTOR)
                .map(|p| p.text().collect::<String>())
                .join("\n")
        }
    };

    if content.trim().is_empty() {
        None
    } else {
        Some(content)
    }
}
