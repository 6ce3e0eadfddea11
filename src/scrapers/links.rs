//! Article discovery on the listing page.
//!
//! Every `<a href>` on the page is a candidate. A candidate becomes an
//! [`ArticleReference`] when:
//! - its href contains `/news/`
//! - its href contains neither `live` nor `av/` (live blogs and audio/video
//!   pages have no article body to extract)
//! - it resolves to an absolute URL
//! - its anchor text is longer than 20 characters (navigation links are short)
//!
//! The title is built from the anchor's text nodes, each trimmed, blank ones
//! dropped, the rest concatenated without a separator. Whitespace inside a
//! node is kept as-is, so titles match the records already in the table.
//!
//! Root-relative hrefs are joined onto the listing page's origin; absolute
//! hrefs are kept verbatim.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::http::PageFetcher;
use crate::models::ArticleReference;

const NEWS_MARKER: &str = "/news/";
const EXCLUDED_MARKERS: [&str; 2] = ["live", "av/"];
const MIN_TITLE_CHARS: usize = 20;

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Fetch the listing page and extract its article references.
///
/// A failure here leaves nothing to process, so the caller treats it as fatal.
#[instrument(level = "info", skip_all, fields(listing_url = %source.listing_url))]
pub async fn index_articles<F: PageFetcher>(
    fetcher: &F,
    source: &SourceConfig,
) -> Result<BTreeSet<ArticleReference>, FetchError> {
    let html = fetcher.fetch(source.listing_url.as_str()).await?;
    let references = extract_links(&html, source);
    info!(count = references.len(), "Indexed article links");
    debug!(urls = ?references.iter().map(|r| r.url.as_str()).collect::<Vec<_>>(), "Article URLs");
    Ok(references)
}

/// Extract the deduplicated set of article references from listing markup.
pub fn extract_links(html: &str, source: &SourceConfig) -> BTreeSet<ArticleReference> {
    let document = Html::parse_document(html);

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            if !is_article_href(href) {
                return None;
            }
            let url = resolve_href(href, source)?;
            let title = element
                .text()
                .map(str::trim)
                .filter(|fragment| !fragment.is_empty())
                .collect::<String>();
            if title.chars().count() <= MIN_TITLE_CHARS {
                return None;
            }
            Some(ArticleReference::new(title, url))
        })
        .collect()
}

fn is_article_href(href: &str) -> bool {
    href.contains(NEWS_MARKER) && !EXCLUDED_MARKERS.iter().any(|marker| href.contains(marker))
}

fn resolve_href(href: &str, source: &SourceConfig) -> Option<String> {
    if href.starts_with("//") {
        Some(format!("{}:{}", source.scheme(), href))
    } else if href.starts_with('/') {
        Some(format!("{}{}", source.origin, href))
    } else {
        Url::parse(href)
            .ok()
            .filter(|url| url.has_host())
            .map(|_| href.to_string())
    }
}
