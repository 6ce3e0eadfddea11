//! Data models for discovered articles and their persisted analysis.
//!
//! - [`ArticleReference`]: a (title, URL) pair found on the listing page
//! - [`ArticleRecord`]: the unit written to the store once an article has been
//!   extracted and analysed
//! - [`ArticleOutcome`]: the terminal state one reference ends up in
//! - [`RunSummary`]: per-run tally of outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// A candidate article discovered on the listing page.
///
/// Equality, hashing and ordering all use the full `(title, url)` pair, so two
/// links with the same URL but different anchor text stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArticleReference {
    /// Anchor text of the link.
    pub title: String,
    /// Absolute article URL.
    pub url: String,
}

impl ArticleReference {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// A processed article as stored, keyed by [`ArticleRecord::id`].
///
/// `id` depends only on `original_url`, so re-processing the same article
/// overwrites the earlier record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Hex digest of `original_url`.
    pub id: String,
    pub title: String,
    pub original_url: String,
    /// Text extracted from the article page.
    pub original_content: String,
    /// Bias review and revised article returned by the text service.
    pub ai_content: String,
    /// RFC-3339 UTC creation time.
    pub timestamp: String,
}

/// Terminal state of one article reference after a pipeline pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleOutcome {
    Persisted { id: String },
    SkippedNoContent,
    ExtractionFailed,
    TransformFailed,
    PersistFailed,
}

impl fmt::Display for ArticleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleOutcome::Persisted { id } => write!(f, "persisted ({id})"),
            ArticleOutcome::SkippedNoContent => f.write_str("skipped: no content"),
            ArticleOutcome::ExtractionFailed => f.write_str("extraction failed"),
            ArticleOutcome::TransformFailed => f.write_str("transform failed"),
            ArticleOutcome::PersistFailed => f.write_str("persist failed"),
        }
    }
}

/// Counts of each terminal state reached during one run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub discovered: usize,
    pub persisted: usize,
    pub skipped_no_content: usize,
    pub extraction_failed: usize,
    pub transform_failed: usize,
    pub persist_failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &ArticleOutcome) {
        match outcome {
            ArticleOutcome::Persisted { .. } => self.persisted += 1,
            ArticleOutcome::SkippedNoContent => self.skipped_no_content += 1,
            ArticleOutcome::ExtractionFailed => self.extraction_failed += 1,
            ArticleOutcome::TransformFailed => self.transform_failed += 1,
            ArticleOutcome::PersistFailed => self.persist_failed += 1,
        }
    }

    /// References that ended anywhere other than the store.
    pub fn failed(&self) -> usize {
        self.skipped_no_content + self.extraction_failed + self.transform_failed + self.persist_failed
    }
}
