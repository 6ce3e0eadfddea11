//! The discover → extract → analyse → store run.
//!
//! The listing page is fetched once; if that fails the run aborts, since there
//! is nothing to iterate over. Every discovered reference then moves through
//! the stages on its own:
//!
//! ```text
//! Discovered → Extracting ─┬─ no text ──────────→ SkippedNoContent
//!                          ├─ fetch error ──────→ ExtractionFailed
//!                          └─ Extracted → Transforming ─┬─ service error → TransformFailed
//!                                                       └─ Transformed → Persisting ─┬─ store error → PersistFailed
//!                                                                                    └─ Persisted
//! ```
//!
//! A failure ends only that reference's path. Up to `concurrency` references
//! are in flight at once and they finish in no particular order.

use chrono::{SecondsFormat, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use crate::analysis::{AnalysisTransformer, TextService};
use crate::config::Config;
use crate::error::{ArticleFailure, FetchError};
use crate::http::PageFetcher;
use crate::ident::id_for;
use crate::models::{ArticleOutcome, ArticleRecord, ArticleReference, RunSummary};
use crate::scrapers::{content::fetch_content, links::index_articles};
use crate::store::ArticleStore;

pub struct Pipeline<'a, F, S, K> {
    config: &'a Config,
    fetcher: &'a F,
    transformer: &'a AnalysisTransformer<S>,
    store: &'a K,
}

impl<'a, F, S, K> Pipeline<'a, F, S, K>
where
    F: PageFetcher,
    S: TextService,
    K: ArticleStore,
{
    pub fn new(
        config: &'a Config,
        fetcher: &'a F,
        transformer: &'a AnalysisTransformer<S>,
        store: &'a K,
    ) -> Self {
        Self {
            config,
            fetcher,
            transformer,
            store,
        }
    }

    /// Process every article linked from the listing page.
    ///
    /// Only a listing-page failure is returned as an error; per-article
    /// failures are logged and counted in the [`RunSummary`].
    #[instrument(level = "info", skip_all)]
    pub async fn run(&self) -> Result<RunSummary, FetchError> {
        let references = index_articles(self.fetcher, &self.config.source).await?;

        let mut summary = RunSummary {
            discovered: references.len(),
            ..Default::default()
        };
        info!(
            count = summary.discovered,
            concurrency = self.config.concurrency,
            "Processing discovered articles"
        );

        let outcomes: Vec<ArticleOutcome> = stream::iter(references)
            .map(|reference| self.process(reference))
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        for outcome in &outcomes {
            debug!(%outcome, "Article finished");
            summary.record(outcome);
        }

        info!(
            discovered = summary.discovered,
            persisted = summary.persisted,
            skipped_no_content = summary.skipped_no_content,
            extraction_failed = summary.extraction_failed,
            transform_failed = summary.transform_failed,
            persist_failed = summary.persist_failed,
            "Run complete"
        );
        Ok(summary)
    }

    async fn process(&self, reference: ArticleReference) -> ArticleOutcome {
        debug!(title = %reference.title, url = %reference.url, "Processing article");

        match self.process_article(&reference).await {
            Ok(id) => {
                info!(title = %reference.title, %id, "Stored article");
                ArticleOutcome::Persisted { id }
            }
            Err(ArticleFailure::NoContent) => {
                warn!(title = %reference.title, url = %reference.url, "No content found for article; skipping");
                ArticleOutcome::SkippedNoContent
            }
            Err(ArticleFailure::Fetch(e)) => {
                error!(title = %reference.title, url = %reference.url, error = %e, "Article fetch failed; skipping");
                ArticleOutcome::ExtractionFailed
            }
            Err(ArticleFailure::Service(e)) => {
                error!(title = %reference.title, url = %reference.url, error = %e, "Analysis failed; skipping");
                ArticleOutcome::TransformFailed
            }
            Err(ArticleFailure::Store(e)) => {
                error!(title = %reference.title, url = %reference.url, error = %e, "Storing article failed");
                ArticleOutcome::PersistFailed
            }
        }
    }

    async fn process_article(&self, reference: &ArticleReference) -> Result<String, ArticleFailure> {
        let content = fetch_content(self.fetcher, &reference.url)
            .await?
            .ok_or(ArticleFailure::NoContent)?;

        let ai_content = self.transformer.transform(&reference.title, &content).await?;

        let id = id_for(&reference.url);
        let record = ArticleRecord {
            id: id.clone(),
            title: reference.title.clone(),
            original_url: reference.url.clone(),
            original_content: content,
            ai_content,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };
        self.store.put(record).await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServiceConfig, SourceConfig, StoreConfig};
    use crate::error::{ServiceError, StoreError};
    use crate::store::MemoryStore;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const LISTING: &str = "https://www.bbc.com/news";

    fn config(concurrency: usize) -> Config {
        Config {
            source: SourceConfig::new(LISTING, "test".to_string(), 5).unwrap(),
            service: ServiceConfig {
                api_key: "sk-test".to_string(),
                base_url: "http://localhost".to_string(),
                model: "o1-mini".to_string(),
                timeout: Duration::from_secs(5),
            },
            store: StoreConfig {
                table_name: "TestArticlesTable".to_string(),
                region: "eu-west-1".to_string(),
                endpoint_url: None,
            },
            concurrency,
            dry_run: true,
        }
    }

    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, String>,
    }

    impl FakeSite {
        fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl PageFetcher for FakeSite {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    /// Answers every prompt with a numbered analysis, and rejects prompts
    /// mentioning `reject`.
    #[derive(Default)]
    struct FakeService {
        reject: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl TextService for FakeService {
        async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            match self.reject {
                Some(marker) if prompt.contains(marker) => Err(ServiceError::EmptyCompletion),
                _ => Ok(format!("Processed AI Content #{n}")),
            }
        }
    }

    /// Delegates to a [`MemoryStore`] except for one id it refuses.
    struct PickyStore {
        inner: MemoryStore,
        refuse: String,
    }

    impl ArticleStore for PickyStore {
        async fn put(&self, record: ArticleRecord) -> Result<(), StoreError> {
            if record.id == self.refuse {
                return Err(StoreError::Backend {
                    table: "TestArticlesTable".to_string(),
                    message: "ConditionalCheckFailed".to_string(),
                });
            }
            self.inner.put(record).await
        }
    }

    fn listing(links: &[(&str, &str)]) -> String {
        let anchors: String = links
            .iter()
            .map(|(href, title)| format!(r#"<a href="{href}">{title}</a>"#))
            .collect();
        format!("<html><body>{anchors}</body></html>")
    }

    fn article(paragraphs: &[&str]) -> String {
        let ps: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
        format!("<html><body><article>{ps}</article></body></html>")
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let config = config(1);
        let site = FakeSite::default()
            .page(
                LISTING,
                &listing(&[
                    ("/news/123", "Article Title 1 with sufficient length"),
                    ("/news/live/789", "Live Article with sufficient length"),
                ]),
            )
            .page(
                "https://www.bbc.com/news/123",
                &article(&["Article content paragraph 1.", "Article content paragraph 2."]),
            );
        let transformer = AnalysisTransformer::new(FakeService::default());
        let store = MemoryStore::new();

        let summary = Pipeline::new(&config, &site, &transformer, &store).run().await.unwrap();
        assert_eq!(summary.discovered, 1);
        assert_eq!(summary.persisted, 1);

        let records = store.records().await;
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, id_for("https://www.bbc.com/news/123"));
        assert_eq!(record.title, "Article Title 1 with sufficient length");
        assert_eq!(record.original_url, "https://www.bbc.com/news/123");
        assert_eq!(
            record.original_content,
            "Article content paragraph 1.\nArticle content paragraph 2."
        );
        assert_eq!(record.ai_content, "Processed AI Content #1");
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
        assert!(record.timestamp.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_one_failed_fetch_does_not_stop_the_batch() {
        let config = config(2);
        let links: Vec<(String, String)> = (1..=5)
            .map(|i| (format!("/news/{i}"), format!("Story number {i} with a long headline")))
            .collect();
        let link_refs: Vec<(&str, &str)> = links.iter().map(|(h, t)| (h.as_str(), t.as_str())).collect();

        let mut site = FakeSite::default().page(LISTING, &listing(&link_refs));
        for i in [1, 2, 4, 5] {
            site = site.page(&format!("https://www.bbc.com/news/{i}"), &article(&["Body."]));
        }
        let transformer = AnalysisTransformer::new(FakeService::default());
        let store = MemoryStore::new();

        let summary = Pipeline::new(&config, &site, &transformer, &store).run().await.unwrap();
        assert_eq!(summary.discovered, 5);
        assert_eq!(summary.persisted, 4);
        assert_eq!(summary.extraction_failed, 1);

        let urls: HashSet<String> = store.records().await.into_iter().map(|r| r.original_url).collect();
        assert_eq!(urls.len(), 4);
        assert!(!urls.contains("https://www.bbc.com/news/3"));
    }

    #[tokio::test]
    async fn test_each_failure_kind_is_contained() {
        let config = config(3);
        let site = FakeSite::default()
            .page(
                LISTING,
                &listing(&[
                    ("/news/ok", "A story that goes all the way through"),
                    ("/news/empty", "A story whose page has no paragraphs"),
                    ("/news/missing", "A story whose page cannot be fetched"),
                    ("/news/rejected", "A story the service refuses to review"),
                    ("/news/unstorable", "A story the store refuses to accept"),
                ]),
            )
            .page("https://www.bbc.com/news/ok", &article(&["Fine."]))
            .page("https://www.bbc.com/news/empty", "<html><body><div>video</div></body></html>")
            .page("https://www.bbc.com/news/rejected", &article(&["Refuse me."]))
            .page("https://www.bbc.com/news/unstorable", &article(&["Store me not."]));
        let transformer = AnalysisTransformer::new(FakeService {
            reject: Some("Refuse me."),
            ..Default::default()
        });
        let store = PickyStore {
            inner: MemoryStore::new(),
            refuse: id_for("https://www.bbc.com/news/unstorable"),
        };

        let summary = Pipeline::new(&config, &site, &transformer, &store).run().await.unwrap();
        assert_eq!(
            summary,
            RunSummary {
                discovered: 5,
                persisted: 1,
                skipped_no_content: 1,
                extraction_failed: 1,
                transform_failed: 1,
                persist_failed: 1,
            }
        );
        assert_eq!(summary.failed(), 4);

        let records = store.inner.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].original_url, "https://www.bbc.com/news/ok");
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let config = config(1);
        let site = FakeSite::default().page("https://www.bbc.com/news/1", &article(&["Body."]));
        let transformer = AnalysisTransformer::new(FakeService::default());
        let store = MemoryStore::new();

        let result = Pipeline::new(&config, &site, &transformer, &store).run().await;
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
        assert_eq!(store.len().await, 0);
        assert_eq!(transformer_calls(&transformer), 0);
    }

    #[tokio::test]
    async fn test_rerun_overwrites_by_id() {
        let config = config(1);
        let site = FakeSite::default()
            .page(LISTING, &listing(&[("/news/123", "Article Title 1 with sufficient length")]))
            .page("https://www.bbc.com/news/123", &article(&["Body."]));
        let transformer = AnalysisTransformer::new(FakeService::default());
        let store = MemoryStore::new();
        let pipeline = Pipeline::new(&config, &site, &transformer, &store);

        pipeline.run().await.unwrap();
        pipeline.run().await.unwrap();

        let records = store.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ai_content, "Processed AI Content #2");
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let config = config(4);
        let site = FakeSite::default().page(LISTING, "<html><body><a href=\"/sport\">Sport</a></body></html>");
        let transformer = AnalysisTransformer::new(FakeService::default());
        let store = MemoryStore::new();

        let summary = Pipeline::new(&config, &site, &transformer, &store).run().await.unwrap();
        assert_eq!(summary, RunSummary::default());
    }

    fn transformer_calls(transformer: &AnalysisTransformer<FakeService>) -> usize {
        transformer.service().calls.load(Ordering::SeqCst)
    }
}
