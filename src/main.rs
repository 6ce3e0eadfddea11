//! # Bias Watch
//!
//! A batch ingest job that discovers news articles on a listing page, extracts
//! their text, asks an OpenAI-compatible model to review each one for bias and
//! impartiality, and upserts the result into a DynamoDB table keyed by a hash
//! of the article URL.
//!
//! ## Usage
//!
//! Meant to be launched by a scheduler, with all settings in the environment:
//!
//! ```sh
//! DYNAMODB_TABLE_NAME=Articles OPENAI_API_KEY=sk-... bias_watch
//! ```
//!
//! ## Architecture
//!
//! 1. **Indexing**: fetch the listing page and collect article links
//! 2. **Extraction**: fetch each article and pull out its paragraphs
//! 3. **Analysis**: send title and body to the model for a bias review
//! 4. **Storage**: write one record per article, overwriting earlier runs
//!
//! Failing to fetch the listing page aborts the run with a non-zero exit.
//! Any failure after that is confined to the article it happened on.

use clap::Parser;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analysis;
mod cli;
mod config;
mod error;
mod http;
mod ident;
mod models;
mod pipeline;
mod scrapers;
mod store;
#[cfg(test)]
mod test_support;
mod utils;

use analysis::{AnalysisTransformer, OpenAiChat, TextService};
use cli::Cli;
use config::Config;
use error::FetchError;
use http::{HttpFetcher, PageFetcher};
use models::RunSummary;
use pipeline::Pipeline;
use store::{ArticleStore, DynamoStore, MemoryStore};
use utils::truncate_for_log;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("bias_watch starting up");

    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    debug!(?config, "Loaded configuration");

    let fetcher = HttpFetcher::new(&config.source)?;
    let transformer = AnalysisTransformer::new(OpenAiChat::new(&config.service)?);

    let summary = if config.dry_run {
        info!("Dry run: records will be kept in memory");
        let store = MemoryStore::new();
        let summary = execute(&config, &fetcher, &transformer, &store).await?;
        info!(count = store.len().await, "Dry-run records");
        for record in store.records().await {
            info!(
                id = %record.id,
                title = %record.title,
                url = %record.original_url,
                ai_content = %truncate_for_log(&record.ai_content, 300),
                "Dry-run record"
            );
        }
        summary
    } else {
        let store = DynamoStore::connect(&config.store).await;
        execute(&config, &fetcher, &transformer, &store).await?
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        persisted = summary.persisted,
        failed = summary.failed(),
        "Execution complete"
    );

    Ok(())
}

async fn execute<F, S, K>(
    config: &Config,
    fetcher: &F,
    transformer: &AnalysisTransformer<S>,
    store: &K,
) -> Result<RunSummary, FetchError>
where
    F: PageFetcher,
    S: TextService,
    K: ArticleStore,
{
    Pipeline::new(config, fetcher, transformer, store)
        .run()
        .await
        .inspect_err(|e| error!(error = %e, "Listing page unavailable; aborting run"))
}
