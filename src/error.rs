//! Error taxonomy for the ingest pipeline.
//!
//! Each external boundary has its own error type so a stage's failure mode is
//! visible in its signature:
//! - [`FetchError`]: a listing or article page could not be retrieved
//! - [`ServiceError`]: the generative-text call failed
//! - [`StoreError`]: the upsert into the article store failed
//! - [`ConfigError`]: the startup configuration is unusable
//!
//! [`ArticleFailure`] collects the per-article failures the orchestrator
//! contains at the article boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("completion service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed completion response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("completion response carried no text")]
    EmptyCompletion,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("put into {table} failed: {message}")]
    Backend { table: String, message: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid listing URL {url}: {source}")]
    InvalidListingUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("listing URL {0} has no host to resolve relative links against")]
    NoOrigin(String),

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("could not build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Why one article did not reach the store.
#[derive(Debug, Error)]
pub enum ArticleFailure {
    #[error("no article text found")]
    NoContent,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
