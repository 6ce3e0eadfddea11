//! Page retrieval for the listing page and for each article.

use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::SourceConfig;
use crate::error::{ConfigError, FetchError};

/// Fetch a page and return its body as text.
///
/// Only a 2xx response yields a body. Any other status is a
/// [`FetchError::Status`], even when the server sent a page along with it,
/// so error pages never reach the extractors.
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// [`PageFetcher`] over a shared `reqwest` client carrying the configured
/// User-Agent and transport timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(source: &SourceConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(source.user_agent.clone())
            .timeout(source.http_timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}
