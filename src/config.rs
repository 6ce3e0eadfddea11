//! Startup configuration shared by every pipeline stage.
//!
//! Built once from [`crate::cli::Cli`] and passed by reference; no stage reads
//! the environment itself.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceConfig,
    pub service: ServiceConfig,
    pub store: StoreConfig,
    /// Upper bound on articles in flight at once.
    pub concurrency: usize,
    /// Records go to an in-memory store instead of the table.
    pub dry_run: bool,
}

/// Where articles are discovered and how pages are requested.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub listing_url: Url,
    /// `scheme://host[:port]` of the listing page, used for root-relative links.
    pub origin: String,
    pub user_agent: String,
    pub http_timeout: Duration,
}

impl SourceConfig {
    pub fn new(listing_url: &str, user_agent: String, timeout_secs: u64) -> Result<Self, ConfigError> {
        let parsed = Url::parse(listing_url).map_err(|source| ConfigError::InvalidListingUrl {
            url: listing_url.to_string(),
            source,
        })?;
        if parsed.host_str().is_none() {
            return Err(ConfigError::NoOrigin(listing_url.to_string()));
        }
        let origin = parsed.origin().ascii_serialization();

        Ok(Self {
            listing_url: parsed,
            origin,
            user_agent,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Scheme of the listing page, for protocol-relative links.
    pub fn scheme(&self) -> &str {
        self.listing_url.scheme()
    }
}

/// Generative-text service settings.
#[derive(Clone)]
pub struct ServiceConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Destination table settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub table_name: String,
    pub region: String,
    pub endpoint_url: Option<String>,
}
