//! Environment-backed settings for a pipeline run.
//!
//! The scheduler that launches `bias_watch` supplies everything through the
//! environment and passes no arguments. Every setting is backed by a
//! variable; the long flags exist only for local runs and override the
//! variable when given.

use std::time::Duration;

use clap::Parser;

use crate::config::{Config, ServiceConfig, SourceConfig, StoreConfig};
use crate::error::ConfigError;

/// Settings for one discover → extract → analyse → store pass.
///
/// Deployed runs read these from the environment only. The long flags mirror
/// the variables for local runs and are not part of the scheduled invocation.
///
/// # Examples
///
/// ```sh
/// DYNAMODB_TABLE_NAME=Articles OPENAI_API_KEY=sk-... bias_watch
///
/// # Against DynamoDB Local
/// DYNAMODB_TABLE_NAME=Articles OPENAI_API_KEY=sk-... \
///   DYNAMODB_ENDPOINT_URL=http://localhost:8000 bias_watch
/// ```
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    after_help = "Every option can be set through the environment variable shown next to it; \
                  scheduled runs pass no flags."
)]
pub struct Cli {
    /// DynamoDB table receiving article records
    #[arg(long, env = "DYNAMODB_TABLE_NAME")]
    pub table_name: Option<String>,

    /// AWS region of the table
    #[arg(long, env = "AWS_DEFAULT_REGION", default_value = "eu-west-1")]
    pub region: String,

    /// Endpoint override for the DynamoDB client (e.g. DynamoDB Local)
    #[arg(long, env = "DYNAMODB_ENDPOINT_URL")]
    pub dynamodb_endpoint_url: Option<String>,

    /// API key for the OpenAI-compatible completion service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// Model used for the bias review
    #[arg(long, env = "BIAS_WATCH_MODEL", default_value = "o1-mini")]
    pub model: String,

    /// Listing page the article links are discovered on
    #[arg(long, env = "BIAS_WATCH_LISTING_URL", default_value = "https://www.bbc.com/news")]
    pub listing_url: String,

    /// User-Agent sent with every page request
    #[arg(long, env = "BIAS_WATCH_USER_AGENT", default_value = concat!("bias_watch/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,

    /// Timeout applied by the HTTP transport to each request, in seconds
    #[arg(long, env = "BIAS_WATCH_HTTP_TIMEOUT_SECS", default_value_t = 60)]
    pub http_timeout_secs: u64,

    /// Timeout applied to each completion request, in seconds
    #[arg(long, env = "BIAS_WATCH_SERVICE_TIMEOUT_SECS", default_value_t = 300)]
    pub service_timeout_secs: u64,

    /// Number of articles processed at once
    #[arg(long, env = "BIAS_WATCH_CONCURRENCY", default_value_t = 4)]
    pub concurrency: usize,

    /// Keep records in memory and log them instead of writing to DynamoDB
    #[arg(long, env = "BIAS_WATCH_DRY_RUN")]
    pub dry_run: bool,
}

impl Cli {
    /// Validate the raw settings and build the [`Config`] shared by every stage.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let table_name = match self.table_name {
            Some(name) if !name.trim().is_empty() => name,
            _ if self.dry_run => "dry-run".to_string(),
            _ => return Err(ConfigError::Empty("DYNAMODB_TABLE_NAME")),
        };
        if self.openai_api_key.trim().is_empty() {
            return Err(ConfigError::Empty("OPENAI_API_KEY"));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        Ok(Config {
            source: SourceConfig::new(&self.listing_url, self.user_agent, self.http_timeout_secs)?,
            service: ServiceConfig {
                api_key: self.openai_api_key,
                base_url: self.openai_base_url,
                model: self.model,
                timeout: Duration::from_secs(self.service_timeout_secs),
            },
            store: StoreConfig {
                table_name,
                region: self.region,
                endpoint_url: self.dynamodb_endpoint_url,
            },
            concurrency: self.concurrency,
            dry_run: self.dry_run,
        })
    }
}
