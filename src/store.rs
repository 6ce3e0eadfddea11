//! Persistence of finished article records.
//!
//! Every backend implements [`ArticleStore::put`] as a single-item upsert keyed
//! by [`ArticleRecord::id`]: writing an id that already exists replaces the
//! previous item entirely. Writes are independent of one another.
//!
//! # Backends
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`DynamoStore`] | the configured DynamoDB table |
//! | [`MemoryStore`] | dry runs and tests |

use std::collections::HashMap;

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::ArticleRecord;

/// Destination for finished records.
pub trait ArticleStore {
    async fn put(&self, record: ArticleRecord) -> Result<(), StoreError>;
}

/// [`ArticleStore`] writing one `PutItem` per record.
#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    /// Build a client from the default AWS credential chain, the configured
    /// region and an optional endpoint override.
    #[instrument(level = "info", skip_all, fields(table = %store.table_name, region = %store.region))]
    pub async fn connect(store: &StoreConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(store.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &store.endpoint_url {
            info!(%endpoint, "Using DynamoDB endpoint override");
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            table: store.table_name.clone(),
        }
    }
}

impl ArticleStore for DynamoStore {
    #[instrument(level = "info", skip_all, fields(id = %record.id))]
    async fn put(&self, record: ArticleRecord) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(record_to_item(record)))
            .send()
            .await
            .map_err(|e| StoreError::Backend {
                table: self.table.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        debug!(table = %self.table, "PutItem succeeded");
        Ok(())
    }
}

/// DynamoDB item for a record: every field as a string attribute.
pub fn record_to_item(record: ArticleRecord) -> HashMap<String, AttributeValue> {
    let ArticleRecord {
        id,
        title,
        original_url,
        original_content,
        ai_content,
        timestamp,
    } = record;

    HashMap::from([
        ("id".to_string(), AttributeValue::S(id)),
        ("title".to_string(), AttributeValue::S(title)),
        ("original_url".to_string(), AttributeValue::S(original_url)),
        ("original_content".to_string(), AttributeValue::S(original_content)),
        ("ai_content".to_string(), AttributeValue::S(ai_content)),
        ("timestamp".to_string(), AttributeValue::S(timestamp)),
    ])
}

/// In-process [`ArticleStore`] with the same overwrite-by-id semantics.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, ArticleRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn get(&self, id: &str) -> Option<ArticleRecord> {
        self.records.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// All stored records, ordered by id.
    pub async fn records(&self) -> Vec<ArticleRecord> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }
}

impl ArticleStore for MemoryStore {
    async fn put(&self, record: ArticleRecord) -> Result<(), StoreError> {
        self.records.write().await.insert(record.id.clone(), record);
        Ok(())
    }
}
