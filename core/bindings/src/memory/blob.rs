//! In-memory blob binding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::debug;
use uuid::Uuid;

use openhub_common::{Error, Result};

use super::{paginate, read, write};
use crate::blob::{
    BlobBinding, BlobHttpMetadata, BlobListOptions, BlobListResult, BlobMetadata, BlobObject,
    BlobObjectSummary, BlobPutOptions,
};

/// Default and maximum page size for `list`.
const MAX_LIST_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    http_metadata: BlobHttpMetadata,
    custom_metadata: BTreeMap<String, String>,
    etag: String,
    uploaded: DateTime<Utc>,
}

/// In-memory blob binding.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlob {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
}

impl MemoryBlob {
    /// Create a new empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        read(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobBinding for MemoryBlob {
    async fn get(&self, key: &str) -> Result<Option<BlobObject>> {
        let objects = read(&self.objects);
        Ok(objects.get(key).map(|stored| BlobObject {
            key: key.to_string(),
            body: stored.body.clone(),
            content_type: stored.http_metadata.content_type.clone(),
        }))
    }

    async fn put(&self, key: &str, body: Vec<u8>, options: Option<BlobPutOptions>) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidInput("Key cannot be empty".to_string()));
        }
        let options = options.unwrap_or_default();

        debug!(key = %key, size = body.len(), "Memory blob put");
        write(&self.objects).insert(
            key.to_string(),
            StoredObject {
                body,
                http_metadata: options.http_metadata.unwrap_or_default(),
                custom_metadata: options.custom_metadata,
                etag: Uuid::new_v4().to_string(),
                uploaded: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        write(&self.objects).remove(key);
        Ok(())
    }

    async fn list(&self, options: Option<BlobListOptions>) -> Result<BlobListResult> {
        let options = options.unwrap_or_default();
        let limit = options.limit.unwrap_or(MAX_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);

        let objects = read(&self.objects);
        let (page, cursor) = paginate(
            objects.keys(),
            options.prefix.as_deref(),
            limit,
            options.cursor.as_deref(),
        );

        let summaries = page
            .into_iter()
            .filter_map(|key| {
                objects.get(key).map(|stored| BlobObjectSummary {
                    key: key.clone(),
                    size: stored.body.len() as u64,
                    uploaded: Some(stored.uploaded),
                })
            })
            .collect();

        Ok(BlobListResult {
            objects: summaries,
            truncated: cursor.is_some(),
            cursor,
        })
    }

    async fn head(&self, key: &str) -> Result<Option<BlobMetadata>> {
        let objects = read(&self.objects);
        Ok(objects.get(key).map(|stored| BlobMetadata {
            key: key.to_string(),
            size: stored.body.len() as u64,
            etag: Some(stored.etag.clone()),
            uploaded: Some(stored.uploaded),
            http_metadata: stored.http_metadata.clone(),
            custom_metadata: stored.custom_metadata.clone(),
        }))
    }
}
