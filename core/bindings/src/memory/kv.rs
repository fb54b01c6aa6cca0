//! In-memory key-value binding.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use openhub_common::{Error, Result};

use super::{paginate, read, write};
use crate::kv::{KvBinding, KvKey, KvListOptions, KvListResult, KvPutOptions};

/// Default and maximum page size for `list`.
const MAX_LIST_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expiration: Option<i64>,
}

impl Entry {
    fn is_expired(&self, now: i64) -> bool {
        self.expiration.is_some_and(|at| at <= now)
    }
}

/// In-memory key-value binding with expiry and cursor pagination.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: Arc<RwLock<BTreeMap<String, Entry>>>,
}

impl MemoryKv {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) keys.
    pub fn len(&self) -> usize {
        let now = Utc::now().timestamp();
        read(&self.entries)
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resolve_expiration(options: Option<&KvPutOptions>, now: i64) -> Result<Option<i64>> {
        let Some(options) = options else {
            return Ok(None);
        };
        if let Some(ttl) = options.expiration_ttl {
            if ttl <= 0 {
                return Err(Error::InvalidInput(format!(
                    "expirationTtl must be positive, got {}",
                    ttl
                )));
            }
            return now.checked_add(ttl).map(Some).ok_or_else(|| {
                Error::InvalidInput(format!("expirationTtl {} is out of range", ttl))
            });
        }
        Ok(options.expiration)
    }
}

#[async_trait]
impl KvBinding for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Utc::now().timestamp();
        let entries = read(&self.entries);
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn put(&self, key: &str, value: &str, options: Option<KvPutOptions>) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidInput("Key cannot be empty".to_string()));
        }
        let now = Utc::now().timestamp();
        let expiration = Self::resolve_expiration(options.as_ref(), now)?;

        debug!(key = %key, ?expiration, "Memory kv put");
        write(&self.entries).insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expiration,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        write(&self.entries).remove(key);
        Ok(())
    }

    async fn list(&self, options: Option<KvListOptions>) -> Result<KvListResult> {
        let options = options.unwrap_or_default();
        let limit = options.limit.unwrap_or(MAX_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let now = Utc::now().timestamp();

        let entries = read(&self.entries);
        let live = entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key);
        let (page, cursor) = paginate(
            live,
            options.prefix.as_deref(),
            limit,
            options.cursor.as_deref(),
        );

        let keys = page
            .into_iter()
            .map(|name| KvKey {
                name: name.clone(),
                expiration: entries.get(name).and_then(|entry| entry.expiration),
            })
            .collect();

        Ok(KvListResult {
            keys,
            list_complete: cursor.is_none(),
            cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let kv = MemoryKv::new();

        kv.put("greeting", "hello", None).await.unwrap();
        assert_eq!(kv.get("greeting").await.unwrap().as_deref(), Some("hello"));

        kv.delete("greeting").await.unwrap();
        assert!(kv.get("greeting").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_keys_are_invisible() {
        let kv = MemoryKv::new();
        let past = Utc::now().timestamp() - 10;

        kv.put(
            "stale",
            "x",
            Some(KvPutOptions {
                expiration: Some(past),
                expiration_ttl: None,
            }),
        )
        .await
        .unwrap();

        assert!(kv.get("stale").await.unwrap().is_none());
        assert!(kv.list(None).await.unwrap().keys.is_empty());
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn test_ttl_sets_future_expiration() {
        let kv = MemoryKv::new();
        kv.put(
            "session",
            "abc",
            Some(KvPutOptions {
                expiration: None,
                expiration_ttl: Some(60),
            }),
        )
        .await
        .unwrap();

        let listed = kv.list(None).await.unwrap();
        let expiration = listed.keys[0].expiration.unwrap();
        assert!(expiration > Utc::now().timestamp());
    }

    #[tokio::test]
    async fn test_non_positive_ttl_rejected() {
        let kv = MemoryKv::new();
        let result = kv
            .put(
                "k",
                "v",
                Some(KvPutOptions {
                    expiration: None,
                    expiration_ttl: Some(0),
                }),
            )
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_overflowing_ttl_rejected() {
        let kv = MemoryKv::new();
        let result = kv
            .put(
                "k",
                "v",
                Some(KvPutOptions {
                    expiration: None,
                    expiration_ttl: Some(i64::MAX),
                }),
            )
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(kv.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_paginates_with_prefix() {
        let kv = MemoryKv::new();
        for key in ["user:1", "user:2", "user:3", "post:1"] {
            kv.put(key, "v", None).await.unwrap();
        }

        let first = kv
            .list(Some(KvListOptions {
                prefix: Some("user:".to_string()),
                limit: Some(2),
                cursor: None,
            }))
            .await
            .unwrap();
        assert_eq!(first.keys.len(), 2);
        assert!(!first.list_complete);

        let second = kv
            .list(Some(KvListOptions {
                prefix: Some("user:".to_string()),
                limit: Some(2),
                cursor: first.cursor.clone(),
            }))
            .await
            .unwrap();
        assert_eq!(second.keys.len(), 1);
        assert_eq!(second.keys[0].name, "user:3");
        assert!(second.list_complete);
        assert!(second.cursor.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method_reports_not_found() {
        let kv = MemoryKv::new();
        let err = kv.call("getWithMetadata", vec![]).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Method 'getWithMetadata' not found on binding 'kv'"
        );
    }
}
