//! Blob binding contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use openhub_common::{BindingKind, Error, Result};

/// HTTP-facing metadata stored alongside an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobHttpMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Options for `put`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobPutOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_metadata: Option<BlobHttpMetadata>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_metadata: BTreeMap<String, String>,
}

impl BlobPutOptions {
    /// Options carrying only a content type.
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            http_metadata: Some(BlobHttpMetadata {
                content_type: Some(content_type.into()),
            }),
            custom_metadata: BTreeMap::new(),
        }
    }

    /// Content type, if one was given.
    pub fn content_type(&self) -> Option<&str> {
        self.http_metadata
            .as_ref()
            .and_then(|meta| meta.content_type.as_deref())
    }

    /// Set the content type, keeping every other option.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.http_metadata
            .get_or_insert_with(BlobHttpMetadata::default)
            .content_type = Some(content_type.into());
    }
}

/// Options for `list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobListOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Opaque cursor returned by a previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// One object in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobObjectSummary {
    pub key: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded: Option<DateTime<Utc>>,
}

/// One page of objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobListResult {
    pub objects: Vec<BlobObjectSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub truncated: bool,
}

/// Object metadata without the body, as returned by `head`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMetadata {
    pub key: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded: Option<DateTime<Utc>>,
    #[serde(default)]
    pub http_metadata: BlobHttpMetadata,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_metadata: BTreeMap<String, String>,
}

/// A stored object with its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl BlobObject {
    pub fn size(&self) -> u64 {
        self.body.len() as u64
    }
}

/// Blob binding.
#[async_trait]
pub trait BlobBinding: Send + Sync {
    /// Fetch an object; `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<BlobObject>>;

    /// Store an object, replacing any previous body under the key.
    async fn put(&self, key: &str, body: Vec<u8>, options: Option<BlobPutOptions>) -> Result<()>;

    /// Remove an object. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List objects in key order, one page at a time.
    async fn list(&self, options: Option<BlobListOptions>) -> Result<BlobListResult>;

    /// Fetch metadata only.
    async fn head(&self, _key: &str) -> Result<Option<BlobMetadata>> {
        Err(Error::NotAvailable("head".to_string()))
    }

    /// Invoke an operation outside the ones above.
    async fn call(&self, method: &str, _args: Vec<Value>) -> Result<Value> {
        Err(Error::MethodNotFound {
            binding: BindingKind::Blob,
            method: method.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_options_content_type() {
        let mut options = BlobPutOptions::default();
        assert_eq!(options.content_type(), None);

        options.set_content_type("text/plain");
        assert_eq!(options.content_type(), Some("text/plain"));

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"httpMetadata": {"contentType": "text/plain"}})
        );
    }

    #[test]
    fn test_list_result_deserializes_without_cursor() {
        let result: BlobListResult = serde_json::from_str(
            r#"{"objects":[{"key":"a.txt","size":3}],"truncated":false}"#,
        )
        .unwrap();
        assert_eq!(result.objects.len(), 1);
        assert_eq!(result.objects[0].size, 3);
        assert!(result.cursor.is_none());
    }
}
