//! Key-value binding contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use openhub_common::{BindingKind, Error, Result};

/// Options for `put`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KvPutOptions {
    /// Absolute expiry as seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
    /// Relative expiry in seconds from now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_ttl: Option<i64>,
}

/// Options for `list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvListOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Opaque cursor returned by a previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// One key in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvKey {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
}

/// One page of keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvListResult {
    pub keys: Vec<KvKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub list_complete: bool,
}

/// Key-value binding.
#[async_trait]
pub trait KvBinding: Send + Sync {
    /// Read a value; `None` when the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, optionally with an expiry.
    async fn put(&self, key: &str, value: &str, options: Option<KvPutOptions>) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List keys in lexicographic order, one page at a time.
    async fn list(&self, options: Option<KvListOptions>) -> Result<KvListResult>;

    /// Invoke an operation outside the four above.
    ///
    /// Bindings that expose extra platform operations override this; the
    /// default reports the method as missing.
    async fn call(&self, method: &str, _args: Vec<Value>) -> Result<Value> {
        Err(Error::MethodNotFound {
            binding: BindingKind::Kv,
            method: method.to_string(),
        })
    }
}
