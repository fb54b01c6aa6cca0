//! Runtime configuration.
//!
//! Settings come from a [`ConfigSource`], normally the process environment.
//! Tests and the CLI layer a [`MapSource`] over it.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use url::Url;

use openhub_common::{Error, Result, SharedSecret};
use openhub_proxy::HttpTransport;

/// `"true"` switches the runtime into remote mode.
pub const REMOTE_MODE_KEY: &str = "OPENHUB_REMOTE";

/// Base URL of the deployed instance serving the proxy endpoint.
pub const REMOTE_URL_KEY: &str = "OPENHUB_REMOTE_URL";

/// Shared secret; sent by clients and expected by the endpoint.
pub const REMOTE_SECRET_KEY: &str = "OPENHUB_REMOTE_SECRET";

/// Optional HTTP timeout for the remote transport, in seconds.
pub const REMOTE_TIMEOUT_KEY: &str = "OPENHUB_REMOTE_TIMEOUT_SECS";

/// A read-only string lookup.
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory values, mutable after construction.
#[derive(Debug, Default)]
pub struct MapSource {
    values: RwLock<HashMap<String, String>>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

impl ConfigSource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

/// Ordered stack of sources. The first layer holding a key wins.
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Arc<dyn ConfigSource>>,
}

impl LayeredSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.layers.push(source);
        self
    }
}

impl ConfigSource for LayeredSource {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}

/// Whether the source enables remote mode. Only the exact string `"true"`
/// does.
pub fn remote_mode_enabled(source: &dyn ConfigSource) -> bool {
    source.get(REMOTE_MODE_KEY).as_deref() == Some("true")
}

/// Secret the proxy endpoint expects, if one is configured.
pub fn expected_secret(source: &dyn ConfigSource) -> Option<SharedSecret> {
    source
        .get(REMOTE_SECRET_KEY)
        .filter(|secret| !secret.is_empty())
        .map(SharedSecret::new)
}

/// Where and how to reach a deployed instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    pub url: String,
    #[serde(default)]
    pub secret: SharedSecret,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>, secret: SharedSecret) -> Self {
        Self {
            url: url.into(),
            secret,
            timeout_secs: None,
        }
    }

    /// Read the `OPENHUB_REMOTE_*` keys.
    ///
    /// # Errors
    /// - `Configuration` if the URL is missing or malformed, or the timeout
    ///   is not a whole number of seconds
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self> {
        let url = source
            .get(REMOTE_URL_KEY)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Configuration(format!("{} is not set", REMOTE_URL_KEY)))?;
        Url::parse(&url)
            .map_err(|e| Error::Configuration(format!("{} is invalid: {}", REMOTE_URL_KEY, e)))?;

        let timeout_secs = source
            .get(REMOTE_TIMEOUT_KEY)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|e| {
                    Error::Configuration(format!("{} is invalid: {}", REMOTE_TIMEOUT_KEY, e))
                })
            })
            .transpose()?;

        Ok(Self {
            url,
            secret: SharedSecret::new(source.get(REMOTE_SECRET_KEY).unwrap_or_default()),
            timeout_secs,
        })
    }

    /// Build the HTTP transport this configuration describes.
    pub fn transport(&self) -> Result<HttpTransport> {
        match self.timeout_secs {
            Some(secs) => HttpTransport::with_timeout(
                &self.url,
                self.secret.clone(),
                Duration::from_secs(secs),
            ),
            None => HttpTransport::new(&self.url, self.secret.clone()),
        }
    }
}
