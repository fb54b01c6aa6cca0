//! Built-in platform providers.
//!
//! Every supported platform exposes the same three categories; they differ
//! only in the environment names their native bindings live under.

use tracing::debug;

use openhub_bindings::Bindings;
use openhub_common::{BindingKind, Error, Platform, Result};

use crate::context::{PlatformBinding, PlatformContext};
use crate::provider::Provider;

/// Environment names of the native bindings on one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingKeys {
    pub database: String,
    pub kv: String,
    pub blob: String,
}

impl BindingKeys {
    pub fn new(database: impl Into<String>, kv: impl Into<String>, blob: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            kv: kv.into(),
            blob: blob.into(),
        }
    }

    /// Default names for a platform.
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Cloudflare => Self::new("DB", "KV", "BLOB"),
            Platform::Aws => Self::new("RDS", "DYNAMODB", "S3"),
            Platform::Azure => Self::new("DATABASE", "CACHE", "STORAGE"),
            Platform::Google => Self::new("DB", "KV", "BLOB"),
            Platform::Supabase => Self::new("DATABASE", "KV", "STORAGE"),
        }
    }

    fn key(&self, kind: BindingKind) -> &str {
        match kind {
            BindingKind::Database => &self.database,
            BindingKind::Kv => &self.kv,
            BindingKind::Blob => &self.blob,
        }
    }
}

/// Provider for one of the built-in platforms.
#[derive(Debug, Clone)]
pub struct PlatformProvider {
    platform: Platform,
    keys: BindingKeys,
    supported: Vec<BindingKind>,
}

impl PlatformProvider {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            keys: BindingKeys::for_platform(platform),
            supported: BindingKind::ALL.to_vec(),
        }
    }

    pub fn cloudflare() -> Self {
        Self::new(Platform::Cloudflare)
    }

    pub fn aws() -> Self {
        Self::new(Platform::Aws)
    }

    pub fn azure() -> Self {
        Self::new(Platform::Azure)
    }

    pub fn google() -> Self {
        Self::new(Platform::Google)
    }

    pub fn supabase() -> Self {
        Self::new(Platform::Supabase)
    }

    /// Read bindings from custom environment names.
    pub fn with_keys(mut self, keys: BindingKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn keys(&self) -> &BindingKeys {
        &self.keys
    }
}

impl Provider for PlatformProvider {
    fn name(&self) -> &str {
        self.platform.as_str()
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn supported_bindings(&self) -> &[BindingKind] {
        &self.supported
    }

    fn extract_bindings(&self, context: &PlatformContext) -> Result<Bindings> {
        if context.platform() != self.platform {
            return Err(Error::PlatformMismatch {
                provider: self.platform.label().to_string(),
                platform: context.platform().to_string(),
            });
        }

        let mut bindings = Bindings::new();
        for &kind in &self.supported {
            let key = self.keys.key(kind);
            let Some(found) = context.get(key) else {
                continue;
            };
            match found.clone() {
                PlatformBinding::Database(database) if kind == BindingKind::Database => {
                    bindings.database = Some(database)
                }
                PlatformBinding::Kv(kv) if kind == BindingKind::Kv => bindings.kv = Some(kv),
                PlatformBinding::Blob(blob) if kind == BindingKind::Blob => {
                    bindings.blob = Some(blob)
                }
                other => {
                    return Err(Error::InvalidInput(format!(
                        "Environment binding '{}' is a {} binding, expected {}",
                        key,
                        other.kind(),
                        kind
                    )))
                }
            }
        }

        debug!(provider = %self.name(), bindings = ?bindings, "Extracted platform bindings");
        Ok(bindings)
    }
}
