//! Platform-tagged request context.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use openhub_bindings::{BlobBinding, DatabaseBinding, KvBinding};
use openhub_common::{BindingKind, Platform};

/// One native binding found in a platform environment.
#[derive(Clone)]
pub enum PlatformBinding {
    Database(Arc<dyn DatabaseBinding>),
    Kv(Arc<dyn KvBinding>),
    Blob(Arc<dyn BlobBinding>),
}

impl PlatformBinding {
    pub fn kind(&self) -> BindingKind {
        match self {
            PlatformBinding::Database(_) => BindingKind::Database,
            PlatformBinding::Kv(_) => BindingKind::Kv,
            PlatformBinding::Blob(_) => BindingKind::Blob,
        }
    }
}

impl fmt::Debug for PlatformBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlatformBinding::{}", self.kind())
    }
}

/// What the hosting platform hands a request: its tag plus an environment
/// of native bindings under platform-specific names.
#[derive(Clone)]
pub struct PlatformContext {
    platform: Platform,
    env: HashMap<String, PlatformBinding>,
}

impl PlatformContext {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            env: HashMap::new(),
        }
    }

    pub fn with_database(self, name: impl Into<String>, database: Arc<dyn DatabaseBinding>) -> Self {
        self.with_binding(name, PlatformBinding::Database(database))
    }

    pub fn with_kv(self, name: impl Into<String>, kv: Arc<dyn KvBinding>) -> Self {
        self.with_binding(name, PlatformBinding::Kv(kv))
    }

    pub fn with_blob(self, name: impl Into<String>, blob: Arc<dyn BlobBinding>) -> Self {
        self.with_binding(name, PlatformBinding::Blob(blob))
    }

    pub fn with_binding(mut self, name: impl Into<String>, binding: PlatformBinding) -> Self {
        self.env.insert(name.into(), binding);
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn get(&self, name: &str) -> Option<&PlatformBinding> {
        self.env.get(name)
    }

    /// Environment names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.env.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for PlatformContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformContext")
            .field("platform", &self.platform)
            .field("env", &self.names())
            .finish()
    }
}
