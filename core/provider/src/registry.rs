//! Provider registry for resolving providers by platform name.

use std::collections::HashMap;
use std::sync::Arc;

use openhub_common::{Error, Platform, Result};

use crate::platform::PlatformProvider;
use crate::provider::Provider;

/// Factory function type for creating providers.
pub type ProviderFactory = Box<dyn Fn() -> Arc<dyn Provider> + Send + Sync>;

/// Named provider factories.
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a provider factory.
    ///
    /// # Errors
    /// - `AlreadyExists` if `name` is already registered
    pub fn register(&mut self, name: impl Into<String>, factory: ProviderFactory) -> Result<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(Error::AlreadyExists(format!(
                "Provider '{}' is already registered",
                name
            )));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Build a provider by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Provider>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Provider '{}' is not registered", name)))?;
        Ok(factory())
    }

    /// Registered names, sorted.
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry holding every built-in platform provider.
pub fn create_default_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for platform in Platform::ALL {
        registry.factories.insert(
            platform.as_str().to_string(),
            Box::new(move || -> Arc<dyn Provider> { Arc::new(PlatformProvider::new(platform)) }),
        );
    }
    registry
}
