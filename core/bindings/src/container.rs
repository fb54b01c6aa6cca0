//! Request-scoped bindings container.

use std::fmt;
use std::sync::Arc;

use openhub_common::BindingKind;

use crate::blob::BlobBinding;
use crate::database::DatabaseBinding;
use crate::kv::KvBinding;

/// At most one binding per category.
///
/// Cloning is shallow: the bindings themselves are shared.
#[derive(Clone, Default)]
pub struct Bindings {
    pub database: Option<Arc<dyn DatabaseBinding>>,
    pub kv: Option<Arc<dyn KvBinding>>,
    pub blob: Option<Arc<dyn BlobBinding>>,
}

impl Bindings {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, database: Arc<dyn DatabaseBinding>) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_kv(mut self, kv: Arc<dyn KvBinding>) -> Self {
        self.kv = Some(kv);
        self
    }

    pub fn with_blob(mut self, blob: Arc<dyn BlobBinding>) -> Self {
        self.blob = Some(blob);
        self
    }

    /// Shallow union: every key present in `other` replaces the same key
    /// here; keys absent from `other` are kept.
    pub fn merge(mut self, other: Bindings) -> Self {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.kv.is_some() {
            self.kv = other.kv;
        }
        if other.blob.is_some() {
            self.blob = other.blob;
        }
        self
    }

    /// Check if a category is present.
    pub fn contains(&self, kind: BindingKind) -> bool {
        match kind {
            BindingKind::Database => self.database.is_some(),
            BindingKind::Kv => self.kv.is_some(),
            BindingKind::Blob => self.blob.is_some(),
        }
    }

    /// Present categories, in canonical order.
    pub fn kinds(&self) -> Vec<BindingKind> {
        BindingKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("database", &self.database.is_some())
            .field("kv", &self.kv.is_some())
            .field("blob", &self.blob.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDatabase, MemoryKv};

    #[test]
    fn test_merge_keeps_unrelated_keys() {
        let database: Arc<dyn DatabaseBinding> = Arc::new(MemoryDatabase::new());
        let kv: Arc<dyn KvBinding> = Arc::new(MemoryKv::new());

        let merged = Bindings::new()
            .with_database(database.clone())
            .merge(Bindings::new().with_kv(kv.clone()));

        assert!(Arc::ptr_eq(merged.database.as_ref().unwrap(), &database));
        assert!(Arc::ptr_eq(merged.kv.as_ref().unwrap(), &kv));
        assert!(merged.blob.is_none());
    }

    #[test]
    fn test_merge_later_wins() {
        let first: Arc<dyn DatabaseBinding> = Arc::new(MemoryDatabase::new());
        let second: Arc<dyn DatabaseBinding> = Arc::new(MemoryDatabase::new());

        let merged = Bindings::new()
            .with_database(first)
            .merge(Bindings::new().with_database(second.clone()));

        assert!(Arc::ptr_eq(merged.database.as_ref().unwrap(), &second));
    }

    #[test]
    fn test_kinds_and_debug() {
        let bindings = Bindings::new().with_kv(Arc::new(MemoryKv::new()));
        assert_eq!(bindings.kinds(), vec![BindingKind::Kv]);
        assert!(!bindings.is_empty());
        assert!(Bindings::new().is_empty());
        assert_eq!(
            format!("{:?}", bindings),
            "Bindings { database: false, kv: true, blob: false }"
        );
    }
}
