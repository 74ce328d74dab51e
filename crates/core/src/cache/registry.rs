//! Named cache instances sharing one memory store.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::instance::Cache;
use super::method::CacheMethod;
use super::shared::SharedStore;
use crate::Error;

/// Registry of cache instances, keyed by instance key.
///
/// Owns the [`SharedStore`] handed to every `apcu`/`auto` instance it
/// creates, so those instances see the same memory.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    shared: SharedStore,
    instances: BTreeMap<String, Arc<Cache>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an instance and register it under `key`, replacing any
    /// previous instance with that key.
    pub fn create_instance(
        &mut self, key: &str, method: CacheMethod, path: Option<PathBuf>, disabled: bool,
    ) -> Result<Arc<Cache>, Error> {
        let cache = Arc::new(Cache::new(key, method, path, disabled, Some(self.shared.clone()))?);
        self.instances.insert(key.to_string(), Arc::clone(&cache));
        Ok(cache)
    }

    /// Look up a registered instance.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheNotInitialized` if no instance was created for `key`.
    pub fn instance(&self, key: &str) -> Result<Arc<Cache>, Error> {
        self.instances
            .get(key)
            .cloned()
            .ok_or_else(|| Error::CacheNotInitialized(key.to_string()))
    }

    pub fn has_instance(&self, key: &str) -> bool {
        self.instances.contains_key(key)
    }

    pub fn instances(&self) -> impl Iterator<Item = &Arc<Cache>> {
        self.instances.values()
    }

    pub fn shared_store(&self) -> &SharedStore {
        &self.shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_instance_is_an_error() {
        let registry = CacheRegistry::new();
        let err = registry.instance("views").unwrap_err();
        assert!(matches!(err, Error::CacheNotInitialized(k) if k == "views"));
        assert!(!registry.has_instance("views"));
    }

    #[test]
    fn test_instances_share_memory() {
        let mut registry = CacheRegistry::new();
        let a = registry.create_instance("a:", CacheMethod::Shared, None, false).unwrap();
        registry.create_instance("b:", CacheMethod::Shared, None, false).unwrap();
        a.set("k", &1);

        let store = registry.shared_store();
        assert!(store.contains("a:", "k"));
        assert!(!store.contains("b:", "k"));
        assert_eq!(registry.instance("a:").unwrap().get::<i32>("k"), Some(1));
        assert_eq!(registry.instances().count(), 2);
    }

    #[test]
    fn test_create_replaces_existing() {
        let mut registry = CacheRegistry::new();
        registry.create_instance("a:", CacheMethod::Shared, None, false).unwrap();
        registry.create_instance("a:", CacheMethod::None, None, false).unwrap();
        assert_eq!(registry.instance("a:").unwrap().method(), CacheMethod::None);
        assert_eq!(registry.instances().count(), 1);
    }

    #[test]
    fn test_auto_resolves_to_shared() {
        let tmp = tempfile::tempdir().unwrap();
        let mut registry = CacheRegistry::new();
        let cache = registry
            .create_instance("a:", CacheMethod::Auto, Some(tmp.path().into()), false)
            .unwrap();
        assert_eq!(cache.method(), CacheMethod::Shared);
    }
}
