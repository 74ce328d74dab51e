//! In-process shared memory store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

type Namespaces = HashMap<String, HashMap<String, Value>>;

/// Process-local key/value store shared by every cache instance holding a
/// clone of it.
///
/// Entries are grouped by namespace (the instance key), so clearing or
/// counting one instance never touches another, whatever their keys look
/// like. A poisoned lock reads as an empty store and rejects writes.
#[derive(Clone, Debug, Default)]
pub struct SharedStore {
    entries: Arc<RwLock<Namespaces>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.entries
            .read()
            .map(|e| e.get(namespace).is_some_and(|ns| ns.contains_key(key)))
            .unwrap_or(false)
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        self.entries.read().ok()?.get(namespace)?.get(key).cloned()
    }

    pub fn insert(&self, namespace: &str, key: &str, value: Value) -> bool {
        match self.entries.write() {
            Ok(mut entries) => {
                entries
                    .entry(namespace.to_string())
                    .or_default()
                    .insert(key.to_string(), value);
                true
            }
            Err(_) => false,
        }
    }

    /// Remove every entry of `namespace`.
    pub fn clear(&self, namespace: &str) -> bool {
        match self.entries.write() {
            Ok(mut entries) => {
                entries.remove(namespace);
                true
            }
            Err(_) => false,
        }
    }

    /// Count entries of `namespace`.
    pub fn count(&self, namespace: &str) -> usize {
        self.entries
            .read()
            .map(|e| e.get(namespace).map_or(0, HashMap::len))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clones_share_entries() {
        let store = SharedStore::new();
        let other = store.clone();
        assert!(store.insert("a:", "1", json!(1)));
        assert!(other.contains("a:", "1"));
        assert_eq!(other.get("a:", "1"), Some(json!(1)));
        assert!(!other.contains("b:", "1"));
    }

    #[test]
    fn test_clear_keeps_other_namespaces() {
        let store = SharedStore::new();
        store.insert("a:", "1", json!(1));
        store.insert("a:", "2", json!(2));
        store.insert("b:", "1", json!(3));

        assert_eq!(store.count("a:"), 2);
        assert!(store.clear("a:"));
        assert_eq!(store.count("a:"), 0);
        assert_eq!(store.count("b:"), 1);
    }

    #[test]
    fn test_namespace_that_prefixes_another_is_separate() {
        let store = SharedStore::new();
        store.insert("ab", "k", json!("ab's"));
        store.insert("a", "bk", json!("a's"));

        assert_eq!(store.get("ab", "k"), Some(json!("ab's")));
        assert!(store.clear("a"));
        assert!(store.contains("ab", "k"));
        assert_eq!(store.count("ab"), 1);
    }
}
