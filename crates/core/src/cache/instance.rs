//! Cache instances and the compute-and-memoize helper.

use std::convert::Infallible;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::file::FileStore;
use super::method::CacheMethod;
use super::shared::SharedStore;
use crate::Error;

#[derive(Debug)]
enum Backend {
    Shared(SharedStore),
    File(FileStore),
    Disabled,
}

/// A view over one cache backend, namespaced by the instance key.
#[derive(Debug)]
pub struct Cache {
    key: String,
    method: CacheMethod,
    backend: Backend,
}

impl Cache {
    /// Create a cache instance.
    ///
    /// `key` namespaces every entry key. `auto` resolves to `apcu` when a
    /// `shared` store is given and to `file` otherwise. A `disabled` instance
    /// resolves to `none` without checking anything else: every call works
    /// but nothing is stored.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidCachePath` if `file` or `auto` is requested without a path
    /// - `Error::CacheIo` if the cache directory cannot be created
    pub fn new(
        key: impl Into<String>, method: CacheMethod, path: Option<PathBuf>, disabled: bool,
        shared: Option<SharedStore>,
    ) -> Result<Self, Error> {
        let key = key.into();

        if disabled {
            tracing::info!(cache = %key, "cache disabled, values are computed on every call");
            return Ok(Self { key, method: CacheMethod::None, backend: Backend::Disabled });
        }

        if method.needs_path() && path.is_none() {
            return Err(Error::InvalidCachePath(format!("method '{method}' requires a cache directory")));
        }

        let resolved = match method {
            CacheMethod::Auto if shared.is_some() => CacheMethod::Shared,
            CacheMethod::Auto => CacheMethod::File,
            other => other,
        };

        let backend = match resolved {
            CacheMethod::Shared => Backend::Shared(shared.unwrap_or_default()),
            CacheMethod::File => {
                let dir = path.ok_or_else(|| Error::InvalidCachePath("missing cache directory".into()))?;
                Backend::File(FileStore::open(dir)?)
            }
            CacheMethod::None | CacheMethod::Auto => Backend::Disabled,
        };

        tracing::info!(cache = %key, requested = %method, method = %resolved, "cache created");

        Ok(Self { key, method: resolved, backend })
    }

    /// Namespace of every entry of this instance.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Resolved backend method (never `auto`).
    pub fn method(&self) -> CacheMethod {
        self.method
    }

    /// Whether values are actually stored.
    pub fn is_active(&self) -> bool {
        !matches!(self.backend, Backend::Disabled)
    }

    /// Check if a value is stored under `key`.
    pub fn has(&self, key: &str) -> bool {
        match &self.backend {
            Backend::Shared(store) => store.contains(&self.key, key),
            Backend::File(store) => store.contains(&self.key, key),
            Backend::Disabled => false,
        }
    }

    /// Read the value stored under `key`.
    ///
    /// A stored null, or a value that doesn't decode as `T`, reads as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match &self.backend {
            Backend::Shared(store) => store.get(&self.key, key),
            Backend::File(store) => store.read(&self.key, key),
            Backend::Disabled => None,
        }?;
        decode(key, raw)
    }

    /// Store `value` under `key`. Returns `false` if the backend rejected it.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(cache = %self.key, key, error = %e, "cache value not serializable");
                return false;
            }
        };
        match &self.backend {
            Backend::Shared(store) => store.insert(&self.key, key, value),
            Backend::File(store) => store.write(&self.key, key, &value),
            Backend::Disabled => true,
        }
    }

    /// Drop every entry of this instance.
    ///
    /// The file backend resets its whole directory, including entries of other
    /// instances pointed at the same directory.
    pub fn clear(&self) -> bool {
        match &self.backend {
            Backend::Shared(store) => store.clear(&self.key),
            Backend::File(store) => match store.clear() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(cache = %self.key, error = %e, "failed to reset cache directory");
                    false
                }
            },
            Backend::Disabled => true,
        }
    }

    /// Number of stored entries, `None` when disabled.
    ///
    /// The file backend counts every entry file in its directory, so instances
    /// sharing a directory see each other's entries in this count.
    pub fn count(&self) -> Option<usize> {
        match &self.backend {
            Backend::Shared(store) => Some(store.count(&self.key)),
            Backend::File(store) => Some(store.count()),
            Backend::Disabled => None,
        }
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// `compute` is called again on later calls for as long as it returns
    /// `None`.
    pub fn define<T, F>(&self, key: &str, compute: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Option<T>,
    {
        self.define_with(key, compute, None, false)
    }

    /// [`Cache::define`] with a hit callback and a per-call bypass.
    ///
    /// `on_hit` runs before the stored value is read. With `bypass` set, or
    /// on a disabled instance, `compute` always runs and nothing is stored.
    pub fn define_with<T, F>(&self, key: &str, compute: F, on_hit: Option<&dyn Fn()>, bypass: bool) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Option<T>,
    {
        match self.try_define_with::<T, Infallible, _>(key, || Ok(compute()), on_hit, bypass) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible [`Cache::define`]. A compute error is returned as-is and
    /// nothing is stored.
    pub fn try_define<T, E, F>(&self, key: &str, compute: F) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<Option<T>, E>,
    {
        self.try_define_with(key, compute, None, false)
    }

    /// Fallible [`Cache::define_with`].
    pub fn try_define_with<T, E, F>(
        &self, key: &str, compute: F, on_hit: Option<&dyn Fn()>, bypass: bool,
    ) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<Option<T>, E>,
    {
        if bypass || !self.is_active() {
            return compute();
        }

        if self.has(key) {
            if let Some(on_hit) = on_hit {
                on_hit();
            }
            if let Some(value) = self.get(key) {
                return Ok(Some(value));
            }
            tracing::debug!(cache = %self.key, key, "cached value is empty, recomputing");
        }

        let result = compute()?;
        if let Some(value) = &result {
            self.set(key, value);
        }
        Ok(result)
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: Value) -> Option<T> {
    if raw.is_null() {
        return None;
    }
    match serde_json::from_value(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(key, error = %e, "cached value has unexpected shape");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn shared_cache(key: &str, store: &SharedStore) -> Cache {
        Cache::new(key, CacheMethod::Shared, None, false, Some(store.clone())).unwrap()
    }

    #[test]
    fn test_auto_prefers_shared_store() {
        let tmp = tempfile::tempdir().unwrap();
        let cache =
            Cache::new("app:", CacheMethod::Auto, Some(tmp.path().into()), false, Some(SharedStore::new())).unwrap();
        assert_eq!(cache.method(), CacheMethod::Shared);
    }

    #[test]
    fn test_auto_falls_back_to_file() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::new("app:", CacheMethod::Auto, Some(tmp.path().join("c")), false, None).unwrap();
        assert_eq!(cache.method(), CacheMethod::File);
        assert!(tmp.path().join("c").is_dir());
    }

    #[test]
    fn test_file_without_path_is_rejected() {
        let err = Cache::new("app:", CacheMethod::File, None, false, None).unwrap_err();
        assert!(matches!(err, Error::InvalidCachePath(_)));
        let err = Cache::new("app:", CacheMethod::Auto, None, false, None).unwrap_err();
        assert!(matches!(err, Error::InvalidCachePath(_)));
    }

    #[test]
    fn test_disabled_skips_path_check() {
        let cache = Cache::new("app:", CacheMethod::File, None, true, None).unwrap();
        assert_eq!(cache.method(), CacheMethod::None);
        assert!(!cache.is_active());
        assert_eq!(cache.count(), None);
    }

    #[test]
    fn test_set_get_has_shared() {
        let cache = shared_cache("app:", &SharedStore::new());
        assert!(!cache.has("answer"));
        assert!(cache.set("answer", &42));
        assert!(cache.has("answer"));
        assert_eq!(cache.get::<i32>("answer"), Some(42));
        assert_eq!(cache.get::<String>("answer"), None);
    }

    #[test]
    fn test_set_get_file() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::new("app:", CacheMethod::File, Some(tmp.path().into()), false, None).unwrap();
        assert!(cache.set("list", &vec!["a", "b"]));
        assert_eq!(cache.get::<Vec<String>>("list"), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(cache.count(), Some(1));
        assert!(cache.clear());
        assert!(!cache.has("list"));
    }

    #[test]
    fn test_prefixes_isolate_instances() {
        let store = SharedStore::new();
        let views = shared_cache("views:", &store);
        let data = shared_cache("data:", &store);
        views.set("home", &"<html>");
        assert!(!data.has("home"));

        data.set("home", &1);
        assert!(views.clear());
        assert!(!views.has("home"));
        assert!(data.has("home"));
    }

    #[test]
    fn test_instance_key_that_prefixes_another_is_isolated() {
        let store = SharedStore::new();
        let a = shared_cache("a", &store);
        let ab = shared_cache("ab", &store);

        ab.set("k", &1);
        a.set("bk", &"from a");
        assert_eq!(ab.get::<i32>("k"), Some(1));

        assert!(a.clear());
        assert!(ab.has("k"));
        assert_eq!(ab.count(), Some(1));
        assert_eq!(a.count(), Some(0));
    }

    #[test]
    fn test_file_instance_key_that_prefixes_another_is_isolated() {
        let tmp = tempfile::tempdir().unwrap();
        let a = Cache::new("a", CacheMethod::File, Some(tmp.path().into()), false, None).unwrap();
        let ab = Cache::new("ab", CacheMethod::File, Some(tmp.path().into()), false, None).unwrap();

        ab.set("k", &1);
        a.set("bk", &"from a");
        assert_eq!(ab.get::<i32>("k"), Some(1));
        assert_eq!(a.get::<String>("bk"), Some("from a".to_string()));
        assert_eq!(a.count(), Some(2));
    }

    #[test]
    fn test_define_memoizes_when_enabled() {
        let cache = shared_cache("app:", &SharedStore::new());
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Some(calls.get())
        };
        assert_eq!(cache.define("counter", compute), Some(1));
        assert_eq!(cache.define("counter", compute), Some(1));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_define_memoizes_with_file_backend() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::new("app:", CacheMethod::File, Some(tmp.path().into()), false, None).unwrap();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Some(format!("v{}", calls.get()))
        };
        assert_eq!(cache.define("k", compute), Some("v1".to_string()));
        assert_eq!(cache.define("k", compute), Some("v1".to_string()));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_define_recomputes_when_disabled() {
        let cache = Cache::new("app:", CacheMethod::Shared, None, true, None).unwrap();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Some(calls.get())
        };
        assert_eq!(cache.define("counter", compute), Some(1));
        assert_eq!(cache.define("counter", compute), Some(2));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_define_bypass_does_not_store() {
        let cache = shared_cache("app:", &SharedStore::new());
        assert_eq!(cache.define_with("k", || Some(1), None, true), Some(1));
        assert!(!cache.has("k"));
    }

    #[test]
    fn test_define_none_is_not_stored() {
        let cache = shared_cache("app:", &SharedStore::new());
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            None::<i32>
        };
        assert_eq!(cache.define("k", compute), None);
        assert_eq!(cache.define("k", compute), None);
        assert_eq!(calls.get(), 2);
        assert!(!cache.has("k"));
    }

    #[test]
    fn test_define_on_hit_runs_only_on_hit() {
        let cache = shared_cache("app:", &SharedStore::new());
        let hits = Cell::new(0);
        let on_hit = || hits.set(hits.get() + 1);
        cache.define_with("k", || Some(1), Some(&on_hit), false);
        assert_eq!(hits.get(), 0);
        cache.define_with("k", || Some(1), Some(&on_hit), false);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_define_recomputes_stored_null() {
        let cache = shared_cache("app:", &SharedStore::new());
        assert!(cache.set("k", &Value::Null));
        assert!(cache.has("k"));
        assert_eq!(cache.define("k", || Some(5)), Some(5));
        assert_eq!(cache.get::<i32>("k"), Some(5));
    }

    #[test]
    fn test_try_define_propagates_error() {
        let cache = shared_cache("app:", &SharedStore::new());
        let result: Result<Option<i32>, &str> = cache.try_define("k", || Err("boom"));
        assert_eq!(result, Err("boom"));
        assert!(!cache.has("k"));
    }
}
