//! Directory-backed store: one JSON file per entry.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::hash::entry_file_name;

/// Store writing each entry to `<dir>/<sha256(namespace, key)>`.
///
/// The directory is not partitioned by namespace: [`FileStore::clear`] and
/// [`FileStore::count`] act on every entry in it.
///
/// Reads and writes are best-effort. Failures are logged at debug level and
/// surface as a missing entry or a `false` return.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open the store, creating the directory if it doesn't exist.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.dir.join(entry_file_name(namespace, key))
    }

    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.entry_path(namespace, key).is_file()
    }

    pub fn read(&self, namespace: &str, key: &str) -> Option<Value> {
        let path = self.entry_path(namespace, key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cache file unreadable");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cache file undecodable");
                None
            }
        }
    }

    pub fn write(&self, namespace: &str, key: &str, value: &Value) -> bool {
        let path = self.entry_path(namespace, key);
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cache value not serializable");
                return false;
            }
        };
        match fs::write(&path, bytes) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cache file not written");
                false
            }
        }
    }

    /// Remove the whole directory and recreate it empty.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        fs::create_dir_all(&self.dir)
    }

    /// Number of entry files currently in the directory.
    pub fn count(&self) -> usize {
        fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                    .count()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_creates_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b/cache");
        let store = FileStore::open(&dir).unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_write_then_read() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        assert!(store.write("views:", "home", &json!({ "title": "Home" })));
        assert!(store.contains("views:", "home"));
        assert!(!store.contains("data:", "home"));
        assert_eq!(store.read("views:", "home"), Some(json!({ "title": "Home" })));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_corrupt_file_reads_as_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        fs::write(tmp.path().join(entry_file_name("app:", "broken")), b"{not json").unwrap();
        assert!(store.contains("app:", "broken"));
        assert_eq!(store.read("app:", "broken"), None);
    }

    #[test]
    fn test_clear_resets_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path().join("cache")).unwrap();
        store.write("app:", "a", &json!(1));
        store.write("app:", "b", &json!(2));
        store.clear().unwrap();
        assert!(store.dir().is_dir());
        assert_eq!(store.count(), 0);
    }
}
