//! File names for file-backed cache entries.

use sha2::{Digest, Sha256};

/// Compute the file name of a cache entry from its instance key and entry key.
///
/// The two are hashed with a NUL byte between them, so `("a", "bk")` and
/// `("ab", "k")` name different files.
pub fn entry_file_name(namespace: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update([0u8]);
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
