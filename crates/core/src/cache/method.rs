//! Cache backend selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Backend requested for a cache instance.
///
/// Parsed from the configuration strings `"apcu"`, `"file"`, `"none"` and
/// `"auto"`. `"memory"` is accepted as an alias of `"apcu"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMethod {
    /// In-process shared memory store.
    #[serde(rename = "apcu", alias = "memory")]
    Shared,
    /// One serialized file per entry.
    File,
    /// Caching disabled; the API still works.
    None,
    /// Shared memory when available, file otherwise.
    Auto,
}

impl CacheMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMethod::Shared => "apcu",
            CacheMethod::File => "file",
            CacheMethod::None => "none",
            CacheMethod::Auto => "auto",
        }
    }

    /// Whether this method stores entries on disk (directly or as fallback).
    pub fn needs_path(&self) -> bool {
        matches!(self, CacheMethod::File | CacheMethod::Auto)
    }
}

impl fmt::Display for CacheMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apcu" | "memory" => Ok(CacheMethod::Shared),
            "file" => Ok(CacheMethod::File),
            "none" => Ok(CacheMethod::None),
            "auto" => Ok(CacheMethod::Auto),
            _ => Err(Error::InvalidCacheMethod(s.to_string())),
        }
    }
}
