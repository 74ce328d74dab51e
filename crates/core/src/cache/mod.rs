//! Cache facade over an in-process shared store or a directory of files.
//!
//! A [`Cache`] instance is bound to a key that namespaces every entry it
//! touches. The backend is picked once, when the instance is created:
//!
//! - `apcu`: entries live in a [`SharedStore`], shared by every instance
//!   created from the same registry
//! - `file`: one JSON file per entry, named by the SHA-256 of the instance
//!   key and entry key
//! - `none`: nothing is stored, [`Cache::define`] always computes
//! - `auto`: `apcu` when a shared store is available, `file` otherwise
//!
//! There is no TTL and no eviction: entries live until [`Cache::clear`].

pub mod file;
pub mod hash;
pub mod instance;
pub mod method;
pub mod registry;
pub mod shared;

pub use crate::Error;

pub use file::FileStore;
pub use instance::Cache;
pub use method::CacheMethod;
pub use registry::CacheRegistry;
pub use shared::SharedStore;
