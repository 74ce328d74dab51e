//! Unified error types for nano.
//!
//! Messages carry an upper-case tag so callers and logs can group failures
//! without matching on the variant.

use tokio_rusqlite::rusqlite;

/// Unified error type for the nano core crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A cache instance was looked up before it was created.
    #[error("CACHE_NOT_INITIALIZED: no cache instance registered under '{0}'")]
    CacheNotInitialized(String),

    /// Unknown cache method string.
    #[error("CACHE_ERROR: invalid cache method '{0}'")]
    InvalidCacheMethod(String),

    /// The file backend was selected without a usable directory.
    #[error("CACHE_ERROR: invalid cache path: {0}")]
    InvalidCachePath(String),

    /// Cache directory could not be created or reset.
    #[error("CACHE_ERROR: {0}")]
    CacheIo(#[from] std::io::Error),

    /// Value could not be encoded or decoded.
    #[error("SERIALIZE_ERROR: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Database operation failed.
    #[error("DATABASE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration of a model table failed.
    #[error("MIGRATION_FAILED: {0}")]
    MigrationFailed(String),

    /// Table or column name is not a plain SQL identifier.
    #[error("INVALID_IDENTIFIER: '{0}'")]
    InvalidIdentifier(String),

    /// Invalid input parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
