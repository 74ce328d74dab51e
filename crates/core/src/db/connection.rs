//! Database connection management with pragma configuration.
//!
//! Opens the SQLite database on a background thread and applies the pragmas
//! every model table relies on. Schema changes are left to
//! [`migrate`](super::migrations::migrate).

use std::path::Path;

use tokio_rusqlite::Connection;

use crate::Error;

/// Database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Clones share the same connection.
#[derive(Clone, Debug)]
pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist. WAL journaling is applied when
    /// `enable_wal` is set; writes are always fully synchronous.
    pub async fn open(path: impl AsRef<Path>, enable_wal: bool) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        configure(&conn, enable_wal).await?;
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        configure(&conn, false).await?;
        Ok(Self { conn })
    }

    /// Underlying async connection, for queries outside the record layer.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

async fn configure(conn: &Connection, enable_wal: bool) -> Result<(), Error> {
    conn.call(move |conn| {
        if enable_wal {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }
        conn.execute_batch(
            "PRAGMA synchronous=FULL;
             PRAGMA foreign_keys=ON;",
        )?;
        Ok(())
    })
    .await
    .map_err(Error::Database)
}
