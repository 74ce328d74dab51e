//! Model tables and their upgrade hooks.

use serde::Deserialize;
use tokio_rusqlite::rusqlite::Connection;

use crate::Error;

/// Columns every model table starts with.
pub const BASE_COLUMNS: &str = "id INTEGER PRIMARY KEY AUTOINCREMENT, created_at INTEGER, updated_at INTEGER";

/// A table whose schema is created once and then upgraded version by version.
///
/// Hooks run on the database thread with a plain rusqlite connection.
pub trait Model: Send + Sync + 'static {
    /// Table name. Must be a plain SQL identifier.
    fn table_name(&self) -> &str;

    /// Column definitions appended after [`BASE_COLUMNS`] when the table is
    /// first created, e.g. `"title TEXT NOT NULL, tags TEXT"`.
    fn structure(&self) -> String {
        String::new()
    }

    /// Upgrade the table to `version`.
    ///
    /// Return `Ok(false)` when there is no upgrade for `version`; the loop
    /// stops there and anything this call changed is rolled back.
    fn upgrade(&self, _conn: &Connection, _version: i64) -> Result<bool, Error> {
        Ok(false)
    }

    /// Called once after the upgrade loop with the final version.
    fn after_upgrade(&self, _conn: &Connection, _version: i64) -> Result<(), Error> {
        Ok(())
    }
}

/// Model described by data: upgrade `n` runs the `n`-th SQL batch.
#[derive(Debug, Clone, Deserialize)]
pub struct StepModel {
    pub table: String,

    #[serde(default)]
    pub structure: String,

    /// SQL batches; index 0 upgrades to version 1.
    #[serde(default)]
    pub upgrades: Vec<String>,
}

impl StepModel {
    pub fn new(table: impl Into<String>, structure: impl Into<String>) -> Self {
        Self { table: table.into(), structure: structure.into(), upgrades: Vec::new() }
    }

    pub fn with_upgrade(mut self, sql: impl Into<String>) -> Self {
        self.upgrades.push(sql.into());
        self
    }
}

impl Model for StepModel {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn structure(&self) -> String {
        self.structure.clone()
    }

    fn upgrade(&self, conn: &Connection, version: i64) -> Result<bool, Error> {
        let step = usize::try_from(version - 1).ok().and_then(|i| self.upgrades.get(i));
        match step {
            Some(sql) => {
                conn.execute_batch(sql)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_model_runs_batches_in_order() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE posts (id INTEGER PRIMARY KEY)").unwrap();
        let model = StepModel::new("posts", "")
            .with_upgrade("ALTER TABLE posts ADD COLUMN title TEXT")
            .with_upgrade("ALTER TABLE posts ADD COLUMN body TEXT");

        assert!(model.upgrade(&conn, 1).unwrap());
        assert!(model.upgrade(&conn, 2).unwrap());
        assert!(!model.upgrade(&conn, 3).unwrap());
        assert!(!model.upgrade(&conn, 0).unwrap());
        conn.execute("INSERT INTO posts (title, body) VALUES ('t', 'b')", []).unwrap();
    }

    #[test]
    fn test_step_model_defaults() {
        let model: StepModel = serde_json::from_value(serde_json::json!({
            "table": "tags",
            "structure": "name TEXT",
        }))
        .unwrap();
        assert_eq!(model.table_name(), "tags");
        assert!(model.upgrades.is_empty());
    }
}
