//! Versioned schema migrations for model tables.
//!
//! Each model table has one row in `table_versions` holding the last
//! upgrade applied to it. Migrating a model:
//!
//! 1. creates the table from [`Model::structure`] if it doesn't exist
//! 2. reads the stored version, inserting it at 0 on first run
//! 3. calls [`Model::upgrade`] with `version + 1` until it returns `false`
//! 4. calls [`Model::after_upgrade`] once with the final version
//!
//! Every upgrade runs in a savepoint together with its version bump, so the
//! stored version always matches the schema: a step that returns `false` or
//! fails is rolled back.

use std::sync::Arc;

use serde::Serialize;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{Connection, OptionalExtension};

use super::connection::Database;
use super::model::{BASE_COLUMNS, Model};
use super::sql::ensure_identifier;
use crate::Error;

/// Table tracking the schema version of every model table.
pub const VERSIONS_TABLE: &str = "table_versions";

/// Result of migrating one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    pub table: String,
    /// The table did not exist before this run.
    pub created: bool,
    pub from: i64,
    pub to: i64,
}

/// Outcome of one model within [`migrate_all`].
#[derive(Debug)]
pub struct MigrationReport {
    pub table: String,
    pub result: Result<MigrationOutcome, Error>,
}

/// Create and upgrade a single model table.
///
/// # Errors
///
/// Returns an error if the table name is not an identifier, if table
/// creation fails, or if an upgrade hook fails. Upgrades applied before the
/// failing one stay applied and recorded.
pub async fn migrate(db: &Database, model: Arc<dyn Model>) -> Result<MigrationOutcome, Error> {
    let outcome = db
        .conn
        .call(move |conn| -> Result<MigrationOutcome, Error> { run(conn, model.as_ref()) })
        .await
        .map_err(Error::from)?;

    tracing::info!(
        table = %outcome.table,
        created = outcome.created,
        from = outcome.from,
        to = outcome.to,
        "model migrated"
    );
    Ok(outcome)
}

/// Migrate every model in order, continuing past failures.
pub async fn migrate_all(db: &Database, models: &[Arc<dyn Model>]) -> Vec<MigrationReport> {
    let mut reports = Vec::with_capacity(models.len());
    for model in models {
        let table = model.table_name().to_string();
        let result = migrate(db, Arc::clone(model)).await;
        if let Err(e) = &result {
            tracing::warn!(table = %table, error = %e, "unable to migrate model");
        }
        reports.push(MigrationReport { table, result });
    }
    reports
}

/// Stored schema version of `table`, if it was ever migrated.
pub async fn table_version(db: &Database, table: &str) -> Result<Option<i64>, Error> {
    let table = table.to_string();
    db.conn
        .call(move |conn| -> Result<Option<i64>, Error> {
            if !table_exists(conn, VERSIONS_TABLE)? {
                return Ok(None);
            }
            read_version(conn, &table)
        })
        .await
        .map_err(Error::from)
}

fn run(conn: &mut Connection, model: &dyn Model) -> Result<MigrationOutcome, Error> {
    let table = model.table_name().to_string();
    ensure_identifier(&table)?;

    let created = !table_exists(conn, &table)?;
    if created {
        let structure = model.structure();
        let columns = if structure.trim().is_empty() {
            BASE_COLUMNS.to_string()
        } else {
            format!("{BASE_COLUMNS}, {structure}")
        };
        conn.execute_batch(&format!("CREATE TABLE {table} ({columns})"))?;
        tracing::debug!(table = %table, "created table");
    }

    let from = init_version(conn, &table)?;
    let mut version = from;

    loop {
        let next = version + 1;
        let savepoint = conn.savepoint()?;
        let upgraded = model
            .upgrade(&savepoint, next)
            .map_err(|e| Error::MigrationFailed(format!("{table}: upgrade to version {next} failed: {e}")))?;
        if !upgraded {
            // dropping the savepoint rolls back whatever the hook did
            break;
        }
        savepoint.execute(
            &format!("UPDATE {VERSIONS_TABLE} SET version = ?1 WHERE name = ?2"),
            params![next, table],
        )?;
        savepoint.commit()?;
        tracing::debug!(table = %table, version = next, "upgraded");
        version = next;
    }

    model.after_upgrade(conn, version)?;

    Ok(MigrationOutcome { table, created, from, to: version })
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, Error> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        params![table],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn read_version(conn: &Connection, table: &str) -> Result<Option<i64>, Error> {
    conn.query_row(
        &format!("SELECT version FROM {VERSIONS_TABLE} WHERE name = ?1"),
        params![table],
        |row| row.get(0),
    )
    .optional()
    .map_err(Error::from)
}

/// Ensure the versions table and this model's row exist; return its version.
fn init_version(conn: &Connection, table: &str) -> Result<i64, Error> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {VERSIONS_TABLE} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            version INTEGER NOT NULL DEFAULT 0
        )"
    ))?;

    match read_version(conn, table)? {
        Some(version) => Ok(version),
        None => {
            conn.execute(
                &format!("INSERT INTO {VERSIONS_TABLE} (name, version) VALUES (?1, 0)"),
                params![table],
            )?;
            Ok(0)
        }
    }
}
