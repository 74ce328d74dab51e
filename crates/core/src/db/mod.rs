//! SQLite-backed model tables.
//!
//! - [`Database`]: connection with pragma configuration
//! - [`Model`]: table structure and upgrade hooks
//! - [`migrations`]: the per-table version loop
//! - [`Table`]: typed records over a migrated table

pub mod connection;
pub mod migrations;
pub mod model;
pub mod records;
pub mod sql;

pub use connection::Database;
pub use migrations::{MigrationOutcome, MigrationReport, migrate, migrate_all, table_version};
pub use model::{Model, StepModel};
pub use records::{Direction, Filter, Order, Page, PageOptions, Record, Table};
