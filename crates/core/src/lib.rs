//! Core building blocks for nano applications.
//!
//! This crate provides:
//! - Dot-path get/set/add over nested JSON trees, plus `{{path}}` templating
//! - A cache facade over shared memory or files, with compute-and-memoize
//! - Versioned schema migrations and a typed record layer on SQLite
//! - Layered configuration and a unified error type

pub mod cache;
pub mod config;
pub mod db;
pub mod dotpath;
pub mod error;

pub use cache::{Cache, CacheMethod, CacheRegistry, SharedStore};
pub use config::{AppConfig, ConfigError};
pub use db::{Database, Model, Record, StepModel, Table};
pub use error::Error;
