//! Subcommand handlers.

pub mod cache;
pub mod config;
pub mod migrate;
pub mod table;

use std::path::Path;

use anyhow::{Context, Result};
use nano_core::AppConfig;
use serde::Serialize;

/// Load configuration from `path` if given, else from the environment.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    config.context("loading configuration")
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
