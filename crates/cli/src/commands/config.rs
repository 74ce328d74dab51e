//! `nano config` and `nano stache` handlers.

use anyhow::{Context, Result};
use nano_core::config::env_value;
use nano_core::{AppConfig, dotpath};
use serde_json::Value;

use super::print_json;
use crate::args::ConfigCmd;

pub fn handle(config: &AppConfig, action: ConfigCmd) -> Result<()> {
    print_json(&run(config, action))
}

/// Value printed by a config command; null for a missing path or variable.
pub fn run(config: &AppConfig, action: ConfigCmd) -> Value {
    match action {
        ConfigCmd::Get { path } => {
            let tree = config.to_tree();
            match path {
                Some(path) => dotpath::get(&tree, &path).cloned().unwrap_or(Value::Null),
                None => tree,
            }
        }
        ConfigCmd::Env { key } => env_value(&key).unwrap_or(Value::Null),
    }
}

pub fn stache(template: &str, values: &str) -> Result<()> {
    println!("{}", render(template, values)?);
    Ok(())
}

/// Render `template` against `values`, a JSON document.
pub fn render(template: &str, values: &str) -> Result<String> {
    let values: Value = serde_json::from_str(values).context("--values must be JSON")?;
    Ok(dotpath::stache(template, &values))
}
