//! `nano cache` handlers.
//!
//! The CLI runs as a one-shot process, so no shared memory store outlives
//! it: `auto` resolves to the file backend here.

use anyhow::{Context, Result};
use nano_core::{AppConfig, Cache};
use serde_json::Value;

use super::print_json;
use crate::args::CacheCmd;

pub fn open(config: &AppConfig) -> Result<Cache> {
    let settings = &config.cache;
    Cache::new(settings.prefix.clone(), settings.method, settings.path.clone(), settings.disabled, None)
        .context("creating application cache")
}

pub fn handle(config: &AppConfig, action: CacheCmd) -> Result<()> {
    let cache = open(config)?;

    match action {
        CacheCmd::Has { key } => print_json(&cache.has(&key)),
        CacheCmd::Get { key } => print_json(&cache.get::<Value>(&key)),
        CacheCmd::Set { key, value } => {
            let value = parse_value(&value);
            if !cache.set(&key, &value) {
                anyhow::bail!("cache rejected value for '{key}'");
            }
            print_json(&true)
        }
        CacheCmd::Clear => print_json(&cache.clear()),
        CacheCmd::Count => print_json(&cache.count()),
    }
}

/// Parse `raw` as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nano_core::CacheMethod;
    use nano_core::config::CacheSettings;
    use serde_json::json;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("{\"a\":1}"), json!({ "a": 1 }));
        assert_eq!(parse_value("12"), json!(12));
        assert_eq!(parse_value("hello"), json!("hello"));
    }

    #[test]
    fn test_open_auto_uses_files() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            cache: CacheSettings {
                method: CacheMethod::Auto,
                path: Some(tmp.path().join("cache")),
                prefix: "cli_".into(),
                disabled: false,
            },
            ..Default::default()
        };

        let cache = open(&config).unwrap();
        assert_eq!(cache.method(), CacheMethod::File);
        assert!(cache.set("k", &json!([1, 2])));

        let reopened = open(&config).unwrap();
        assert_eq!(reopened.get::<Value>("k"), Some(json!([1, 2])));
    }
}
