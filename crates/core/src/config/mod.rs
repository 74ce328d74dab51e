//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (NANO_*)
//! 2. TOML config file (if NANO_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::CacheMethod;

mod env;
mod validation;

pub use env::{env_value, parse_env_value};
pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (NANO_*, nested with `__`)
/// 2. TOML config file (if NANO_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database.
    ///
    /// Set via NANO_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Whether the database runs in WAL journal mode.
    ///
    /// Set via NANO_ENABLE_WAL environment variable.
    #[serde(default = "default_true")]
    pub enable_wal: bool,

    /// Cache backend settings.
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Settings for the application cache instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// `apcu`, `file`, `none` or `auto`.
    ///
    /// Set via NANO_CACHE__METHOD environment variable.
    #[serde(default = "default_cache_method")]
    pub method: CacheMethod,

    /// Directory for the file backend.
    ///
    /// Set via NANO_CACHE__PATH environment variable.
    #[serde(default = "default_cache_path")]
    pub path: Option<PathBuf>,

    /// Prefix of every key stored by the application cache.
    ///
    /// Set via NANO_CACHE__PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,

    /// Keep the cache API working but never store anything.
    ///
    /// Set via NANO_CACHE__DISABLED environment variable.
    #[serde(default)]
    pub disabled: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./nano.sqlite")
}

fn default_true() -> bool {
    true
}

fn default_cache_method() -> CacheMethod {
    CacheMethod::Auto
}

fn default_cache_path() -> Option<PathBuf> {
    Some(PathBuf::from("./cache"))
}

fn default_cache_prefix() -> String {
    "_nano_".into()
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            method: default_cache_method(),
            path: default_cache_path(),
            prefix: default_cache_prefix(),
            disabled: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { db_path: default_db_path(), enable_wal: true, cache: CacheSettings::default() }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `NANO_`
    /// 2. TOML file from `NANO_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("NANO_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("NANO_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        Self::extract(figment)
    }

    /// Load from an explicit TOML file, still honouring `NANO_*` overrides.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.into()))
            .merge(
                Env::prefixed("NANO_")
                    .ignore(&["CONFIG_FILE"])
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            );

        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The whole configuration as a JSON tree, for dot-path lookups.
    pub fn to_tree(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
