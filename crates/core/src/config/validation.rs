//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `db_path` is empty, and
    /// `ConfigError::Missing` if the cache method needs a directory and
    /// none is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "db_path".into(), reason: "must not be empty".into() });
        }

        let has_path = self.cache.path.as_ref().is_some_and(|p| !p.as_os_str().is_empty());
        if !self.cache.disabled && self.cache.method.needs_path() && !has_path {
            return Err(ConfigError::Missing {
                field: "cache.path".into(),
                hint: format!("cache method '{}' stores files; set NANO_CACHE__PATH", self.cache.method),
            });
        }

        if self.cache.prefix.is_empty() {
            tracing::warn!("cache.prefix is empty; cache instances sharing a store will see each other's keys");
        }

        Ok(())
    }
}
