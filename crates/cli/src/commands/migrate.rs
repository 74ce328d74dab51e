//! `nano migrate` handler.
//!
//! The manifest lists one `[[table]]` entry per model:
//!
//! ```toml
//! [[table]]
//! table = "posts"
//! structure = "title TEXT, body TEXT"
//! upgrades = ["ALTER TABLE posts ADD COLUMN slug TEXT"]
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use nano_core::db::{MigrationReport, migrate_all};
use nano_core::{AppConfig, Database, Model, StepModel};
use serde::Deserialize;
use serde_json::{Value, json};

use super::print_json;

#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(rename = "table", default)]
    pub tables: Vec<StepModel>,
}

impl Manifest {
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("invalid migration manifest")
    }

    pub fn models(self) -> Vec<Arc<dyn Model>> {
        self.tables
            .into_iter()
            .map(|t| Arc::new(t) as Arc<dyn Model>)
            .collect()
    }
}

pub async fn handle(config: &AppConfig, manifest: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(manifest).with_context(|| format!("reading {}", manifest.display()))?;
    let models = Manifest::parse(&raw)?.models();

    let db = Database::open(&config.db_path, config.enable_wal)
        .await
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    tracing::info!(manifest = %manifest.display(), models = models.len(), "migrating");
    let reports = migrate_all(&db, &models).await;
    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    print_json(&reports.iter().map(report_json).collect::<Vec<_>>())?;

    if failed > 0 {
        tracing::warn!(failed, total = reports.len(), "migration finished with failures");
        anyhow::bail!("{failed} of {} models failed to migrate", reports.len());
    }
    Ok(())
}

fn report_json(report: &MigrationReport) -> Value {
    match &report.result {
        Ok(outcome) => json!({ "table": report.table, "ok": true, "outcome": outcome }),
        Err(e) => json!({ "table": report.table, "ok": false, "error": e.to_string() }),
    }
}
