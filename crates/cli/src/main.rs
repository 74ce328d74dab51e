//! nano command-line entry point.
//!
//! Results are printed as JSON on stdout; logs go to stderr so output can be
//! piped.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Migrate { manifest } => commands::migrate::handle(&config, &manifest).await?,
        Commands::Cache { action } => commands::cache::handle(&config, action)?,
        Commands::Config { action } => commands::config::handle(&config, action)?,
        Commands::Table { action } => commands::table::handle(&config, action).await?,
        Commands::Stache { template, values } => commands::config::stache(&template, &values)?,
    }

    Ok(())
}
