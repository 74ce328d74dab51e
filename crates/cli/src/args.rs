//! Command-line surface for `nano`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "nano", version, about = "Nano application tooling: migrations, cache, config", long_about = None)]
pub struct Cli {
    /// TOML configuration file (defaults to NANO_CONFIG_FILE, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create and upgrade model tables from a schema manifest
    Migrate {
        /// TOML manifest with one [[table]] entry per model
        #[arg(long, short)]
        manifest: PathBuf,
    },
    /// Inspect or modify the application cache
    Cache {
        #[command(subcommand)]
        action: CacheCmd,
    },
    /// Inspect the loaded configuration
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
    /// Read rows of a migrated table
    Table {
        #[command(subcommand)]
        action: TableCmd,
    },
    /// Render a {{path}} template against JSON values
    Stache {
        template: String,
        /// JSON object the placeholders are resolved against
        #[arg(long, default_value = "{}")]
        values: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCmd {
    /// Print whether the key is cached
    Has { key: String },
    /// Print the cached JSON value
    Get { key: String },
    /// Store a JSON value (bare words are stored as strings)
    Set { key: String, value: String },
    /// Drop every entry of the application cache
    Clear,
    /// Print the number of stored entries
    Count,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCmd {
    /// Print the configuration, or the value at a dot-path
    Get { path: Option<String> },
    /// Print an environment variable coerced to JSON
    Env { key: String },
}

#[derive(Subcommand, Debug)]
pub enum TableCmd {
    /// Print one page of rows
    List {
        table: String,
        #[arg(long, default_value_t = 0)]
        page: u64,
        #[arg(long, default_value_t = 10)]
        length: u64,
        /// Search text matched with LIKE against --columns
        #[arg(long)]
        search: Option<String>,
        /// Comma-separated columns to search in
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        /// Search each word separately
        #[arg(long)]
        explode: bool,
        #[arg(long, default_value = "updated_at")]
        order_by: String,
        #[arg(long)]
        asc: bool,
        /// Columns holding JSON-encoded values
        #[arg(long, value_delimiter = ',')]
        json_columns: Vec<String>,
    },
    /// Print the row with the given id
    Get {
        table: String,
        id: i64,
        #[arg(long, value_delimiter = ',')]
        json_columns: Vec<String>,
    },
    /// Delete the row with the given id
    Delete { table: String, id: i64 },
}
