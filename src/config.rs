//! Runtime configuration.
//!
//! Every setting can come from a CLI flag or an environment variable, with
//! defaults that work from any directory.

use clap::Args;
use std::path::PathBuf;

/// Output format for the one-shot commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Path to the SQLite data file
    #[arg(short, long, env = "LEDGER_DB_PATH", default_value = "finance.db", global = true)]
    pub db_path: PathBuf,

    /// Maximum number of pooled connections to the data file
    #[arg(long, env = "LEDGER_POOL_SIZE", default_value_t = 2, global = true)]
    pub pool_size: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", global = true)]
    pub output: OutputFormat,
}

impl Config {
    /// Configuration pointing at a specific data file, everything else default.
    pub fn with_db_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("finance.db"),
            pool_size: 2,
            log_level: "warn".into(),
            output: OutputFormat::Text,
        }
    }
}
