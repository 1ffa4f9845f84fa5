// Finance Ledger - Core Library
// Transaction store, ledger queries and the text shell, shared by the CLI and tests

pub mod config;
pub mod db;
pub mod ledger;
pub mod shell;

// Only compile the browser when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use config::{Config, OutputFormat};
pub use db::{
    setup_database, Store, StoreError, Transaction, TransactionKind, TIMESTAMP_FORMAT,
};
pub use ledger::{Ledger, Summary};
pub use shell::{format_balance, format_summary, format_transactions, parse_amount, Shell};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
