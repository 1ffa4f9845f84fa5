use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use tracing_subscriber::EnvFilter;

use finance_ledger::{
    format_balance, format_summary, format_transactions, Config, Ledger, OutputFormat, Shell,
    Store, TransactionKind,
};

/// Personal finance ledger: record income and expenses, see where you stand.
#[derive(Parser)]
#[command(name = "finance-ledger")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive numbered menu (default)
    Menu,
    /// Record an income
    AddIncome {
        /// Amount in currency units, greater than zero
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Optional description
        #[arg(default_value = "")]
        description: String,
    },
    /// Record an expense
    AddExpense {
        /// Amount in currency units, greater than zero
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Optional description
        #[arg(default_value = "")]
        description: String,
    },
    /// Print the current balance
    Balance,
    /// List all transactions, most recent first
    Transactions,
    /// Print totals and counts
    Summary,
    /// Browse the ledger full-screen
    #[cfg(feature = "tui")]
    Browse,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.config.log_level);

    let config = cli.config;
    let store = Store::open(&config.db_path, config.pool_size)
        .with_context(|| format!("Failed to open ledger at {}", config.db_path.display()))?;

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => {
            let stdin = io::stdin();
            Shell::new(&store, stdin.lock(), io::stdout()).run()?;
        }
        Commands::AddIncome {
            amount,
            description,
        } => add(&store, TransactionKind::Income, amount, &description, config.output)?,
        Commands::AddExpense {
            amount,
            description,
        } => add(&store, TransactionKind::Expense, amount, &description, config.output)?,
        Commands::Balance => {
            let balance = Ledger::new(&store).balance()?;
            match config.output {
                OutputFormat::Text => println!("{}", format_balance(balance)),
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "balance": balance }))
                }
            }
        }
        Commands::Transactions => {
            let transactions = Ledger::new(&store).list_all()?;
            match config.output {
                OutputFormat::Text => println!("{}", format_transactions(&transactions)),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&transactions)?)
                }
            }
        }
        Commands::Summary => {
            let summary = Ledger::new(&store).summary()?;
            match config.output {
                OutputFormat::Text => println!("{}", format_summary(&summary)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            }
        }
        #[cfg(feature = "tui")]
        Commands::Browse => run_browser(&store)?,
    }

    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn add(
    store: &Store,
    kind: TransactionKind,
    amount: f64,
    description: &str,
    output: OutputFormat,
) -> Result<()> {
    let id = store
        .insert(kind, amount, description)
        .with_context(|| format!("Failed to record {kind}"))?;

    match output {
        OutputFormat::Text => println!("Recorded {kind} #{id} of ${amount:.2}"),
        OutputFormat::Json => {
            let tx = store.get(id)?;
            println!("{}", serde_json::to_string_pretty(&tx)?);
        }
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_browser(store: &Store) -> Result<()> {
    let ledger = Ledger::new(store);
    let transactions = ledger.list_all()?;
    let summary = ledger.summary()?;

    let mut app = finance_ledger::ui::App::new(transactions, summary);
    finance_ledger::ui::run_ui(&mut app)
}
