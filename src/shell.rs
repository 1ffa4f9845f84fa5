//! Numbered text menu over the ledger.
//!
//! Parsing of user input and all display formatting live here; the store and
//! queries only ever see validated numbers.

use crate::db::{Store, StoreError, Transaction, TransactionKind};
use crate::ledger::{Ledger, Summary};
use anyhow::Result;
use std::io::{BufRead, Write};
use std::str::FromStr;

const BANNER: &str = "FINANCE MANAGEMENT SYSTEM";
const WIDE_RULE: usize = 50;
const TABLE_RULE: usize = 70;
const SUMMARY_RULE: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    AddIncome,
    AddExpense,
    ViewBalance,
    ViewTransactions,
    ViewSummary,
    Exit,
}

impl FromStr for MenuChoice {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(MenuChoice::AddIncome),
            "2" => Ok(MenuChoice::AddExpense),
            "3" => Ok(MenuChoice::ViewBalance),
            "4" => Ok(MenuChoice::ViewTransactions),
            "5" => Ok(MenuChoice::ViewSummary),
            "6" => Ok(MenuChoice::Exit),
            _ => Err(()),
        }
    }
}

/// Parse a user-typed amount. A leading `$` is tolerated.
pub fn parse_amount(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
    trimmed.parse().ok()
}

pub fn format_balance(balance: f64) -> String {
    format!("Current Balance: ${:.2}", balance)
}

pub fn format_transactions(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return "No transactions found.".to_string();
    }

    let rule = "-".repeat(TABLE_RULE);
    let mut lines = vec![
        "Transaction History:".to_string(),
        rule.clone(),
        format!("{:<3} {:<20} {:<8} {:<10} {}", "ID", "Date", "Type", "Amount", "Description"),
        rule,
    ];

    for tx in transactions {
        lines.push(format!(
            "{:<3} {:<20} {:<8} {}{:<9.2} {}",
            tx.id,
            tx.timestamp,
            tx.kind.as_str(),
            tx.kind.symbol(),
            tx.amount,
            tx.description
        ));
    }

    lines.join("\n")
}

pub fn format_summary(summary: &Summary) -> String {
    [
        "Financial Summary:".to_string(),
        "-".repeat(SUMMARY_RULE),
        format!(
            "Total Income: ${:.2} ({} transactions)",
            summary.total_income, summary.income_count
        ),
        format!(
            "Total Expenses: ${:.2} ({} transactions)",
            summary.total_expense, summary.expense_count
        ),
        format!("Net Balance: ${:.2}", summary.net_balance),
        format!("Total Transactions: {}", summary.total_count),
    ]
    .join("\n")
}

/// Interactive menu loop. Generic over its streams so it can be driven
/// from a script or a test as easily as from a terminal.
pub struct Shell<'a, R, W> {
    store: &'a Store,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(store: &'a Store, input: R, output: W) -> Self {
        Self {
            store,
            input,
            output,
        }
    }

    /// Run until the user picks Exit or input ends.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.print_menu()?;

            let Some(line) = self.prompt("Enter your choice (1-6): ")? else {
                writeln!(self.output)?;
                break;
            };

            match line.parse::<MenuChoice>() {
                Ok(MenuChoice::AddIncome) => self.add(TransactionKind::Income)?,
                Ok(MenuChoice::AddExpense) => self.add(TransactionKind::Expense)?,
                Ok(MenuChoice::ViewBalance) => {
                    let balance = Ledger::new(self.store).balance()?;
                    writeln!(self.output, "\n{}", format_balance(balance))?;
                }
                Ok(MenuChoice::ViewTransactions) => {
                    let transactions = Ledger::new(self.store).list_all()?;
                    writeln!(self.output, "\n{}", format_transactions(&transactions))?;
                }
                Ok(MenuChoice::ViewSummary) => {
                    let summary = Ledger::new(self.store).summary()?;
                    writeln!(self.output, "\n{}", format_summary(&summary))?;
                }
                Ok(MenuChoice::Exit) => {
                    writeln!(self.output, "Thank you for using Finance Management System!")?;
                    break;
                }
                Err(()) => writeln!(self.output, "Invalid choice! Please select 1-6.")?,
            }
        }

        self.output.flush()?;
        Ok(())
    }

    fn print_menu(&mut self) -> Result<()> {
        let heavy = "=".repeat(WIDE_RULE);
        writeln!(self.output, "\n{heavy}\n{BANNER}\n{heavy}")?;
        for (n, label) in [
            "Add Income",
            "Add Expense",
            "View Balance",
            "View Transactions",
            "View Summary",
            "Exit",
        ]
        .iter()
        .enumerate()
        {
            writeln!(self.output, "{}. {}", n + 1, label)?;
        }
        writeln!(self.output, "{}", "-".repeat(WIDE_RULE))?;
        Ok(())
    }

    fn add(&mut self, kind: TransactionKind) -> Result<()> {
        let Some(raw) = self.prompt(&format!("Enter {kind} amount: $"))? else {
            return Ok(());
        };
        let Some(amount) = parse_amount(&raw) else {
            writeln!(self.output, "Invalid amount! Please enter a valid number.")?;
            return Ok(());
        };
        let description = self
            .prompt("Enter description (optional): ")?
            .unwrap_or_default();

        match self.store.insert(kind, amount, description.trim()) {
            Ok(_) => {
                let noun = match kind {
                    TransactionKind::Income => "Income",
                    TransactionKind::Expense => "Expense",
                };
                writeln!(self.output, "{noun} of ${amount:.2} added successfully!")?;
            }
            Err(StoreError::InvalidAmount(_)) => {
                writeln!(
                    self.output,
                    "Invalid amount! Amount must be greater than zero."
                )?;
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    /// Print `text` and read one line. `None` at end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
