use chrono::Local;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Textual timestamp layout stored in the `timestamp` column.
/// Lexicographic order of this layout is chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Error type for store and query operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to get a database connection: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid amount {0}: amounts must be finite and greater than zero")]
    InvalidAmount(f64),
}

/// Whether money came in or went out. The sign of a transaction lives here,
/// never in the stored amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// `+` for income, `-` for expense.
    pub fn symbol(&self) -> char {
        match self {
            TransactionKind::Income => '+',
            TransactionKind::Expense => '-',
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown transaction kind: {0:?}")]
pub struct ParseKindError(String);

impl FromStr for TransactionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// One ledger entry. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub kind: TransactionKind,
    /// Always positive; see `kind` for direction.
    pub amount: f64,
    pub description: String,
    /// Local creation time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
}

impl Transaction {
    /// Amount with the sign implied by `kind` applied.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Transaction {
            id: row.get(0)?,
            kind: row.get(1)?,
            amount: row.get(2)?,
            description: row.get(3)?,
            timestamp: row.get(4)?,
        })
    }
}

/// Column list matching `Transaction::from_row`.
pub(crate) const TRANSACTION_COLUMNS: &str = "id, kind, amount, description, timestamp";

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // WAL survives crashes mid-write and is remembered by the file
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // AUTOINCREMENT keeps ids from being reused
    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,
            amount REAL NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            timestamp TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_timestamp ON transactions(timestamp)",
        [],
    )?;

    Ok(())
}

/// Durable transaction store backed by a single SQLite file.
///
/// Holds a small connection pool; each operation checks out one connection
/// and hands it back when the guard drops, whether or not the operation
/// succeeded.
#[derive(Clone)]
pub struct Store {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl Store {
    /// Open (creating if needed) the data file at `path` and make sure the
    /// schema exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot be
    /// created.
    pub fn open<P: AsRef<Path>>(path: P, pool_size: u32) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let manager = SqliteConnectionManager::file(&path);

        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .connection_timeout(Duration::from_secs(5))
            .connection_customizer(Box::new(LedgerConnectionCustomizer))
            .build(manager)?;

        let store = Self { pool, path };
        store.initialize()?;

        info!(path = %store.path.display(), "ledger store opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StoreError> {
        Ok(self.pool.get()?)
    }

    /// Ensure the transactions table exists. Safe to call any number of times.
    pub fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        setup_database(&conn)?;
        debug!("schema ready");
        Ok(())
    }

    /// Append a transaction stamped with the current local time and return its id.
    ///
    /// # Errors
    ///
    /// `StoreError::InvalidAmount` if `amount` is not a finite number greater
    /// than zero (nothing is written), or a storage error.
    pub fn insert(
        &self,
        kind: TransactionKind,
        amount: f64,
        description: &str,
    ) -> Result<i64, StoreError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO transactions (kind, amount, description, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![kind, amount, description, timestamp],
        )?;
        let id = conn.last_insert_rowid();

        info!(id, %kind, amount, "transaction recorded");
        Ok(id)
    }

    pub fn add_income(&self, amount: f64, description: &str) -> Result<i64, StoreError> {
        self.insert(TransactionKind::Income, amount, description)
    }

    pub fn add_expense(&self, amount: f64, description: &str) -> Result<i64, StoreError> {
        self.insert(TransactionKind::Expense, amount, description)
    }

    /// Fetch a single transaction by id.
    pub fn get(&self, id: i64) -> Result<Option<Transaction>, StoreError> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
                [id],
                Transaction::from_row,
            )
            .optional()?;
        Ok(tx)
    }
}

/// Applies per-connection settings when a connection is handed out.
#[derive(Debug)]
struct LedgerConnectionCustomizer;

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for LedgerConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.busy_timeout(Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    fn open_temp_store() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::open(temp_dir.path().join("ledger.db"), 2).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_setup_database_twice() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_insert_and_get() {
        let (_dir, store) = open_temp_store();

        let id = store.add_income(100.0, "salary").unwrap();
        let tx = store.get(id).unwrap().expect("transaction should exist");

        assert_eq!(tx.id, id);
        assert_eq!(tx.kind, TransactionKind::Income);
        assert_eq!(tx.amount, 100.0);
        assert_eq!(tx.description, "salary");
        assert!(
            NaiveDateTime::parse_from_str(&tx.timestamp, TIMESTAMP_FORMAT).is_ok(),
            "unexpected timestamp layout: {}",
            tx.timestamp
        );
    }

    #[test]
    fn test_ids_increase() {
        let (_dir, store) = open_temp_store();

        let first = store.add_income(10.0, "").unwrap();
        let second = store.add_expense(5.0, "").unwrap();
        let third = store.add_income(1.5, "").unwrap();

        assert!(first < second && second < third);
    }

    #[test]
    fn test_ids_not_reused_after_row_removed() {
        let (_dir, store) = open_temp_store();

        let first = store.add_income(10.0, "a").unwrap();
        store
            .conn()
            .unwrap()
            .execute("DELETE FROM transactions WHERE id = ?1", [first])
            .unwrap();

        let second = store.add_income(10.0, "b").unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_empty_description_allowed() {
        let (_dir, store) = open_temp_store();

        let id = store.add_expense(3.25, "").unwrap();
        assert_eq!(store.get(id).unwrap().unwrap().description, "");
    }

    #[test]
    fn test_invalid_amounts_rejected() {
        let (_dir, store) = open_temp_store();

        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = store.insert(TransactionKind::Expense, amount, "bad");
            assert!(
                matches!(result, Err(StoreError::InvalidAmount(_))),
                "amount {amount} should be rejected"
            );
        }

        let count: i64 = store
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_get_missing_id() {
        let (_dir, store) = open_temp_store();
        assert!(store.get(42).unwrap().is_none());
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let (_dir, store) = open_temp_store();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO transactions (kind, amount, description, timestamp)
                 VALUES ('transfer', 1.0, '', '2024-01-01 00:00:00')",
                [],
            )
            .unwrap();

        assert!(matches!(store.get(1), Err(StoreError::Database(_))));
    }

    #[test]
    fn test_initialize_keeps_records() {
        let (_dir, store) = open_temp_store();
        let id = store.add_income(50.0, "kept").unwrap();

        store.initialize().unwrap();
        store.initialize().unwrap();

        assert_eq!(store.get(id).unwrap().unwrap().description, "kept");
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("income".parse::<TransactionKind>().unwrap(), TransactionKind::Income);
        assert_eq!("expense".parse::<TransactionKind>().unwrap(), TransactionKind::Expense);
        assert!("Income".parse::<TransactionKind>().is_err());
        assert_eq!(TransactionKind::Expense.to_string(), "expense");
    }

    #[test]
    fn test_signed_amount() {
        let tx = Transaction {
            id: 1,
            kind: TransactionKind::Expense,
            amount: 40.0,
            description: "food".to_string(),
            timestamp: "2024-01-01 12:00:00".to_string(),
        };
        assert_eq!(tx.signed_amount(), -40.0);
        assert_eq!(tx.kind.symbol(), '-');
    }
}
