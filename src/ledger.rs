//! Read-only aggregations over the transaction store.
//!
//! Nothing is cached: every call checks out a connection and re-reads the file.

use crate::db::{Store, StoreError, Transaction, TransactionKind, TRANSACTION_COLUMNS};
use rusqlite::params;
use serde::Serialize;
use tracing::debug;

/// Totals and counts for the whole ledger.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    pub total_income: f64,
    pub total_expense: f64,
    pub net_balance: f64,
    pub income_count: i64,
    pub expense_count: i64,
    pub total_count: i64,
}

/// Query side of the ledger.
pub struct Ledger<'a> {
    store: &'a Store,
}

impl<'a> Ledger<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Sum of amounts for one kind; `0.0` when there are none.
    pub fn total_by_kind(&self, kind: TransactionKind) -> Result<f64, StoreError> {
        let conn = self.store.conn()?;
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM transactions WHERE kind = ?1",
            [kind],
            |row| row.get(0),
        )?;
        debug!(%kind, total, "total by kind");
        Ok(total)
    }

    pub fn count_by_kind(&self, kind: TransactionKind) -> Result<i64, StoreError> {
        let conn = self.store.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE kind = ?1",
            [kind],
            |row| row.get(0),
        )?;
        debug!(%kind, count, "count by kind");
        Ok(count)
    }

    /// Income minus expenses.
    pub fn balance(&self) -> Result<f64, StoreError> {
        let income = self.total_by_kind(TransactionKind::Income)?;
        let expense = self.total_by_kind(TransactionKind::Expense)?;
        Ok(income - expense)
    }

    /// Every transaction, most recent first. Entries stamped in the same
    /// second keep insertion order reversed.
    pub fn list_all(&self) -> Result<Vec<Transaction>, StoreError> {
        let conn = self.store.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS}
             FROM transactions
             ORDER BY timestamp DESC, id DESC"
        ))?;

        let transactions = stmt
            .query_map([], Transaction::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = transactions.len(), "listed transactions");
        Ok(transactions)
    }

    /// All summary figures, read by one statement so they agree with each other.
    pub fn summary(&self) -> Result<Summary, StoreError> {
        let conn = self.store.conn()?;
        let (total_income, total_expense, income_count, expense_count): (f64, f64, i64, i64) =
            conn.query_row(
                "SELECT
                    COALESCE(SUM(CASE WHEN kind = ?1 THEN amount END), 0.0),
                    COALESCE(SUM(CASE WHEN kind = ?2 THEN amount END), 0.0),
                    COUNT(CASE WHEN kind = ?1 THEN 1 END),
                    COUNT(CASE WHEN kind = ?2 THEN 1 END)
                 FROM transactions",
                params![TransactionKind::Income, TransactionKind::Expense],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        Ok(Summary {
            total_income,
            total_expense,
            net_balance: total_income - total_expense,
            income_count,
            expense_count,
            total_count: income_count + expense_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp_store() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::open(temp_dir.path().join("ledger.db"), 2).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_empty_ledger() {
        let (_dir, store) = open_temp_store();
        let ledger = Ledger::new(&store);

        assert_eq!(ledger.balance().unwrap(), 0.0);
        assert_eq!(ledger.total_by_kind(TransactionKind::Income).unwrap(), 0.0);
        assert_eq!(ledger.count_by_kind(TransactionKind::Expense).unwrap(), 0);
        assert!(ledger.list_all().unwrap().is_empty());
        assert_eq!(ledger.summary().unwrap(), Summary::default());
    }

    #[test]
    fn test_salary_and_food() {
        let (_dir, store) = open_temp_store();
        store.add_income(100.0, "salary").unwrap();
        store.add_expense(40.0, "food").unwrap();

        let ledger = Ledger::new(&store);
        assert_eq!(ledger.balance().unwrap(), 60.0);
        assert_eq!(
            ledger.summary().unwrap(),
            Summary {
                total_income: 100.0,
                total_expense: 40.0,
                net_balance: 60.0,
                income_count: 1,
                expense_count: 1,
                total_count: 2,
            }
        );
    }

    #[test]
    fn test_totals_and_counts_by_kind() {
        let (_dir, store) = open_temp_store();
        store.add_income(10.5, "").unwrap();
        store.add_income(20.25, "").unwrap();
        store.add_expense(4.75, "").unwrap();

        let ledger = Ledger::new(&store);
        assert_eq!(ledger.total_by_kind(TransactionKind::Income).unwrap(), 30.75);
        assert_eq!(ledger.total_by_kind(TransactionKind::Expense).unwrap(), 4.75);
        assert_eq!(ledger.count_by_kind(TransactionKind::Income).unwrap(), 2);
        assert_eq!(ledger.count_by_kind(TransactionKind::Expense).unwrap(), 1);
        assert_eq!(ledger.balance().unwrap(), 26.0);
    }

    #[test]
    fn test_negative_balance() {
        let (_dir, store) = open_temp_store();
        store.add_expense(25.0, "rent share").unwrap();

        let ledger = Ledger::new(&store);
        assert_eq!(ledger.balance().unwrap(), -25.0);
        assert_eq!(ledger.summary().unwrap().net_balance, -25.0);
    }

    #[test]
    fn test_list_all_most_recent_first() {
        let (_dir, store) = open_temp_store();
        let first = store.add_income(1.0, "first").unwrap();
        let second = store.add_expense(2.0, "second").unwrap();
        let third = store.add_income(3.0, "third").unwrap();

        let listed = Ledger::new(&store).list_all().unwrap();
        let ids: Vec<i64> = listed.iter().map(|tx| tx.id).collect();
        assert_eq!(ids, vec![third, second, first]);
    }

    #[test]
    fn test_list_all_orders_by_timestamp() {
        let (_dir, store) = open_temp_store();
        let conn = store.conn().unwrap();
        for (kind, ts) in [
            ("income", "2024-03-01 09:00:00"),
            ("expense", "2024-05-01 09:00:00"),
            ("income", "2023-12-31 23:59:59"),
        ] {
            conn.execute(
                "INSERT INTO transactions (kind, amount, description, timestamp)
                 VALUES (?1, 1.0, '', ?2)",
                [kind, ts],
            )
            .unwrap();
        }
        drop(conn);

        let stamps: Vec<String> = Ledger::new(&store)
            .list_all()
            .unwrap()
            .into_iter()
            .map(|tx| tx.timestamp)
            .collect();
        assert_eq!(
            stamps,
            vec![
                "2024-05-01 09:00:00",
                "2024-03-01 09:00:00",
                "2023-12-31 23:59:59"
            ]
        );
    }

    #[test]
    fn test_queries_see_new_writes() {
        let (_dir, store) = open_temp_store();
        let ledger = Ledger::new(&store);

        assert_eq!(ledger.summary().unwrap().total_count, 0);
        store.add_income(5.0, "").unwrap();
        assert_eq!(ledger.summary().unwrap().total_count, 1);
        assert_eq!(ledger.list_all().unwrap().len(), 1);
    }
}
