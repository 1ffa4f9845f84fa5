//! Shared fixtures for ledger integration tests.

use finance_ledger::Store;
use std::path::PathBuf;
use tempfile::TempDir;

/// Temporary data directory holding one ledger file.
///
/// The directory is removed when the fixture is dropped.
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub db_path: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("finance.db");
        Self { temp_dir, db_path }
    }

    /// Open a store on this fixture's data file.
    pub fn store(&self) -> Store {
        Store::open(&self.db_path, 2).expect("failed to open store")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Loose float comparison for sums of many amounts.
#[allow(dead_code)]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
