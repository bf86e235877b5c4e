//! Contains the SQLite backed store implementations and a convenience
//! constructor that wires them to a shared connection.

pub mod balance;
pub mod ledger;
pub mod transaction;

pub use balance::SQLiteBalanceStore;
pub use ledger::SQLiteLedgerStore;
pub use transaction::SQLiteTransactionStore;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize};

/// The SQLite backed stores, sharing one database connection.
#[derive(Debug, Clone)]
pub struct LedgerStores {
    /// Creation and retrieval of ledgers.
    pub ledgers: SQLiteLedgerStore,
    /// Posting and retrieval of transactions, entries and evidence links.
    pub transactions: SQLiteTransactionStore,
    /// Read access to the denormalized balance cache.
    pub balances: SQLiteBalanceStore,
}

/// Creates the SQLite backed stores on `connection`.
///
/// This function will modify the database by adding the tables for the
/// domain models to the database.
///
/// # Errors
/// Returns an [Error::SqlError] if the schema could not be created.
pub fn create_ledger_stores(connection: Connection) -> Result<LedgerStores, Error> {
    initialize(&connection)?;

    let connection = Arc::new(Mutex::new(connection));

    Ok(LedgerStores {
        ledgers: SQLiteLedgerStore::new(connection.clone()),
        transactions: SQLiteTransactionStore::new(connection.clone()),
        balances: SQLiteBalanceStore::new(connection),
    })
}
