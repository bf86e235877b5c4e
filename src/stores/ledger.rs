//! Defines the ledger store trait.

use crate::{
    Error,
    models::{DatabaseID, Ledger},
};

/// Handles the creation and retrieval of ledgers.
pub trait LedgerStore {
    /// Create a new ledger.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DuplicateLedgerName] if a ledger named `name` already exists,
    /// - [Error::DuplicateAccountCode] if `account_code` is already in use,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(
        &mut self,
        name: &str,
        account_code: i64,
        liability: bool,
        description: &str,
    ) -> Result<Ledger, Error>;

    /// Retrieve the ledger named `name`, creating it if it does not exist.
    ///
    /// Calling this twice with the same name returns the same row both
    /// times; it never creates a duplicate. Intended for idempotent
    /// bootstrap of well-known ledgers.
    fn get_or_create(
        &mut self,
        name: &str,
        account_code: i64,
        liability: bool,
        description: &str,
    ) -> Result<Ledger, Error>;

    /// Retrieve a ledger by its `id`.
    fn get(&self, id: DatabaseID) -> Result<Ledger, Error>;

    /// Retrieve a ledger by its unique `name`.
    fn get_by_name(&self, name: &str) -> Result<Ledger, Error>;

    /// Retrieve all ledgers, ordered by account code.
    fn get_all(&self) -> Result<Vec<Ledger>, Error>;

    /// The total balance of the ledger `id`: the sum of the amounts of every
    /// entry posted against it.
    ///
    /// This recomputes from the ledger of record and is O(n) over entries;
    /// intended for diagnostics. Use
    /// [BalanceStore::balances_for](crate::stores::BalanceStore::balances_for)
    /// for O(1) per-entity lookups.
    fn balance(&self, id: DatabaseID) -> Result<i64, Error>;
}
