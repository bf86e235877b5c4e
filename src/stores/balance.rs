//! Defines the balance store trait.

use crate::{
    Error,
    models::{Balances, EntityRef, LedgerBalance},
};

/// Read access to the denormalized balance cache.
///
/// Rows in the cache are written exclusively by
/// [TransactionStore::create](crate::stores::TransactionStore::create); this
/// trait only exposes reads.
pub trait BalanceStore {
    /// The cached balance of `entity` in every ledger it has activity in.
    ///
    /// Never fails for an object with no ledger activity; absent ledgers
    /// default to a balance of zero in the returned [Balances].
    fn balances_for(&self, entity: &EntityRef) -> Result<Balances, Error>;

    /// Retrieve every balance cache row. Intended for diagnostics.
    fn get_all(&self) -> Result<Vec<LedgerBalance>, Error>;
}
