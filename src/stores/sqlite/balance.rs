//! Implements a SQLite backed view onto the balance cache.
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, named_params};

use crate::{
    Error,
    db::MapRow,
    models::{Balances, DatabaseID, EntityRef, LedgerBalance},
    stores::BalanceStore,
};

/// Reads the denormalized balance cache from a SQLite database.
///
/// Cache rows are written by
/// [SQLiteTransactionStore](crate::stores::sqlite::SQLiteTransactionStore)
/// inside the same SQL transaction as the entries they summarize.
#[derive(Debug, Clone)]
pub struct SQLiteBalanceStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteBalanceStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl BalanceStore for SQLiteBalanceStore {
    fn balances_for(&self, entity: &EntityRef) -> Result<Balances, Error> {
        let rows = self
            .connection
            .lock()
            .expect("could not acquire database lock")
            .prepare(
                "SELECT ledger_id, balance FROM ledger_balance
                 WHERE entity_type = :entity_type AND entity_id = :entity_id",
            )?
            .query_map(
                named_params! {
                    ":entity_type": entity.entity_type(),
                    ":entity_id": entity.entity_id(),
                },
                |row| Ok((row.get::<_, DatabaseID>(0)?, row.get::<_, i64>(1)?)),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows.into_iter().collect())
    }

    fn get_all(&self) -> Result<Vec<LedgerBalance>, Error> {
        self.connection
            .lock()
            .expect("could not acquire database lock")
            .prepare(
                "SELECT id, ledger_id, entity_type, entity_id, balance, created_at, modified_at
                 FROM ledger_balance ORDER BY id",
            )?
            .query_map([], LedgerBalance::map_row)?
            .map(|maybe_balance| maybe_balance.map_err(|error| error.into()))
            .collect()
    }
}
