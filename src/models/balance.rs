//! Defines the denormalized balance cache types.

use std::collections::HashMap;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    db::{CreateTable, MapRow},
    models::{DatabaseID, EntityRef},
};

/// The cached running balance for one (ledger, evidence object) pair.
///
/// Exactly one row exists per pair; it is created by the first posting that
/// touches the pair and incremented in the same SQL transaction as every
/// subsequent posting, so it always agrees with the sum over the underlying
/// entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBalance {
    id: DatabaseID,
    ledger_id: DatabaseID,
    entity: EntityRef,
    balance: i64,
    created_at: OffsetDateTime,
    modified_at: OffsetDateTime,
}

impl LedgerBalance {
    /// The ID of the balance row.
    pub fn id(&self) -> DatabaseID {
        self.id
    }

    /// The ID of the ledger this balance summarizes.
    pub fn ledger_id(&self) -> DatabaseID {
        self.ledger_id
    }

    /// The evidence object this balance is keyed by.
    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    /// The cached running balance (positive = debit, negative = credit).
    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// When the balance row was created.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// When the balance row was last incremented.
    pub fn modified_at(&self) -> OffsetDateTime {
        self.modified_at
    }
}

impl CreateTable for LedgerBalance {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS ledger_balance (
                id INTEGER PRIMARY KEY,
                ledger_id INTEGER NOT NULL,
                entity_type TEXT NOT NULL,
                entity_id INTEGER NOT NULL,
                balance INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                modified_at TEXT NOT NULL,
                FOREIGN KEY(ledger_id) REFERENCES ledger(id) ON DELETE RESTRICT,
                UNIQUE(ledger_id, entity_type, entity_id)
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for LedgerBalance {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            ledger_id: row.get(offset + 1)?,
            entity: EntityRef::map_row_with_offset(row, offset + 2)?,
            balance: row.get(offset + 4)?,
            created_at: row.get(offset + 5)?,
            modified_at: row.get(offset + 6)?,
        })
    }
}

/// The cached balances of one evidence object across all ledgers.
///
/// Missing ledgers default to a balance of zero, so looking up an object
/// with no ledger activity is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    by_ledger: HashMap<DatabaseID, i64>,
}

impl Balances {
    /// The balance for the ledger `ledger_id`, defaulting to zero for
    /// ledgers with no activity.
    pub fn balance_for(&self, ledger_id: DatabaseID) -> i64 {
        self.by_ledger.get(&ledger_id).copied().unwrap_or(0)
    }

    /// The number of ledgers with a cached balance row for this object.
    pub fn len(&self) -> usize {
        self.by_ledger.len()
    }

    /// Whether the object has no cached balance rows at all.
    pub fn is_empty(&self) -> bool {
        self.by_ledger.is_empty()
    }

    /// Iterate over the (ledger ID, balance) pairs with cached rows.
    pub fn iter(&self) -> impl Iterator<Item = (DatabaseID, i64)> + '_ {
        self.by_ledger.iter().map(|(&ledger_id, &balance)| (ledger_id, balance))
    }
}

impl FromIterator<(DatabaseID, i64)> for Balances {
    fn from_iter<I: IntoIterator<Item = (DatabaseID, i64)>>(iter: I) -> Self {
        Self {
            by_ledger: iter.into_iter().collect(),
        }
    }
}
