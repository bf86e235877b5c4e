//! Defines the `Ledger` type, a named account bucket that entries post against.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    db::{CreateTable, MapRow},
    models::DatabaseID,
};

/// A named account bucket (e.g. "Credits Sold", "Accounts Receivable").
///
/// Ledgers are effectively immutable once created: the name and account code
/// uniquely identify a ledger and are never reused. Use
/// [LedgerStore::get_or_create](crate::stores::LedgerStore::get_or_create)
/// for idempotent bootstrap of well-known ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    id: DatabaseID,
    name: String,
    account_code: i64,
    liability: bool,
    description: String,
}

impl Ledger {
    /// The ID of the ledger.
    pub fn id(&self) -> DatabaseID {
        self.id
    }

    /// The unique, human readable name of the ledger.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unique account code identifying this ledger in a chart of accounts.
    pub fn account_code(&self) -> i64 {
        self.account_code
    }

    /// Whether this ledger tracks a liability (as opposed to an asset).
    pub fn liability(&self) -> bool {
        self.liability
    }

    /// A free text description of what the ledger tracks.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl CreateTable for Ledger {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS ledger (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                account_code INTEGER NOT NULL UNIQUE,
                liability INTEGER NOT NULL,
                description TEXT NOT NULL
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Ledger {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            account_code: row.get(offset + 2)?,
            liability: row.get(offset + 3)?,
            description: row.get(offset + 4)?,
        })
    }
}
