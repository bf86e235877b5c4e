//! Defines the `TransactionKind` type used to categorize transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    db::{CreateTable, MapRow},
    models::DatabaseID,
};

/// A named category of transaction (e.g. "Manual", "Reconciliation").
///
/// Transactions posted without an explicit kind are tagged with the default
/// "Manual" kind, which is created on first use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionKind {
    id: DatabaseID,
    name: String,
    description: String,
}

impl TransactionKind {
    /// The name of the default kind assigned when no explicit kind is given.
    pub const MANUAL: &str = "Manual";

    /// The ID of the transaction kind.
    pub fn id(&self) -> DatabaseID {
        self.id
    }

    /// The unique name of the transaction kind.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A free text description of the transaction kind.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl CreateTable for TransactionKind {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS transaction_kind (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for TransactionKind {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            description: row.get(offset + 2)?,
        })
    }
}
