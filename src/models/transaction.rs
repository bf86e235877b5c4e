//! This file defines the types `Transaction` and `LedgerEntry`, the ledger of
//! record at the core of the crate.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{DatabaseID, EntityRef},
};

/// One signed amount posted against one ledger.
///
/// An entry always belongs to exactly one transaction and one ledger. Build
/// unsaved entries with [LedgerEntry::new] and post them through
/// [TransactionStore::create](crate::stores::TransactionStore::create); the
/// store rejects entries that already carry a persisted ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    id: Option<DatabaseID>,
    entry_uuid: Uuid,
    ledger_id: DatabaseID,
    transaction_id: Option<DatabaseID>,
    amount: i64,
    created_at: Option<OffsetDateTime>,
}

impl LedgerEntry {
    /// Create an unsaved entry of `amount` against the ledger `ledger_id`.
    ///
    /// Use [debit](crate::debit) and [credit](crate::credit) to produce
    /// sign-correct amounts.
    pub fn new(ledger_id: DatabaseID, amount: i64) -> Self {
        Self {
            id: None,
            entry_uuid: Uuid::new_v4(),
            ledger_id,
            transaction_id: None,
            amount,
            created_at: None,
        }
    }

    /// The ID of the entry, or `None` if the entry has not been posted yet.
    pub fn id(&self) -> Option<DatabaseID> {
        self.id
    }

    /// The informational UUID assigned when the entry was built.
    pub fn entry_uuid(&self) -> Uuid {
        self.entry_uuid
    }

    /// The ID of the ledger this entry posts against.
    pub fn ledger_id(&self) -> DatabaseID {
        self.ledger_id
    }

    /// The ID of the owning transaction, or `None` before posting.
    pub fn transaction_id(&self) -> Option<DatabaseID> {
        self.transaction_id
    }

    /// The signed amount of the entry (positive = debit, negative = credit).
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// When the entry was posted, or `None` before posting.
    pub fn created_at(&self) -> Option<OffsetDateTime> {
        self.created_at
    }
}

impl CreateTable for LedgerEntry {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS ledger_entry (
                id INTEGER PRIMARY KEY,
                entry_uuid BLOB NOT NULL,
                ledger_id INTEGER NOT NULL,
                transaction_id INTEGER NOT NULL,
                amount INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(ledger_id) REFERENCES ledger(id) ON DELETE RESTRICT,
                FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id) ON DELETE RESTRICT
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for LedgerEntry {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: Some(row.get(offset)?),
            entry_uuid: row.get(offset + 1)?,
            ledger_id: row.get(offset + 2)?,
            transaction_id: Some(row.get(offset + 3)?),
            amount: row.get(offset + 4)?,
            created_at: Some(row.get(offset + 5)?),
        })
    }
}

/// An atomic, balanced group of ledger entries plus zero or more evidence
/// links.
///
/// Transactions are created exactly once through
/// [TransactionStore::create](crate::stores::TransactionStore::create) and
/// are immutable afterwards; reversals are modelled by posting a new
/// offsetting transaction. The amounts of a transaction's entries always sum
/// to exactly zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: DatabaseID,
    transaction_uuid: Uuid,
    notes: String,
    created_by: DatabaseID,
    kind_id: DatabaseID,
    posted_at: OffsetDateTime,
    created_at: OffsetDateTime,
    entries: Vec<LedgerEntry>,
    evidence: Vec<EntityRef>,
}

impl Transaction {
    /// The ID of the transaction.
    pub fn id(&self) -> DatabaseID {
        self.id
    }

    /// The informational UUID assigned when the transaction was posted.
    pub fn transaction_uuid(&self) -> Uuid {
        self.transaction_uuid
    }

    /// Free text notes attached to the transaction.
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// The ID of the principal the transaction is attributed to.
    ///
    /// The ledger only stores this reference; it never interprets
    /// permissions.
    pub fn created_by(&self) -> DatabaseID {
        self.created_by
    }

    /// The ID of the transaction's [TransactionKind](crate::models::TransactionKind).
    pub fn kind_id(&self) -> DatabaseID {
        self.kind_id
    }

    /// When the transaction takes effect.
    ///
    /// Defaults to the time of posting but may be backdated (or future
    /// dated) to model retroactive accounting.
    pub fn posted_at(&self) -> OffsetDateTime {
        self.posted_at
    }

    /// When the transaction row was written.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// The entries belonging to this transaction.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// The evidence objects linked to this transaction.
    pub fn evidence(&self) -> &[EntityRef] {
        &self.evidence
    }

    /// Check that the attached entries sum to exactly zero.
    ///
    /// The write path enforces this before any row is written; this method
    /// exists as a defence in depth re-check for loaded transactions.
    ///
    /// # Errors
    /// Returns [Error::UnbalancedEntries] with the net amount if the entries
    /// do not balance.
    pub fn validate(&self) -> Result<(), Error> {
        let total: i128 = self.entries.iter().map(|entry| i128::from(entry.amount())).sum();

        if total != 0 {
            return Err(Error::UnbalancedEntries(total));
        }

        Ok(())
    }

    pub(crate) fn attach_details(
        mut self,
        entries: Vec<LedgerEntry>,
        evidence: Vec<EntityRef>,
    ) -> Self {
        self.entries = entries;
        self.evidence = evidence;
        self
    }
}

impl CreateTable for Transaction {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                transaction_uuid BLOB NOT NULL,
                notes TEXT NOT NULL,
                created_by INTEGER NOT NULL,
                kind_id INTEGER NOT NULL,
                posted_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(kind_id) REFERENCES transaction_kind(id) ON DELETE RESTRICT
                )",
            (),
        )?;

        connection.execute(
            "CREATE TABLE IF NOT EXISTS transaction_evidence (
                id INTEGER PRIMARY KEY,
                transaction_id INTEGER NOT NULL,
                entity_type TEXT NOT NULL,
                entity_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id) ON DELETE RESTRICT,
                UNIQUE(transaction_id, entity_type, entity_id)
                )",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS transaction_evidence_entity
                ON transaction_evidence (entity_type, entity_id)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Transaction {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            transaction_uuid: row.get(offset + 1)?,
            notes: row.get(offset + 2)?,
            created_by: row.get(offset + 3)?,
            kind_id: row.get(offset + 4)?,
            posted_at: row.get(offset + 5)?,
            created_at: row.get(offset + 6)?,
            entries: Vec::new(),
            evidence: Vec::new(),
        })
    }
}

/// Builder for posting a new [Transaction].
///
/// The builder is finalized by
/// [TransactionStore::create](crate::stores::TransactionStore::create), which
/// persists the transaction, its entries, its evidence links, and the
/// matching balance cache rows in one atomic unit.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    pub(crate) created_by: DatabaseID,
    pub(crate) entries: Vec<LedgerEntry>,
    pub(crate) evidence: Vec<EntityRef>,
    pub(crate) notes: String,
    pub(crate) kind: Option<String>,
    pub(crate) posted_at: Option<OffsetDateTime>,
}

impl TransactionBuilder {
    /// Start a transaction attributed to the principal `created_by`.
    pub fn new(created_by: DatabaseID) -> Self {
        Self {
            created_by,
            entries: Vec::new(),
            evidence: Vec::new(),
            notes: String::new(),
            kind: None,
            posted_at: None,
        }
    }

    /// Add an entry of `amount` against the ledger `ledger_id`.
    ///
    /// Use [debit](crate::debit) and [credit](crate::credit) to produce
    /// sign-correct amounts.
    pub fn entry(mut self, ledger_id: DatabaseID, amount: i64) -> Self {
        self.entries.push(LedgerEntry::new(ledger_id, amount));
        self
    }

    /// Add a pre-built entry.
    pub fn with_entry(mut self, entry: LedgerEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Link an evidence object to the transaction.
    ///
    /// Duplicate references are stored once regardless of how many times they
    /// are added.
    pub fn evidence(mut self, entity: EntityRef) -> Self {
        self.evidence.push(entity);
        self
    }

    /// Set the free text notes for the transaction.
    pub fn notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_owned();
        self
    }

    /// Set the transaction kind by name.
    ///
    /// The kind is created on first use. Defaults to
    /// [TransactionKind::MANUAL](crate::models::TransactionKind::MANUAL).
    pub fn kind(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_owned());
        self
    }

    /// Set the effective timestamp of the transaction.
    ///
    /// Any value is accepted, including past and future dates, to support
    /// retroactive accounting. Defaults to the current time.
    pub fn posted_at(mut self, posted_at: OffsetDateTime) -> Self {
        self.posted_at = Some(posted_at);
        self
    }
}
