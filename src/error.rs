//! Defines the crate level error type and conversions from SQLite errors.

use crate::models::DatabaseID;

/// The errors that may occur while reading or writing the ledger.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The entries of a transaction did not sum to exactly zero.
    ///
    /// The wrapped value is the offending net amount. This error is raised
    /// before any row is written, and again by
    /// [Transaction::validate](crate::models::Transaction::validate) as a
    /// defence in depth check.
    #[error("ledger entries must sum to zero, got a net amount of {0}")]
    UnbalancedEntries(i128),

    /// A transaction was submitted with no ledger entries.
    #[error("a transaction must have at least one ledger entry")]
    NoLedgerEntries,

    /// An entry that has already been posted was submitted again.
    ///
    /// Entries belong to exactly one transaction. Re-submitting a persisted
    /// entry would either double-post it or move it between transactions,
    /// both of which would corrupt the ledger.
    #[error("ledger entry {0} has already been posted")]
    ExistingLedgerEntry(DatabaseID),

    /// An entry referenced a ledger that does not exist.
    #[error("ledger {0} does not exist")]
    InvalidLedger(DatabaseID),

    /// A ledger with the given name already exists.
    #[error("the ledger \"{0}\" already exists in the database")]
    DuplicateLedgerName(String),

    /// A ledger with the given account code already exists.
    ///
    /// Account codes uniquely identify a ledger and are never reused.
    #[error("the account code {0} is already in use")]
    DuplicateAccountCode(i64),

    /// A balance upsert matched more than one row for a single
    /// (ledger, evidence) pair.
    ///
    /// The schema's uniqueness constraint makes this unreachable; seeing it
    /// means the balance cache was modified outside this crate.
    #[error("more than one balance row exists for a (ledger, evidence) pair")]
    CorruptBalanceCache,

    /// A query was given an ID that does not refer to a valid row.
    #[error("a foreign key did not refer to a valid row")]
    InvalidForeignKey,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_)) if sql_error.extended_code == 787 => {
                Error::InvalidForeignKey
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
