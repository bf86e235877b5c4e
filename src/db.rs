/*! This module defines and implements traits for interacting with the
ledger's database schema. */

use rusqlite::{Connection, Row, Transaction as SqlTransaction};

use crate::{
    Error,
    models::{Ledger, LedgerBalance, LedgerEntry, Transaction, TransactionKind},
};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create the table(s) for the model.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for mapping from a `rusqlite::Row` from a SQLite database to a
/// concrete rust type.
///
/// # Examples
/// ```
/// use rusqlite::{Connection, Error, Row};
///
/// use ledgerbook::db::MapRow;
///
/// struct Foo {
///     id: i64,
///     desc: String,
/// }
///
/// impl MapRow for Foo {
///     type ReturnType = Self;
///
///     fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, Error> {
///         Ok(Self {
///             id: row.get(offset)?,
///             desc: row.get(offset + 1)?,
///         })
///     }
/// }
///
/// fn get_foo(id: i64, connection: &Connection) -> Result<Foo, ledgerbook::Error> {
///     connection
///         .prepare("SELECT id, desc FROM foo WHERE id = :id")?
///         .query_row(&[(":id", &id)], Foo::map_row)
///         .map_err(|error| error.into())
/// }
/// ```
pub trait MapRow {
    /// The concrete type a row maps to.
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// **Note:** This function expects that the row object contains all the
    /// table columns in the order they were defined.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the
    /// corresponding rust type, or if an invalid column index was used.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into a concrete type.
    ///
    /// The `offset` indicates which column the row should be read from. This
    /// is useful in cases where tables have been joined and you want to
    /// construct two different types from the one query.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the
    /// corresponding rust type, or if an invalid column index was used.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}

/// Create the ledger schema on `connection`.
///
/// All tables are created inside one exclusive SQL transaction, so a
/// half-created schema is never observable. Safe to call on a connection
/// whose schema already exists.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign keys are enforced per connection in SQLite.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    Ledger::create_table(&transaction)?;
    TransactionKind::create_table(&transaction)?;
    Transaction::create_table(&transaction)?;
    LedgerEntry::create_table(&transaction)?;
    LedgerBalance::create_table(&transaction)?;

    transaction.commit()?;

    tracing::debug!("initialized ledger schema");

    Ok(())
}
