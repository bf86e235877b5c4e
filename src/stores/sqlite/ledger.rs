//! Implements a SQLite backed ledger store.
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    db::MapRow,
    models::{DatabaseID, Ledger},
    stores::LedgerStore,
};

/// Stores ledgers in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteLedgerStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteLedgerStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl LedgerStore for SQLiteLedgerStore {
    fn create(
        &mut self,
        name: &str,
        account_code: i64,
        liability: bool,
        description: &str,
    ) -> Result<Ledger, Error> {
        let connection = self
            .connection
            .lock()
            .expect("could not acquire database lock");

        connection
            .prepare(
                "INSERT INTO ledger (name, account_code, liability, description)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, name, account_code, liability, description",
            )?
            .query_row((name, account_code, liability, description), Ledger::map_row)
            .map_err(|error| match error {
                // Code 2067 occurs when a UNIQUE constraint failed.
                rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                    if sql_error.extended_code == 2067 && desc.ends_with("ledger.name") =>
                {
                    Error::DuplicateLedgerName(name.to_owned())
                }
                rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                    if sql_error.extended_code == 2067 && desc.ends_with("ledger.account_code") =>
                {
                    Error::DuplicateAccountCode(account_code)
                }
                error => error.into(),
            })
    }

    fn get_or_create(
        &mut self,
        name: &str,
        account_code: i64,
        liability: bool,
        description: &str,
    ) -> Result<Ledger, Error> {
        match self.get_by_name(name) {
            Ok(ledger) => Ok(ledger),
            Err(Error::NotFound) => self.create(name, account_code, liability, description),
            Err(error) => Err(error),
        }
    }

    fn get(&self, id: DatabaseID) -> Result<Ledger, Error> {
        let ledger = self
            .connection
            .lock()
            .expect("could not acquire database lock")
            .prepare(
                "SELECT id, name, account_code, liability, description FROM ledger WHERE id = :id",
            )?
            .query_row(&[(":id", &id)], Ledger::map_row)?;

        Ok(ledger)
    }

    fn get_by_name(&self, name: &str) -> Result<Ledger, Error> {
        let ledger = self
            .connection
            .lock()
            .expect("could not acquire database lock")
            .prepare(
                "SELECT id, name, account_code, liability, description FROM ledger
                 WHERE name = :name",
            )?
            .query_row(&[(":name", name)], Ledger::map_row)?;

        Ok(ledger)
    }

    fn get_all(&self) -> Result<Vec<Ledger>, Error> {
        self.connection
            .lock()
            .expect("could not acquire database lock")
            .prepare(
                "SELECT id, name, account_code, liability, description FROM ledger
                 ORDER BY account_code",
            )?
            .query_map([], Ledger::map_row)?
            .map(|maybe_ledger| maybe_ledger.map_err(|error| error.into()))
            .collect()
    }

    fn balance(&self, id: DatabaseID) -> Result<i64, Error> {
        let connection = self
            .connection
            .lock()
            .expect("could not acquire database lock");

        connection
            .query_row("SELECT id FROM ledger WHERE id = :id", &[(":id", &id)], |_| Ok(()))
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::InvalidLedger(id),
                error => error.into(),
            })?;

        let balance = connection.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM ledger_entry WHERE ledger_id = :id",
            &[(":id", &id)],
            |row| row.get(0),
        )?;

        Ok(balance)
    }
}
