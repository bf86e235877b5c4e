//! Ledgerbook is an embeddable double-entry accounting ledger backed by SQLite.
//!
//! The crate keeps a ledger of record (`"transaction"` and `ledger_entry`
//! tables) alongside a denormalized balance cache (`ledger_balance`) that is
//! updated in the same SQL transaction as every posting, so cached balances
//! can never drift from the entries they summarize. Transactions may be
//! linked to arbitrary "evidence" entities (orders, payments, invoices)
//! through a `(type, id)` reference pair, and can later be found by evidence
//! membership under [MatchType](stores::MatchType) semantics.
//!
//! Amounts are signed integers in the currency's smallest unit: debits are
//! positive and credits are negative. Every transaction must balance to
//! exactly zero across its entries.
//!
//! ```
//! # fn main() -> Result<(), ledgerbook::Error> {
//! use rusqlite::Connection;
//!
//! use ledgerbook::{
//!     credit, debit,
//!     models::TransactionBuilder,
//!     stores::{LedgerStore, TransactionStore, sqlite::create_ledger_stores},
//! };
//!
//! let mut stores = create_ledger_stores(Connection::open_in_memory()?)?;
//!
//! let revenue = stores.ledgers.get_or_create("Revenue", 4000, true, "")?;
//! let receivable = stores
//!     .ledgers
//!     .get_or_create("Accounts Receivable", 1100, false, "")?;
//!
//! let posted = stores.transactions.create(
//!     TransactionBuilder::new(1)
//!         .entry(receivable.id(), debit(100))
//!         .entry(revenue.id(), credit(100))
//!         .notes("invoice #42"),
//! )?;
//!
//! assert_eq!(stores.ledgers.balance(receivable.id())?, 100);
//! assert_eq!(stores.ledgers.balance(revenue.id())?, -100);
//! assert_eq!(posted.entries().len(), 2);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod amount;
pub mod db;
mod error;
pub mod models;
pub mod stores;
pub mod testing;

pub use amount::{credit, debit};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use models::DatabaseID;
