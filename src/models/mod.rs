//! This module defines the domain data types for the ledger.

pub use balance::{Balances, LedgerBalance};
pub use entity_ref::EntityRef;
pub use kind::TransactionKind;
pub use ledger::Ledger;
pub use transaction::{LedgerEntry, Transaction, TransactionBuilder};

mod balance;
mod entity_ref;
mod kind;
mod ledger;
mod transaction;

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;
