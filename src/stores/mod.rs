//! Contains traits and implementations for objects that store the domain
//! [models](crate::models).

mod balance;
mod ledger;
mod transaction;

pub mod sqlite;

pub use balance::BalanceStore;
pub use ledger::LedgerStore;
pub use transaction::{MatchType, TransactionQuery, TransactionStore};
