//! Defines the transaction store trait and the evidence matching query types.

use crate::{
    Error,
    models::{
        DatabaseID, EntityRef, LedgerEntry, Transaction, TransactionBuilder, TransactionKind,
    },
};

/// Handles the posting and retrieval of transactions.
pub trait TransactionStore {
    /// Post a new transaction to the ledger.
    ///
    /// This is the only way transactions come into existence. The
    /// transaction row, its entries, one evidence link per distinct evidence
    /// object, and the balance cache rows for every (ledger, evidence) pair
    /// are written in a single atomic unit: either all of them commit, or
    /// none do.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NoLedgerEntries] if the builder has no entries,
    /// - [Error::ExistingLedgerEntry] if an entry was already posted,
    /// - [Error::UnbalancedEntries] if the entries do not sum to zero,
    /// - [Error::InvalidLedger] if an entry references a missing ledger,
    /// - or [Error::SqlError] if there is some other SQL error.
    ///
    /// All validation errors are raised before any row is written.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Retrieve a transaction with its entries and evidence by its `id`.
    fn get(&self, id: DatabaseID) -> Result<Transaction, Error>;

    /// Retrieve transactions in the way defined by `query`.
    fn get_query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, Error>;

    /// Retrieve the transactions matching the given evidence objects under
    /// `match_type` semantics.
    fn find_by_evidence(
        &self,
        evidence: &[EntityRef],
        match_type: MatchType,
    ) -> Result<Vec<Transaction>, Error> {
        self.get_query(TransactionQuery {
            evidence: evidence.to_vec(),
            match_type,
            ..Default::default()
        })
    }

    /// Retrieve every entry posted against the ledger `ledger_id`.
    fn entries_for_ledger(&self, ledger_id: DatabaseID) -> Result<Vec<LedgerEntry>, Error>;

    /// Get the total number of transactions in the store.
    fn count(&self) -> Result<usize, Error>;

    /// Retrieve the transaction kind named `name`, creating it if it does
    /// not exist.
    fn get_or_create_kind(
        &mut self,
        name: &str,
        description: &str,
    ) -> Result<TransactionKind, Error>;

    /// Retrieve a transaction kind by its `id`.
    fn get_kind(&self, id: DatabaseID) -> Result<TransactionKind, Error>;
}

/// The semantics used to match transactions against a set of evidence
/// objects.
///
/// Given transactions T1 (evidence {A}), T2 ({A, B}) and T3 ({B}), matching
/// on `[A]` yields: `Any` and `All` → {T1, T2}; `Exact` → {T1}; `None` →
/// {T3}.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchType {
    /// Match transactions linked to at least one of the given objects.
    Any,
    /// Match transactions linked to every given object; transactions with
    /// additional evidence still match.
    #[default]
    All,
    /// Match transactions linked to none of the given objects; other
    /// evidence is allowed.
    None,
    /// Match transactions whose evidence set equals the given set exactly.
    ///
    /// Slower than the other semantics: candidates are narrowed as for
    /// `All`, then each candidate's full evidence set is loaded and compared
    /// in application code.
    Exact,
}

/// Defines how transactions should be fetched from
/// [TransactionStore::get_query].
///
/// The default query matches every transaction: an empty evidence set places
/// no constraint under `Any`, `All`, and `None`, while under `Exact` it
/// matches only transactions with no evidence at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    /// The evidence objects to match on. Duplicates are ignored.
    pub evidence: Vec<EntityRef>,
    /// The matching semantics applied to `evidence`.
    pub match_type: MatchType,
    /// Selects up to the first N (`limit`) transactions.
    pub limit: Option<u64>,
    /// Skips the first `offset` transactions. Only applies when `limit` is
    /// set.
    pub offset: u64,
}
