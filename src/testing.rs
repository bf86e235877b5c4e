//! Assertion helpers for code that posts to the ledger.
//!
//! Systems built on top of the ledger verify their accounting side effects
//! with [assert_transaction_in_ledgers]: look up the one transaction carrying
//! exactly the given evidence, then check its entries against an expected set
//! of (ledger name, amount) pairs.

use time::OffsetDateTime;

use crate::{
    models::{DatabaseID, EntityRef},
    stores::{LedgerStore, MatchType, TransactionStore},
};

/// The expected shape of a posted transaction.
///
/// `amounts` is always checked; the remaining fields are only checked when
/// set.
#[derive(Debug, Clone, Default)]
pub struct ExpectedTransaction<'a> {
    /// The expected (ledger name, signed amount) pairs, in any order.
    pub amounts: Vec<(&'a str, i64)>,
    /// The expected free text notes.
    pub notes: Option<&'a str>,
    /// The expected transaction kind name.
    pub kind: Option<&'a str>,
    /// The expected posting principal.
    pub created_by: Option<DatabaseID>,
    /// The expected effective timestamp.
    pub posted_at: Option<OffsetDateTime>,
}

/// Assert that exactly one transaction carries exactly `evidence` and that
/// its entries match `expected`.
///
/// Entries are compared as an unordered multiset of (ledger name, amount)
/// pairs, so callers do not depend on entry insertion order.
///
/// # Panics
/// Panics if no transaction (or more than one) matches `evidence` exactly,
/// or if the matched transaction differs from `expected`.
pub fn assert_transaction_in_ledgers(
    transactions: &impl TransactionStore,
    ledgers: &impl LedgerStore,
    evidence: &[EntityRef],
    expected: &ExpectedTransaction,
) {
    let matches = transactions
        .find_by_evidence(evidence, MatchType::Exact)
        .expect("could not query transactions");

    assert_eq!(
        matches.len(),
        1,
        "want exactly 1 transaction with evidence {evidence:?}, got {}",
        matches.len()
    );
    let transaction = &matches[0];

    let mut got: Vec<(String, i64)> = transaction
        .entries()
        .iter()
        .map(|entry| {
            let ledger = ledgers
                .get(entry.ledger_id())
                .expect("could not load ledger");
            (ledger.name().to_owned(), entry.amount())
        })
        .collect();
    got.sort();

    let mut want: Vec<(String, i64)> = expected
        .amounts
        .iter()
        .map(|(name, amount)| ((*name).to_owned(), *amount))
        .collect();
    want.sort();

    assert_eq!(want, got, "want entry amounts {want:?}, got {got:?}");

    if let Some(notes) = expected.notes {
        assert_eq!(
            transaction.notes(),
            notes,
            "want notes {notes:?}, got {:?}",
            transaction.notes()
        );
    }

    if let Some(created_by) = expected.created_by {
        assert_eq!(
            transaction.created_by(),
            created_by,
            "want created_by {created_by}, got {}",
            transaction.created_by()
        );
    }

    if let Some(posted_at) = expected.posted_at {
        assert_eq!(
            transaction.posted_at(),
            posted_at,
            "want posted_at {posted_at}, got {}",
            transaction.posted_at()
        );
    }

    if let Some(kind) = expected.kind {
        let got_kind = transactions
            .get_kind(transaction.kind_id())
            .expect("could not load transaction kind");
        assert_eq!(
            got_kind.name(),
            kind,
            "want kind {kind:?}, got {:?}",
            got_kind.name()
        );
    }
}
