//! Sign helpers for ledger entry amounts.
//!
//! The module convention is that debits are positive and credits are
//! negative. Callers express amounts as non-negative magnitudes ("debit
//! $100", "credit $100") and these helpers normalize the sign so the
//! zero-sum check downstream is sign-correct.

/// The signed amount of a debit of `magnitude` smallest currency units.
///
/// # Panics
/// Panics if `magnitude` is negative. Pass the magnitude of the debit, not a
/// pre-signed amount.
pub fn debit(magnitude: i64) -> i64 {
    assert!(magnitude >= 0, "debit magnitude must be non-negative");
    magnitude
}

/// The signed amount of a credit of `magnitude` smallest currency units.
///
/// # Panics
/// Panics if `magnitude` is negative. Pass the magnitude of the credit, not a
/// pre-signed amount.
pub fn credit(magnitude: i64) -> i64 {
    assert!(magnitude >= 0, "credit magnitude must be non-negative");
    -magnitude
}
