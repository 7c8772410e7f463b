//! Credit conservation invariant checker.
//!
//! Checked after every settlement, rollback, reset and refund:
//! ```text
//! Σ balances + Σ open stakes == issued − house take
//! ```
//!
//! `issued` counts starting grants and admin adjustments. Credits only move
//! between accounts, the open round and the house, so any drift means a
//! bookkeeping defect.

use hilo_intake::{AccountLedger, RoundLifecycle};
use hilo_types::{HiloError, HouseBook, Result};

/// Stateless verifier over the ledger, the open round and the house book.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreditConservation;

impl CreditConservation {
    /// Credits that should be held by accounts and the open round. Widened
    /// so the check itself cannot overflow.
    #[must_use]
    pub fn expected(ledger: &AccountLedger, house: &HouseBook) -> i128 {
        i128::from(ledger.issued()) - i128::from(house.take)
    }

    /// Credits actually held by accounts and the open round.
    #[must_use]
    pub fn actual(ledger: &AccountLedger, lifecycle: &RoundLifecycle) -> i128 {
        ledger.total_balance() + i128::from(lifecycle.round().total_staked())
    }

    /// # Errors
    /// Returns [`HiloError::CreditInvariantViolation`] if actual ≠ expected.
    pub fn verify(
        ledger: &AccountLedger,
        lifecycle: &RoundLifecycle,
        house: &HouseBook,
    ) -> Result<()> {
        let expected = Self::expected(ledger, house);
        let actual = Self::actual(ledger, lifecycle);
        if actual != expected {
            tracing::error!(
                actual,
                expected,
                issued = ledger.issued(),
                house_take = house.take,
                open_stakes = lifecycle.round().total_staked(),
                "Credit conservation violated"
            );
            return Err(HiloError::CreditInvariantViolation {
                reason: format!(
                    "held {actual} != expected {expected} (issued={}, house take={})",
                    ledger.issued(),
                    house.take
                ),
            });
        }
        Ok(())
    }
}
