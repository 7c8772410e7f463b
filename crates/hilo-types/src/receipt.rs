//! Receipts returned to the bettor by intake operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Credits, RoundId, Wager};

/// Proof that a bet was accepted and funded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetReceipt {
    pub round_id: RoundId,
    pub sequence: u64,
    pub account_id: AccountId,
    pub wager: Wager,
    pub stake: Credits,
    /// Balance after the stake was debited.
    pub balance_after: Credits,
    pub accepted_at: DateTime<Utc>,
}

/// Stakes returned to one account by a cancel or a round refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundSummary {
    pub account_id: AccountId,
    /// Number of bets removed from the round.
    pub bets: usize,
    /// Total stake credited back.
    pub refunded: Credits,
    pub balance_after: Credits,
}

impl RefundSummary {
    /// Whether anything was actually refunded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bets == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_refund() {
        let summary = RefundSummary {
            account_id: AccountId::from("u"),
            bets: 0,
            refunded: 0,
            balance_after: 10,
        };
        assert!(summary.is_empty());
    }

    #[test]
    fn bet_receipt_serde_roundtrip() {
        let receipt = BetReceipt {
            round_id: RoundId(2),
            sequence: 3,
            account_id: AccountId::from("u"),
            wager: Wager::Pair(1, 2),
            stake: 40,
            balance_after: 960,
            accepted_at: Utc::now(),
        };
        let json = serde_json::to_string(&receipt).unwrap();
        let back: BetReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, receipt);
    }
}
