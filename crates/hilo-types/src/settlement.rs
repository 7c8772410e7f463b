//! Settlement records.
//!
//! A [`SettlementRecord`] is produced atomically by resolving a round. It
//! keeps the exact bet sequence that was scored and the credit delta that
//! was applied to each account, which is everything a rollback needs to
//! restore the pre-settlement ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AccountId, Bet, Credits, HistoryEntry, Outcome, RoundId, SettlementId, Wager};

/// How one bet was scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetResult {
    pub sequence: u64,
    pub account_id: AccountId,
    pub wager: Wager,
    pub stake: Credits,
    /// Stake-inclusive return before commission (0 = loss).
    pub gross_payout: Credits,
    /// Win-side commission withheld, or loss-side fee charged.
    pub commission: Credits,
    /// Delta applied to the balance at resolve: the net payout on a win,
    /// minus the loss fee on a loss.
    pub credited: Credits,
}

impl BetResult {
    #[must_use]
    pub fn is_win(&self) -> bool {
        self.gross_payout > 0
    }

    /// Gain or loss relative to before the bet was placed.
    #[must_use]
    pub fn net(&self) -> Credits {
        self.credited - self.stake
    }
}

/// Per-account summary of a settled round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEntry {
    pub account_id: AccountId,
    /// Display name at settlement time.
    pub name: String,
    pub bets: usize,
    pub staked: Credits,
    pub gross_payout: Credits,
    pub commission: Credits,
    /// Credit delta applied at resolve (what rollback subtracts).
    pub applied: Credits,
    /// `applied - staked`: the account's result for the round.
    pub net_change: Credits,
    pub balance_after: Credits,
    /// Older history entries pushed out by this round's results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evicted_history: Vec<HistoryEntry>,
}

/// The outcome of resolving one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub id: SettlementId,
    pub round_id: RoundId,
    pub outcome: Outcome,
    /// The bets exactly as they stood when the round was closed.
    pub bets: Vec<Bet>,
    /// One result per bet, same order as `bets`.
    pub results: Vec<BetResult>,
    /// One entry per bettor, in order of first bet.
    pub entries: Vec<SettlementEntry>,
    /// The round was listed as commission-free.
    pub commission_waived: bool,
    /// Hex SHA-256 over round, outcome, bets and results.
    pub digest: String,
    pub settled_at: DateTime<Utc>,
}

impl SettlementRecord {
    /// Deterministic digest committing to what was settled.
    ///
    /// `SHA-256(domain_sep || round_id || outcome || for each bet: seq || account || wager || stake || credited)`
    #[must_use]
    pub fn compute_digest(
        round_id: RoundId,
        outcome: Outcome,
        bets: &[Bet],
        results: &[BetResult],
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"hilo:settlement:v1:");
        hasher.update(round_id.0.to_le_bytes());
        hasher.update(outcome.dice());
        hasher.update((bets.len() as u64).to_le_bytes());
        for (bet, result) in bets.iter().zip(results) {
            hasher.update(bet.sequence.to_le_bytes());
            hasher.update(bet.account_id.as_str().as_bytes());
            hasher.update([0u8]);
            hasher.update(bet.wager.to_string().as_bytes());
            hasher.update([0u8]);
            hasher.update(bet.stake.to_le_bytes());
            hasher.update(result.credited.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Recompute the digest and compare with the stored one.
    #[must_use]
    pub fn verify_digest(&self) -> bool {
        Self::compute_digest(self.round_id, self.outcome, &self.bets, &self.results) == self.digest
    }

    /// The entry for `account`, if it bet in this round.
    #[must_use]
    pub fn entry(&self, account: &AccountId) -> Option<&SettlementEntry> {
        self.entries.iter().find(|e| &e.account_id == account)
    }

    #[must_use]
    pub fn total_staked(&self) -> Credits {
        self.results.iter().map(|r| r.stake).sum()
    }

    #[must_use]
    pub fn total_gross(&self) -> Credits {
        self.results.iter().map(|r| r.gross_payout).sum()
    }

    #[must_use]
    pub fn total_commission(&self) -> Credits {
        self.results.iter().map(|r| r.commission).sum()
    }

    /// Sum of the deltas applied at resolve.
    #[must_use]
    pub fn total_applied(&self) -> Credits {
        self.results.iter().map(|r| r.credited).sum()
    }

    /// What the house kept from this round: stakes minus everything
    /// credited back (commission included).
    #[must_use]
    pub fn house_take(&self) -> Credits {
        self.total_staked() - self.total_applied()
    }

    /// Number of winning bets.
    #[must_use]
    pub fn winners(&self) -> usize {
        self.results.iter().filter(|r| r.is_win()).count()
    }
}
