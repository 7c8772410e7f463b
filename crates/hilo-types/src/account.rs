//! Participant accounts.
//!
//! Every participant has a single integer `balance` in the smallest credit
//! unit. Stakes are debited at bet time, so a balance never reflects
//! unfunded exposure; only admin adjustments may push it below zero.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{AccountId, Outcome, RoundId, Wager};

/// Integer credit amount (smallest currency unit). Signed so that an
/// administrative adjustment can represent debt.
pub type Credits = i64;

/// One settled bet in an account's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub round_id: RoundId,
    pub wager: Wager,
    pub stake: Credits,
    pub outcome: Outcome,
    /// Amount credited back at settlement (0 for a loss, net of any
    /// win commission otherwise).
    pub credited: Credits,
    /// Extra loss-side commission debited at settlement.
    pub fee: Credits,
}

impl HistoryEntry {
    /// Gain or loss of this bet relative to before it was placed.
    #[must_use]
    pub fn net(&self) -> Credits {
        self.credited - self.fee - self.stake
    }
}

/// A participant's credit account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Display name set by an admin.
    #[serde(default)]
    pub name: Option<String>,
    pub balance: Credits,
    /// Blocked accounts cannot bet but can still be settled and adjusted.
    #[serde(default)]
    pub blocked: bool,
    /// Number of bets settled for this account.
    #[serde(default)]
    pub play_count: u64,
    /// Most recent settled bets, oldest first.
    #[serde(default)]
    pub history: VecDeque<HistoryEntry>,
}

impl Account {
    /// Create an account with the given starting balance.
    #[must_use]
    pub fn new(id: AccountId, starting_balance: Credits) -> Self {
        Self {
            id,
            name: None,
            balance: starting_balance,
            blocked: false,
            play_count: 0,
            history: VecDeque::new(),
        }
    }

    /// The admin-assigned name, falling back to the raw id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }

    /// Append a settled bet, evicting the oldest entries beyond `limit`.
    /// Returns the evicted entries, oldest first.
    pub fn push_history(&mut self, entry: HistoryEntry, limit: usize) -> Vec<HistoryEntry> {
        self.history.push_back(entry);
        let excess = self.history.len().saturating_sub(limit);
        self.history.drain(..excess).collect()
    }

    /// Put back entries previously returned by
    /// [`push_history`](Self::push_history) in front of the current history.
    pub fn restore_evicted(&mut self, evicted: Vec<HistoryEntry>) {
        for entry in evicted.into_iter().rev() {
            self.history.push_front(entry);
        }
    }

    /// Remove every history entry of `round_id`, returning how many went.
    pub fn forget_round(&mut self, round_id: RoundId) -> usize {
        let before = self.history.len();
        self.history.retain(|h| h.round_id != round_id);
        before - self.history.len()
    }

    /// The last `n` history entries, oldest first.
    pub fn recent_history(&self, n: usize) -> impl Iterator<Item = &HistoryEntry> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip)
    }
}
