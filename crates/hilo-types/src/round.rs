//! Round and bet types.
//!
//! A round is one betting cycle: bets flow in while it is OPEN, and the
//! whole bet set is resolved atomically against an outcome.
//! **CLOSED → OPEN → CLOSED**, with resolve always leaving the next round
//! CLOSED.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Credits, RoundId, Wager};

/// Whether the current round accepts bets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoundState {
    /// Not accepting bets (initial state).
    #[default]
    Closed,
    /// Accepting bets.
    Open,
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
        }
    }
}

/// A pre-funded wager. The stake was debited when the bet was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub round_id: RoundId,
    pub account_id: AccountId,
    pub wager: Wager,
    pub stake: Credits,
    /// Arrival order within the round, starting at 0.
    pub sequence: u64,
    pub placed_at: DateTime<Utc>,
}

/// The current round and its bets in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub state: RoundState,
    pub bets: Vec<Bet>,
    /// Sequence number handed to the next accepted bet.
    #[serde(default)]
    pub next_sequence: u64,
}

impl Round {
    /// A fresh, CLOSED, empty round.
    #[must_use]
    pub fn new(id: RoundId) -> Self {
        Self {
            id,
            state: RoundState::Closed,
            bets: Vec::new(),
            next_sequence: 0,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == RoundState::Open
    }

    /// Sum of every stake in the round.
    #[must_use]
    pub fn total_staked(&self) -> Credits {
        self.bets.iter().map(|b| b.stake).sum()
    }

    /// Sum of `account`'s stakes in the round.
    #[must_use]
    pub fn staked_by(&self, account: &AccountId) -> Credits {
        self.bets_of(account).map(|b| b.stake).sum()
    }

    /// `account`'s bets in arrival order.
    pub fn bets_of<'a>(&'a self, account: &'a AccountId) -> impl Iterator<Item = &'a Bet> {
        self.bets.iter().filter(move |b| &b.account_id == account)
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::new(RoundId::FIRST)
    }
}
