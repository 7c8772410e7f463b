//! Round lifecycle: the state machine gating intake and settlement.
//!
//! **CLOSED → OPEN → CLOSED**. `open` starts accepting bets, `close` stops
//! them, and settlement closes the round and begins the next one CLOSED.
//! `reset` drops the bets without touching credits; `refund` returns every
//! stake in full. Both leave the round CLOSED.

use chrono::Utc;
use hilo_types::{
    AccountId, Bet, Credits, RefundSummary, Result, Round, RoundId, RoundState, Wager,
};
use serde::{Deserialize, Serialize};

use crate::ledger::AccountLedger;

/// Owns the current round and its bets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundLifecycle {
    round: Round,
}

impl RoundLifecycle {
    /// Start at round 1, CLOSED.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a persisted round.
    #[must_use]
    pub fn from_round(round: Round) -> Self {
        Self { round }
    }

    #[must_use]
    pub fn round(&self) -> &Round {
        &self.round
    }

    #[must_use]
    pub fn id(&self) -> RoundId {
        self.round.id
    }

    #[must_use]
    pub fn state(&self) -> RoundState {
        self.round.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.round.is_open()
    }

    #[must_use]
    pub fn bets(&self) -> &[Bet] {
        &self.round.bets
    }

    /// Start accepting bets. Existing bets are kept.
    pub fn open(&mut self) -> RoundId {
        self.round.state = RoundState::Open;
        tracing::info!(round = self.round.id.0, bets = self.round.bets.len(), "Round opened");
        self.round.id
    }

    /// Stop accepting bets.
    pub fn close(&mut self) -> RoundId {
        self.round.state = RoundState::Closed;
        tracing::info!(round = self.round.id.0, bets = self.round.bets.len(), "Round closed");
        self.round.id
    }

    /// Append an already-funded bet. Only [`BetIntake`](crate::BetIntake)
    /// should call this, after every check has passed.
    pub(crate) fn push_bet(&mut self, account_id: AccountId, wager: Wager, stake: Credits) -> &Bet {
        let bet = Bet {
            round_id: self.round.id,
            account_id,
            wager,
            stake,
            sequence: self.round.next_sequence,
            placed_at: Utc::now(),
        };
        self.round.next_sequence += 1;
        self.round.bets.push(bet);
        &self.round.bets[self.round.bets.len() - 1]
    }

    /// Remove and return every bet of `account`, preserving the rest.
    pub(crate) fn take_bets_of(&mut self, account: &AccountId) -> Vec<Bet> {
        let (mine, rest): (Vec<Bet>, Vec<Bet>) = std::mem::take(&mut self.round.bets)
            .into_iter()
            .partition(|b| &b.account_id == account);
        self.round.bets = rest;
        mine
    }

    /// Close the round and hand its bets to settlement. The round id is
    /// unchanged until [`begin_next`](Self::begin_next).
    pub fn close_for_settlement(&mut self) -> Vec<Bet> {
        self.round.state = RoundState::Closed;
        std::mem::take(&mut self.round.bets)
    }

    /// Advance to a fresh, CLOSED, empty round.
    pub fn begin_next(&mut self) -> RoundId {
        self.round = Round::new(self.round.id.next());
        self.round.id
    }

    /// Re-enter `round_id` with `restored` bets, OPEN. Returns the bets
    /// that were in the current round; they are no longer part of it and
    /// must be readmitted with [`carry_bet`](Self::carry_bet) or refunded.
    pub fn reopen_with(&mut self, round_id: RoundId, restored: Vec<Bet>) -> Vec<Bet> {
        let carried = std::mem::take(&mut self.round.bets);
        let mut bets = restored;
        for (seq, bet) in (0u64..).zip(bets.iter_mut()) {
            bet.round_id = round_id;
            bet.sequence = seq;
        }
        self.round = Round {
            id: round_id,
            state: RoundState::Open,
            next_sequence: bets.len() as u64,
            bets,
        };
        tracing::info!(
            round = round_id.0,
            bets = self.round.bets.len(),
            carried = carried.len(),
            "Round reopened"
        );
        carried
    }

    /// Append a bet taken from another round, keeping its placement time.
    /// The stake is expected to be debited already.
    pub(crate) fn carry_bet(&mut self, mut bet: Bet) -> &Bet {
        bet.round_id = self.round.id;
        bet.sequence = self.round.next_sequence;
        self.round.next_sequence += 1;
        self.round.bets.push(bet);
        &self.round.bets[self.round.bets.len() - 1]
    }

    /// Drop every bet without touching credits and close the round.
    /// Returns the total stake forfeited.
    pub fn reset(&mut self) -> Credits {
        let forfeited = self.round.total_staked();
        let dropped = self.round.bets.len();
        self.round.bets.clear();
        self.round.state = RoundState::Closed;
        tracing::info!(round = self.round.id.0, dropped, forfeited, "Round reset");
        forfeited
    }

    /// Refund every stake in full, clear the bets and close the round.
    /// One summary per bettor, in order of first bet.
    ///
    /// # Errors
    /// Returns `Internal` if a bettor is missing from the ledger; the round
    /// is left untouched in that case.
    pub fn refund(&mut self, ledger: &mut AccountLedger) -> Result<Vec<RefundSummary>> {
        let mut summaries: Vec<RefundSummary> = Vec::new();
        for bet in &self.round.bets {
            match summaries.iter_mut().find(|s| s.account_id == bet.account_id) {
                Some(summary) => {
                    summary.bets += 1;
                    summary.refunded += bet.stake;
                }
                None => summaries.push(RefundSummary {
                    account_id: bet.account_id.clone(),
                    bets: 1,
                    refunded: bet.stake,
                    balance_after: 0,
                }),
            }
        }
        if let Some(missing) = summaries.iter().find(|s| ledger.get(&s.account_id).is_none()) {
            return Err(hilo_types::HiloError::Internal(format!(
                "refund for unknown account {}",
                missing.account_id
            )));
        }
        for summary in &mut summaries {
            summary.balance_after = ledger.apply(&summary.account_id, summary.refunded)?;
        }
        self.round.bets.clear();
        self.round.state = RoundState::Closed;
        tracing::info!(
            round = self.round.id.0,
            accounts = summaries.len(),
            refunded = summaries.iter().map(|s| s.refunded).sum::<Credits>(),
            "Round refunded"
        );
        Ok(summaries)
    }
}
