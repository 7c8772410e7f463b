//! Single-level undo of the last settlement.
//!
//! The manager holds one slot, not a stack. Every resolve replaces it and a
//! rollback empties it, so a second rollback without an intervening resolve
//! fails with [`HiloError::NoSettlementToRollback`].

use std::collections::BTreeMap;

use hilo_intake::{AccountLedger, BetIntake, RoundLifecycle};
use hilo_types::{
    AccountId, Credits, HiloError, HouseBook, RefundSummary, Result, SettlementRecord,
    TableConfig,
};
use serde::{Deserialize, Serialize};

/// What a rollback undid, and which carried bets it had to refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackReport {
    pub record: SettlementRecord,
    /// Bettors whose interim bets no longer fit the reopened round.
    pub refunded: Vec<RefundSummary>,
}

/// The "last round" slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollbackManager {
    last: Option<SettlementRecord>,
}

impl RollbackManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `record` as the one that can be undone, dropping any older one.
    pub fn store(&mut self, record: SettlementRecord) {
        if let Some(previous) = self.last.replace(record) {
            tracing::debug!(round = previous.round_id.0, "Superseded rollback slot");
        }
    }

    #[must_use]
    pub fn last(&self) -> Option<&SettlementRecord> {
        self.last.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last.is_none()
    }

    /// Invert the stored settlement exactly and reopen its round.
    ///
    /// Every credited amount is taken back, so balances return to what they
    /// were just before the resolve (win and loss commission included), and
    /// history entries the resolve pushed out come back. The record's bets
    /// become the current round again and the round is OPEN. Bets placed
    /// since follow them, unless one would now break the per-person cap or
    /// the loss-fee cover; those are refunded.
    ///
    /// # Errors
    /// `NoSettlementToRollback` if the slot is empty. `Internal` if a
    /// settled or carried account has disappeared from the ledger,
    /// `CreditOverflow` if reversing would leave the credit range. Nothing
    /// changes in either case.
    pub fn rollback_last(
        &mut self,
        config: &TableConfig,
        ledger: &mut AccountLedger,
        lifecycle: &mut RoundLifecycle,
        house: &mut HouseBook,
    ) -> Result<RollbackReport> {
        let record = self.last.as_ref().ok_or(HiloError::NoSettlementToRollback)?;
        if let Some(missing) = record
            .entries
            .iter()
            .find(|e| ledger.get(&e.account_id).is_none())
        {
            return Err(HiloError::Internal(format!(
                "rollback of {} references unknown account {}",
                record.round_id, missing.account_id
            )));
        }
        check_reversal(record, ledger, lifecycle)?;

        let record = self.last.take().ok_or(HiloError::NoSettlementToRollback)?;
        for entry in &record.entries {
            ledger.apply(&entry.account_id, -entry.applied)?;
            if let Some(account) = ledger.account_mut(&entry.account_id) {
                account.play_count = account.play_count.saturating_sub(entry.bets as u64);
                account.forget_round(record.round_id);
                account.restore_evicted(entry.evicted_history.clone());
            }
        }
        house.reverse_settlement(&record);
        let carried = lifecycle.reopen_with(record.round_id, record.bets.clone());
        let refunded = BetIntake::new(config).readmit(ledger, lifecycle, carried)?;

        tracing::info!(
            round = record.round_id.0,
            outcome = %record.outcome,
            bets = record.bets.len(),
            reversed = record.total_applied(),
            carried = lifecycle.bets().len() - record.bets.len(),
            refunded = refunded.len(),
            settlement = %record.id,
            digest = %record.digest,
            "Settlement rolled back"
        );

        Ok(RollbackReport { record, refunded })
    }
}

/// Verify that taking back every credited amount, and then returning every
/// carried stake in the worst case, keeps each balance in range.
fn check_reversal(
    record: &SettlementRecord,
    ledger: &AccountLedger,
    lifecycle: &RoundLifecycle,
) -> Result<()> {
    let mut combined: BTreeMap<&AccountId, Credits> = BTreeMap::new();
    for entry in &record.entries {
        let reverse = entry
            .applied
            .checked_neg()
            .ok_or_else(|| HiloError::CreditOverflow {
                account: entry.account_id.clone(),
                balance: ledger.balance_or(&entry.account_id, 0),
                delta: entry.applied,
            })?;
        ledger.check_apply(&entry.account_id, reverse)?;
        combined.insert(&entry.account_id, reverse);
    }
    for bet in lifecycle.bets() {
        let delta = combined.entry(&bet.account_id).or_insert(0);
        *delta = delta
            .checked_add(bet.stake)
            .ok_or_else(|| HiloError::CreditOverflow {
                account: bet.account_id.clone(),
                balance: ledger.balance_or(&bet.account_id, 0),
                delta: bet.stake,
            })?;
    }
    for (account, delta) in combined {
        ledger.check_apply(account, delta)?;
    }
    Ok(())
}
