//! Bet intake: the hard gate every wager passes through.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. round is OPEN
//! 2. account is not blocked
//! 3. wager code parses and is offered by the payout table
//! 4. `min ≤ stake ≤ max`
//! 5. round stakes of the account plus `stake` stay within the cap
//! 6. balance covers the stake (and, when pre-funding, the loss fee)
//!
//! Nothing is mutated until every check has passed.

use std::collections::BTreeMap;

use chrono::Utc;
use hilo_payout::PayoutRules;
use hilo_types::{
    AccountId, Bet, BetReceipt, Credits, HiloError, RefundSummary, Result, TableConfig, Wager,
};

use crate::{ledger::AccountLedger, lifecycle::RoundLifecycle};

/// Validates and records wagers against the current round.
#[derive(Debug, Clone, Copy)]
pub struct BetIntake<'a> {
    config: &'a TableConfig,
}

impl<'a> BetIntake<'a> {
    #[must_use]
    pub fn new(config: &'a TableConfig) -> Self {
        Self { config }
    }

    /// Place `stake` on `code` for `account`.
    ///
    /// On success the stake has been debited and the bet appended to the
    /// round. The account is created with the configured starting balance
    /// if this is its first reference.
    ///
    /// # Errors
    /// `RoundNotOpen`, `AccountBlocked`, `InvalidWagerCode`,
    /// `StakeOutOfBounds`, `CapExceeded` or `InsufficientCredit`, in that
    /// order of precedence. State is unchanged on any error.
    pub fn place(
        &self,
        ledger: &mut AccountLedger,
        lifecycle: &mut RoundLifecycle,
        account: &AccountId,
        code: &str,
        stake: Credits,
    ) -> Result<BetReceipt> {
        if !lifecycle.is_open() {
            return Err(HiloError::RoundNotOpen);
        }
        if ledger.is_blocked(account) {
            return Err(HiloError::AccountBlocked(account.clone()));
        }

        let wager = self.parse_wager(code)?;

        if stake < self.config.min_stake || stake > self.config.max_stake {
            return Err(HiloError::StakeOutOfBounds {
                stake,
                min: self.config.min_stake,
                max: self.config.max_stake,
            });
        }

        let existing = lifecycle.round().staked_by(account);
        let total = existing.saturating_add(stake);
        if total > self.config.per_person_cap {
            return Err(HiloError::CapExceeded {
                total,
                cap: self.config.per_person_cap,
            });
        }

        let needed = stake.saturating_add(self.prefunded_fee(lifecycle, total)?);
        let available = ledger.balance_or(account, self.config.starting_balance);
        if available < needed {
            return Err(HiloError::InsufficientCredit { needed, available });
        }

        ledger.get_or_create(account, self.config.starting_balance)?;
        let balance_after = ledger.debit(account, stake)?;
        let bet = lifecycle.push_bet(account.clone(), wager, stake);

        tracing::debug!(
            round = bet.round_id.0,
            sequence = bet.sequence,
            account = %account,
            wager = %bet.wager,
            family = bet.wager.family(),
            stake,
            balance_after,
            "Bet accepted"
        );

        Ok(BetReceipt {
            round_id: bet.round_id,
            sequence: bet.sequence,
            account_id: account.clone(),
            wager: bet.wager,
            stake,
            balance_after,
            accepted_at: Utc::now(),
        })
    }

    /// Refund and remove every current-round bet of `account`.
    ///
    /// Not an error when the account has no bets: the summary is empty and
    /// nothing changes.
    ///
    /// # Errors
    /// Returns `Internal` if the account has bets but no ledger entry.
    pub fn cancel_all(
        &self,
        ledger: &mut AccountLedger,
        lifecycle: &mut RoundLifecycle,
        account: &AccountId,
    ) -> Result<RefundSummary> {
        let count = lifecycle.round().bets_of(account).count();
        if count == 0 {
            return Ok(RefundSummary {
                account_id: account.clone(),
                bets: 0,
                refunded: 0,
                balance_after: ledger.balance_or(account, self.config.starting_balance),
            });
        }

        let refunded = lifecycle.round().staked_by(account);
        let balance_after = ledger.apply(account, refunded)?;
        lifecycle.take_bets_of(account);

        tracing::debug!(
            round = lifecycle.id().0,
            account = %account,
            bets = count,
            refunded,
            "Bets cancelled"
        );

        Ok(RefundSummary {
            account_id: account.clone(),
            bets: count,
            refunded,
            balance_after,
        })
    }

    /// Put bets taken from another round back into the current one, in
    /// order. Their stakes are already debited. A bet that would break the
    /// per-person cap or the loss-fee cover of the current round is
    /// refunded instead; one summary per refunded bettor is returned.
    ///
    /// # Errors
    /// `Internal` if a bettor is missing from the ledger, `CreditOverflow`
    /// if returning the stakes could leave the credit range. Nothing
    /// changes in either case.
    pub fn readmit(
        &self,
        ledger: &mut AccountLedger,
        lifecycle: &mut RoundLifecycle,
        carried: Vec<Bet>,
    ) -> Result<Vec<RefundSummary>> {
        let mut held: BTreeMap<AccountId, Credits> = BTreeMap::new();
        for bet in &carried {
            let total = held.entry(bet.account_id.clone()).or_insert(0);
            *total = total.saturating_add(bet.stake);
        }
        for (account, total) in &held {
            ledger.check_apply(account, *total)?;
        }

        let mut refunds: Vec<RefundSummary> = Vec::new();
        for bet in carried {
            let account = bet.account_id.clone();
            let stake = bet.stake;
            let held_now = held.get(&account).copied().unwrap_or(0);
            held.insert(account.clone(), held_now - stake);

            let total = lifecycle.round().staked_by(&account).saturating_add(stake);
            let available = ledger.balance_or(&account, 0).saturating_add(held_now);
            let needed = stake.saturating_add(self.prefunded_fee(lifecycle, total)?);
            if total <= self.config.per_person_cap && available >= needed {
                lifecycle.carry_bet(bet);
                continue;
            }

            let balance_after = ledger.apply(&account, stake)?;
            tracing::info!(
                round = lifecycle.id().0,
                account = %account,
                wager = %bet.wager,
                stake,
                total,
                cap = self.config.per_person_cap,
                available,
                needed,
                "Carried bet refunded"
            );
            match refunds.iter_mut().find(|r| r.account_id == account) {
                Some(summary) => {
                    summary.bets += 1;
                    summary.refunded += stake;
                    summary.balance_after = balance_after;
                }
                None => refunds.push(RefundSummary {
                    account_id: account,
                    bets: 1,
                    refunded: stake,
                    balance_after,
                }),
            }
        }
        Ok(refunds)
    }

    fn parse_wager(&self, code: &str) -> Result<Wager> {
        let wager: Wager = code.parse()?;
        if PayoutRules::new(&self.config.payouts).recognizes(&wager) {
            Ok(wager)
        } else {
            Err(HiloError::InvalidWagerCode {
                code: code.to_string(),
            })
        }
    }

    /// Loss fee the bettor must hold back for `round_total`, or 0 when the
    /// table does not pre-fund fees or the round is commission free.
    fn prefunded_fee(&self, lifecycle: &RoundLifecycle, round_total: Credits) -> Result<Credits> {
        if !self.config.prefund_loss_fee || self.config.is_commission_free(lifecycle.id()) {
            return Ok(0);
        }
        self.config.loss_fee(round_total)
    }
}
