//! Round resolution.
//!
//! `resolve` settles every bet of the current round against one outcome:
//!
//! 1. Require at least one bet
//! 2. Score every bet and compute commission (the plan)
//! 3. Fold the plan into one entry per account and check every entry
//!    lands on a known account without leaving the credit range
//! 4. Close the round, update profiles, apply the entries and the house book
//! 5. Build the record and advance the round
//!
//! Steps 1-3 do not mutate anything, so a failure leaves state untouched.

use chrono::Utc;
use hilo_intake::{AccountLedger, RoundLifecycle};
use hilo_payout::PayoutRules;
use hilo_types::{
    Bet, BetResult, Credits, HiloError, HistoryEntry, HouseBook, Outcome, Result,
    SettlementEntry, SettlementId, SettlementRecord, TableConfig,
};

/// Scores a round and applies the result to the ledger.
#[derive(Debug, Clone, Copy)]
pub struct SettlementEngine<'a> {
    config: &'a TableConfig,
}

impl<'a> SettlementEngine<'a> {
    #[must_use]
    pub fn new(config: &'a TableConfig) -> Self {
        Self { config }
    }

    /// Settle the current round against `outcome`.
    ///
    /// Permitted whether the round is OPEN or already closed. On success the
    /// round id has advanced and a fresh, empty round is CLOSED.
    ///
    /// # Errors
    /// `NothingToSettle` if the round has no bets. `Internal` if a bettor
    /// is missing from the ledger, `CreditOverflow` if a payout would take a
    /// balance out of range; nothing is applied in either case.
    pub fn resolve(
        &self,
        ledger: &mut AccountLedger,
        lifecycle: &mut RoundLifecycle,
        house: &mut HouseBook,
        outcome: Outcome,
    ) -> Result<SettlementRecord> {
        let round_id = lifecycle.id();
        if lifecycle.bets().is_empty() {
            return Err(HiloError::NothingToSettle(round_id));
        }

        let waived = self.config.is_commission_free(round_id);
        let results = self.plan(lifecycle.bets(), &outcome, waived)?;
        let mut entries: Vec<SettlementEntry> = Vec::new();
        for result in &results {
            accumulate(&mut entries, result)?;
        }
        if let Some(missing) = entries.iter().find(|e| ledger.get(&e.account_id).is_none()) {
            return Err(HiloError::Internal(format!(
                "settlement of {round_id} references unknown account {}",
                missing.account_id
            )));
        }
        for entry in &entries {
            ledger.check_apply(&entry.account_id, entry.applied)?;
        }

        // Commit.
        let bets = lifecycle.close_for_settlement();
        for result in &results {
            let Some(account) = ledger.account_mut(&result.account_id) else {
                continue;
            };
            account.play_count += 1;
            let evicted = account.push_history(
                HistoryEntry {
                    round_id,
                    wager: result.wager,
                    stake: result.stake,
                    outcome,
                    credited: result.credited.max(0),
                    fee: (-result.credited).max(0),
                },
                self.config.history_limit,
            );
            if let Some(entry) = entries.iter_mut().find(|e| e.account_id == result.account_id) {
                entry
                    .evicted_history
                    .extend(evicted.into_iter().filter(|h| h.round_id != round_id));
            }
        }
        for entry in &mut entries {
            entry.balance_after = ledger.apply(&entry.account_id, entry.applied)?;
            if let Some(account) = ledger.get(&entry.account_id) {
                entry.name = account.display_name().to_string();
            }
        }

        let digest = SettlementRecord::compute_digest(round_id, outcome, &bets, &results);
        let record = SettlementRecord {
            id: SettlementId::new(),
            round_id,
            outcome,
            bets,
            results,
            entries,
            commission_waived: waived,
            digest,
            settled_at: Utc::now(),
        };
        house.record_settlement(&record);
        let next = lifecycle.begin_next();

        tracing::info!(
            round = round_id.0,
            outcome = %outcome,
            sum = outcome.sum(),
            bean = outcome.bean(),
            score = outcome.score(),
            bets = record.bets.len(),
            winners = record.winners(),
            staked = record.total_staked(),
            applied = record.total_applied(),
            commission = record.total_commission(),
            commission_waived = waived,
            settlement = %record.id,
            digest = %record.digest,
            next_round = next.0,
            "Round resolved"
        );

        Ok(record)
    }

    /// Score every bet without touching any state.
    fn plan(&self, bets: &[Bet], outcome: &Outcome, waived: bool) -> Result<Vec<BetResult>> {
        let rules = PayoutRules::new(&self.config.payouts);
        bets.iter()
            .map(|bet| {
                let gross = rules.evaluate(&bet.wager, bet.stake, outcome);
                let (credited, commission) = if gross > 0 {
                    let net = if waived { gross } else { self.config.net_win(gross)? };
                    (net, gross - net)
                } else {
                    let fee = if waived { 0 } else { self.config.loss_fee(bet.stake)? };
                    (-fee, fee)
                };
                Ok(BetResult {
                    sequence: bet.sequence,
                    account_id: bet.account_id.clone(),
                    wager: bet.wager,
                    stake: bet.stake,
                    gross_payout: gross,
                    commission,
                    credited,
                })
            })
            .collect()
    }
}

/// Fold one bet result into the per-account summary, keeping first-bet order.
fn accumulate(entries: &mut Vec<SettlementEntry>, result: &BetResult) -> Result<()> {
    let index = match entries.iter().position(|e| e.account_id == result.account_id) {
        Some(index) => index,
        None => {
            entries.push(SettlementEntry {
                account_id: result.account_id.clone(),
                name: String::new(),
                bets: 0,
                staked: 0,
                gross_payout: 0,
                commission: 0,
                applied: 0,
                net_change: 0,
                balance_after: 0,
                evicted_history: Vec::new(),
            });
            entries.len() - 1
        }
    };
    let entry = &mut entries[index];
    let overflow = || HiloError::CreditOverflow {
        account: result.account_id.clone(),
        balance: entry.applied,
        delta: result.credited,
    };
    entry.applied = entry.applied.checked_add(result.credited).ok_or_else(overflow)?;
    entry.bets += 1;
    entry.staked += result.stake;
    entry.gross_payout += result.gross_payout;
    entry.commission += result.commission;
    entry.net_change = entry.applied - entry.staked;
    Ok(())
}

/// Net change of a whole record, for reporting.
#[must_use]
pub fn total_net_change(record: &SettlementRecord) -> Credits {
    record.entries.iter().map(|e| e.net_change).sum()
}

#[cfg(test)]
mod tests {
    use hilo_intake::BetIntake;
    use hilo_types::{AccountId, RoundId, RoundState};
    use rust_decimal::Decimal;

    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::from(s)
    }

    fn o(s: &str) -> Outcome {
        s.parse().unwrap()
    }

    struct Table {
        config: TableConfig,
        ledger: AccountLedger,
        lifecycle: RoundLifecycle,
        house: HouseBook,
    }

    impl Table {
        fn new(config: TableConfig) -> Self {
            let mut lifecycle = RoundLifecycle::new();
            lifecycle.open();
            Self {
                config,
                ledger: AccountLedger::new(),
                lifecycle,
                house: HouseBook::new(),
            }
        }

        fn fund(&mut self, who: &str, amount: Credits) {
            self.ledger.adjust(&id(who), amount, 0).unwrap();
        }

        fn bet(&mut self, who: &str, code: &str, stake: Credits) {
            BetIntake::new(&self.config)
                .place(&mut self.ledger, &mut self.lifecycle, &id(who), code, stake)
                .unwrap();
        }

        fn resolve(&mut self, outcome: &str) -> Result<SettlementRecord> {
            SettlementEngine::new(&self.config).resolve(
                &mut self.ledger,
                &mut self.lifecycle,
                &mut self.house,
                o(outcome),
            )
        }

        fn balance(&self, who: &str) -> Credits {
            self.ledger.balance_or(&id(who), 0)
        }
    }

    fn config() -> TableConfig {
        TableConfig {
            max_stake: 1000,
            per_person_cap: 1000,
            ..TableConfig::default()
        }
    }

    #[test]
    fn empty_round_has_nothing_to_settle() {
        let mut t = Table::new(config());
        let err = t.resolve("123").unwrap_err();
        assert!(matches!(err, HiloError::NothingToSettle(RoundId(1))));
        assert_eq!(t.lifecycle.id(), RoundId(1));
        assert!(t.lifecycle.is_open());
    }

    #[test]
    fn single_digit_win_credits_gross() {
        let mut t = Table::new(config());
        t.fund("A", 1000);
        t.bet("A", "1", 100);
        assert_eq!(t.balance("A"), 900);

        let record = t.resolve("111").unwrap();
        // Three ones: single ×4.
        assert_eq!(record.results[0].gross_payout, 400);
        assert_eq!(t.balance("A"), 1300);
        assert_eq!(record.entries[0].net_change, 300);
        assert_eq!(record.entries[0].balance_after, 1300);
    }

    #[test]
    fn resolve_advances_to_closed_empty_round() {
        let mut t = Table::new(config());
        t.fund("A", 1000);
        t.bet("A", "H", 100);
        t.resolve("456").unwrap();
        assert_eq!(t.lifecycle.id(), RoundId(2));
        assert_eq!(t.lifecycle.state(), RoundState::Closed);
        assert!(t.lifecycle.bets().is_empty());
    }

    #[test]
    fn resolve_from_closed_round() {
        let mut t = Table::new(config());
        t.fund("A", 1000);
        t.bet("A", "H", 100);
        t.lifecycle.close();
        t.resolve("456").unwrap();
        assert_eq!(t.balance("A"), 1100);
    }

    #[test]
    fn triple_credited_in_full_without_commission() {
        let mut t = Table::new(config());
        t.fund("A", 1000);
        t.bet("A", "555", 100);
        let record = t.resolve("555").unwrap();
        assert_eq!(record.results[0].credited, 10_000);
        assert_eq!(t.balance("A"), 10_900);
    }

    #[test]
    fn win_commission_reduces_payout() {
        let mut t = Table::new(TableConfig {
            water_win: Decimal::new(5, 0),
            ..config()
        });
        t.fund("A", 1000);
        t.bet("A", "555", 100);
        let record = t.resolve("555").unwrap();
        assert_eq!(record.results[0].credited, 9_500);
        assert_eq!(record.results[0].commission, 500);
        assert_eq!(t.house.commission, 500);
    }

    #[test]
    fn loser_pays_extra_fee() {
        let mut t = Table::new(TableConfig {
            water_lose: Decimal::new(10, 0),
            ..config()
        });
        t.fund("B", 1000);
        t.fund("C", 1000);
        t.bet("B", "3", 50);
        t.bet("C", "4", 50);

        let record = t.resolve("356").unwrap();
        assert_eq!(t.balance("B"), 1050);
        // 50 stake plus floor(50 × 10%) = 5.
        assert_eq!(t.balance("C"), 945);
        assert_eq!(record.entry(&id("C")).unwrap().net_change, -55);
        assert_eq!(record.total_commission(), 5);
        assert_eq!(t.house.take, 5);
    }

    #[test]
    fn free_commission_round_skips_both_sides() {
        let mut cfg = TableConfig {
            water_win: Decimal::new(5, 0),
            water_lose: Decimal::new(10, 0),
            ..config()
        };
        cfg.free_commission_rounds.insert(RoundId(1));
        let mut t = Table::new(cfg);
        t.fund("B", 1000);
        t.fund("C", 1000);
        t.bet("B", "3", 100);
        t.bet("C", "4", 100);
        let record = t.resolve("356").unwrap();
        assert!(record.commission_waived);
        assert_eq!(t.balance("B"), 1100);
        assert_eq!(t.balance("C"), 900);
        assert_eq!(record.total_commission(), 0);
    }

    #[test]
    fn entries_aggregate_per_account_in_first_bet_order() {
        let mut t = Table::new(config());
        t.fund("A", 1000);
        t.fund("B", 1000);
        t.bet("B", "L", 10);
        t.bet("A", "H", 10);
        t.bet("B", "2", 10);
        t.ledger.set_name(&id("B"), "Bee", 0).unwrap();
        let record = t.resolve("235").unwrap();
        assert_eq!(record.entries.len(), 2);
        assert_eq!(record.entries[0].account_id, id("B"));
        assert_eq!(record.entries[0].name, "Bee");
        assert_eq!(record.entries[0].bets, 2);
        // L on 10 wins ×2, "2" once wins ×2.
        assert_eq!(record.entries[0].applied, 40);
        assert_eq!(record.entries[0].net_change, 20);
        assert_eq!(record.entries[1].net_change, -10);
    }

    #[test]
    fn accounting_law_holds() {
        let mut t = Table::new(TableConfig {
            water_win: Decimal::new(3, 0),
            water_lose: Decimal::new(15, 1),
            ..config()
        });
        for who in ["A", "B", "C"] {
            t.fund(who, 5000);
        }
        t.bet("A", "H", 999);
        t.bet("B", "L", 700);
        t.bet("C", "26", 300);
        t.bet("A", "6", 1);
        let record = t.resolve("266").unwrap();
        assert_eq!(
            total_net_change(&record),
            record.total_gross() - record.total_staked() - record.total_commission()
        );
        assert_eq!(t.house.take, record.total_staked() - record.total_applied());
        assert!(record.verify_digest());
    }

    #[test]
    fn profiles_updated() {
        let mut t = Table::new(config());
        t.fund("A", 1000);
        t.bet("A", "H", 10);
        t.bet("A", "1", 10);
        t.resolve("456").unwrap();
        let account = t.ledger.get(&id("A")).unwrap();
        assert_eq!(account.play_count, 2);
        assert_eq!(account.history.len(), 2);
        assert_eq!(account.history[0].credited, 20);
        assert_eq!(account.history[1].credited, 0);
        assert_eq!(account.history[1].net(), -10);
    }

    #[test]
    fn unknown_bettor_aborts_without_changes() {
        let mut t = Table::new(config());
        t.fund("A", 1000);
        t.bet("A", "H", 100);
        t.ledger = AccountLedger::new();
        let before = t.lifecycle.clone();
        assert!(matches!(t.resolve("456"), Err(HiloError::Internal(_))));
        assert_eq!(t.lifecycle, before);
        assert_eq!(t.house, HouseBook::new());
    }

    #[test]
    fn payout_out_of_range_aborts_without_changes() {
        let mut t = Table::new(config());
        t.fund("A", i64::MAX - 100);
        t.bet("A", "555", 100);
        let before = (t.ledger.clone(), t.lifecycle.clone());
        let err = t.resolve("555").unwrap_err();
        assert!(matches!(err, HiloError::CreditOverflow { .. }));
        assert_eq!((t.ledger.clone(), t.lifecycle.clone()), before);
        assert_eq!(t.house, HouseBook::new());
    }

    #[test]
    fn entries_keep_history_pushed_out_by_earlier_rounds_only() {
        let mut t = Table::new(TableConfig {
            history_limit: 1,
            ..config()
        });
        t.fund("A", 1000);
        t.bet("A", "H", 10);
        t.resolve("456").unwrap();

        t.lifecycle.open();
        t.bet("A", "L", 10);
        t.bet("A", "1", 10);
        let record = t.resolve("123").unwrap();
        let evicted = &record.entries[0].evicted_history;
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].round_id, RoundId(1));
        let history = &t.ledger.get(&id("A")).unwrap().history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].round_id, RoundId(2));
    }
}
