//! End-to-end tests across the intake and finality planes.
//!
//! These exercise the full round lifecycle:
//! `open` -> `BetIntake.place()` -> `SettlementEngine.resolve()` ->
//! `RollbackManager.rollback_last()`
//!
//! They check the pre-funding, round-trip, accounting and inverse laws on
//! fixed scenarios and on randomised rounds.

use hilo_intake::{AccountLedger, BetIntake, RoundLifecycle};
use hilo_settlement::{
    CreditConservation, RollbackManager, RollbackReport, SettlementEngine, total_net_change,
};
use hilo_types::*;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rust_decimal::Decimal;

/// Helper: one table with every piece of state a round touches.
struct RoundPipeline {
    config: TableConfig,
    ledger: AccountLedger,
    lifecycle: RoundLifecycle,
    house: HouseBook,
    slot: RollbackManager,
}

impl RoundPipeline {
    fn new(config: TableConfig) -> Self {
        Self {
            config,
            ledger: AccountLedger::new(),
            lifecycle: RoundLifecycle::new(),
            house: HouseBook::new(),
            slot: RollbackManager::new(),
        }
    }

    fn fund(&mut self, who: &str, amount: Credits) {
        self.ledger
            .adjust(&AccountId::from(who), amount, self.config.starting_balance)
            .unwrap();
    }

    fn balance(&self, who: &str) -> Credits {
        self.ledger
            .balance_or(&AccountId::from(who), self.config.starting_balance)
    }

    fn place(&mut self, who: &str, code: &str, stake: Credits) -> Result<BetReceipt> {
        BetIntake::new(&self.config).place(
            &mut self.ledger,
            &mut self.lifecycle,
            &AccountId::from(who),
            code,
            stake,
        )
    }

    fn cancel_all(&mut self, who: &str) -> RefundSummary {
        BetIntake::new(&self.config)
            .cancel_all(&mut self.ledger, &mut self.lifecycle, &AccountId::from(who))
            .expect("cancel should succeed")
    }

    fn resolve(&mut self, outcome: &str) -> Result<SettlementRecord> {
        let outcome: Outcome = outcome.parse()?;
        let record = SettlementEngine::new(&self.config).resolve(
            &mut self.ledger,
            &mut self.lifecycle,
            &mut self.house,
            outcome,
        )?;
        self.slot.store(record.clone());
        CreditConservation::verify(&self.ledger, &self.lifecycle, &self.house)?;
        Ok(record)
    }

    fn rollback(&mut self) -> Result<RollbackReport> {
        let report = self.slot.rollback_last(
            &self.config,
            &mut self.ledger,
            &mut self.lifecycle,
            &mut self.house,
        )?;
        CreditConservation::verify(&self.ledger, &self.lifecycle, &self.house)?;
        Ok(report)
    }
}

fn example_config() -> TableConfig {
    TableConfig {
        min_stake: 1,
        max_stake: 1000,
        per_person_cap: 1000,
        water_win: Decimal::ZERO,
        water_lose: Decimal::ZERO,
        ..TableConfig::default()
    }
}

#[test]
fn e2e_single_digit_win_and_rollback() {
    let mut p = RoundPipeline::new(example_config());
    p.fund("A", 1000);
    p.lifecycle.open();

    let receipt = p.place("A", "1", 100).unwrap();
    assert_eq!(receipt.balance_after, 900);

    // "1" shows once: ×2, net +100.
    let record = p.resolve("123").unwrap();
    assert_eq!(record.results[0].gross_payout, 200);
    assert_eq!(record.entries[0].net_change, 100);
    assert_eq!(p.balance("A"), 1000);

    p.rollback().unwrap();
    assert_eq!(p.balance("A"), 900);
    assert!(p.lifecycle.is_open());
    let bets = p.lifecycle.bets();
    assert_eq!(bets.len(), 1);
    assert_eq!(bets[0].wager, Wager::Single(1));
    assert_eq!(bets[0].stake, 100);

    assert!(matches!(
        p.rollback(),
        Err(HiloError::NoSettlementToRollback)
    ));
}

#[test]
fn e2e_triple_hundredfold() {
    let mut p = RoundPipeline::new(TableConfig {
        max_stake: 100,
        ..example_config()
    });
    p.fund("A", 100);
    p.lifecycle.open();
    p.place("A", "555", 100).unwrap();
    let record = p.resolve("555").unwrap();
    assert_eq!(record.results[0].gross_payout, 10_000);
    assert_eq!(p.balance("A"), 10_000);
}

#[test]
fn e2e_two_bettors_with_loss_fee() {
    for (water_lose, c_after) in [(Decimal::ZERO, 950), (Decimal::new(10, 0), 945)] {
        let mut p = RoundPipeline::new(TableConfig {
            water_lose,
            ..example_config()
        });
        p.fund("B", 1000);
        p.fund("C", 1000);
        p.lifecycle.open();
        p.place("B", "3", 50).unwrap();
        p.place("C", "4", 50).unwrap();

        let record = p.resolve("356").unwrap();
        assert_eq!(record.entry(&AccountId::from("B")).unwrap().net_change, 50);
        assert_eq!(p.balance("B"), 1050);
        assert_eq!(p.balance("C"), c_after);
    }
}

#[test]
fn e2e_stake_boundaries_and_cap() {
    let mut p = RoundPipeline::new(example_config());
    p.fund("A", 5000);
    p.lifecycle.open();

    p.place("A", "H", 1000).unwrap();
    let err = p.place("A", "H", 1001).unwrap_err();
    assert!(matches!(err, HiloError::StakeOutOfBounds { .. }));

    // Cap is already used up by the first bet.
    let err = p.place("A", "L", 1).unwrap_err();
    assert!(matches!(err, HiloError::CapExceeded { .. }));
    assert_eq!(p.lifecycle.bets().len(), 1);
    assert_eq!(p.balance("A"), 4000);
}

#[test]
fn e2e_cancel_place_round_trip() {
    let mut p = RoundPipeline::new(example_config());
    p.fund("A", 1000);
    p.lifecycle.open();
    p.place("A", "12", 250).unwrap();
    let before_cancel = p.balance("A");

    let summary = p.cancel_all("A");
    assert_eq!(summary.refunded, 250);
    p.place("A", "12", 250).unwrap();
    assert_eq!(p.balance("A"), before_cancel);
}

#[test]
fn e2e_refund_and_reset_keep_round_id() {
    let mut p = RoundPipeline::new(example_config());
    p.fund("A", 1000);
    p.lifecycle.open();
    p.place("A", "H", 100).unwrap();

    let summaries = p.lifecycle.refund(&mut p.ledger).unwrap();
    assert_eq!(summaries[0].balance_after, 1000);
    assert_eq!(p.lifecycle.id(), RoundId(1));
    CreditConservation::verify(&p.ledger, &p.lifecycle, &p.house).unwrap();

    p.lifecycle.open();
    p.place("A", "H", 100).unwrap();
    p.house.record_forfeit(p.lifecycle.reset());
    assert_eq!(p.balance("A"), 900);
    assert!(p.ledger.get(&AccountId::from("A")).is_some());
    CreditConservation::verify(&p.ledger, &p.lifecycle, &p.house).unwrap();
    assert!(matches!(
        p.resolve("123"),
        Err(HiloError::NothingToSettle(RoundId(1)))
    ));
}

#[test]
fn e2e_blocked_account_is_still_settled() {
    let mut p = RoundPipeline::new(example_config());
    p.fund("A", 1000);
    p.lifecycle.open();
    p.place("A", "H", 100).unwrap();
    p.ledger.set_blocked(&AccountId::from("A"), true, 0).unwrap();
    assert!(matches!(
        p.place("A", "L", 100),
        Err(HiloError::AccountBlocked(_))
    ));
    p.resolve("456").unwrap();
    assert_eq!(p.balance("A"), 1100);
}

#[test]
fn e2e_accounting_law_over_random_rounds() {
    let codes = [
        "H", "L", "1", "2", "3", "4", "5", "6", "12", "34", "56", "111", "666", "456",
    ];
    let bettors = ["A", "B", "C", "D", "E"];
    let mut rng = StdRng::seed_from_u64(42);
    let mut p = RoundPipeline::new(TableConfig {
        water_win: Decimal::new(35, 1),
        water_lose: Decimal::new(2, 0),
        ..example_config()
    });
    p.config.free_commission_rounds.insert(RoundId(5));
    for who in bettors {
        p.fund(who, 50_000);
    }

    for _ in 0..40 {
        p.lifecycle.open();
        for _ in 0..12 {
            let who = bettors[rng.gen_range(0..bettors.len())];
            let code = codes[rng.gen_range(0..codes.len())];
            let stake = rng.gen_range(1..=400);
            let before = p.balance(who);
            match p.place(who, code, stake) {
                Ok(receipt) => assert_eq!(before - stake, receipt.balance_after),
                Err(err) => {
                    assert!(err.is_rejection(), "{err}");
                    assert_eq!(p.balance(who), before);
                }
            }
        }
        if p.lifecycle.bets().is_empty() {
            continue;
        }

        let pre_resolve = p.ledger.clone();
        let outcome = Outcome::random(&mut rng);
        let record = p.resolve(&outcome.to_string()).unwrap();
        assert!(record.verify_digest());
        assert_eq!(
            total_net_change(&record),
            record.total_gross() - record.total_staked() - record.total_commission()
        );
        if record.commission_waived {
            assert_eq!(record.total_commission(), 0);
        }

        // Occasionally undo and resolve again with a fresh outcome.
        if rng.gen_bool(0.25) {
            let bets = record.bets.clone();
            p.rollback().unwrap();
            for entry in &record.entries {
                let id = &entry.account_id;
                assert_eq!(
                    p.ledger.get(id).map(|a| a.balance),
                    pre_resolve.get(id).map(|a| a.balance)
                );
            }
            assert_eq!(p.lifecycle.bets().len(), bets.len());
            let again = Outcome::random(&mut rng);
            p.resolve(&again.to_string()).unwrap();
        }
    }

    assert_eq!(
        p.ledger.total_balance(),
        i128::from(p.ledger.issued() - p.house.take)
    );
}

#[test]
fn e2e_rollback_never_leaves_a_bettor_over_the_cap() {
    let mut p = RoundPipeline::new(example_config());
    p.fund("A", 5000);
    p.fund("B", 5000);
    p.lifecycle.open();
    p.place("A", "H", 1000).unwrap();
    p.resolve("123").unwrap();

    p.lifecycle.open();
    p.place("A", "L", 1000).unwrap();
    p.place("B", "L", 300).unwrap();
    let report = p.rollback().unwrap();

    let a = AccountId::from("A");
    assert_eq!(p.lifecycle.round().staked_by(&a), 1000);
    assert_eq!(report.refunded.len(), 1);
    assert_eq!(report.refunded[0].account_id, a);
    assert_eq!(p.balance("A"), 4000);
    // B's interim bet fits and is kept behind A's restored one.
    let bets = p.lifecycle.bets();
    assert_eq!(bets.len(), 2);
    assert_eq!(bets[1].account_id, AccountId::from("B"));
    assert_eq!(bets[1].sequence, 1);
}
