//! Payout rules for every wager family.
//!
//! ```text
//! family        code     wins when                              returns
//! triple        "555"    outcome is that exact triple           stake × triple
//! combination   "456"    outcome is the special set, any order  stake × special
//! high / low    "H" "L"  sum 11-17 / 4-10, triples lose         stake × high_low
//! pair          "12"     both faces appear                      stake × pair
//! single        "3"      face appears 1 / 2 / 3 times           stake × single[n-1]
//! ```
//!
//! All multipliers are stake-inclusive: a return of `stake × 2` is a net win
//! equal to the stake.

use hilo_types::{Credits, Outcome, PayoutTable, Wager, constants};

/// Scores wagers against an outcome using one table's multipliers.
#[derive(Debug, Clone, Copy)]
pub struct PayoutRules<'a> {
    table: &'a PayoutTable,
}

impl<'a> PayoutRules<'a> {
    #[must_use]
    pub fn new(table: &'a PayoutTable) -> Self {
        Self { table }
    }

    /// Whether this table offers `wager`. Every structurally valid code is
    /// offered except a three-digit non-triple that is not the table's
    /// special combination.
    #[must_use]
    pub fn recognizes(&self, wager: &Wager) -> bool {
        match wager {
            Wager::Combination(digits) => {
                let mut sorted = *digits;
                sorted.sort_unstable();
                self.table.special_sorted() == Some(sorted)
            }
            _ => true,
        }
    }

    /// Stake-inclusive multiplier `wager` earns on `outcome`; 0 is a loss.
    #[must_use]
    pub fn multiplier(&self, wager: &Wager, outcome: &Outcome) -> Credits {
        // Most specific family first, so a richer win is never scored as a
        // looser one.
        match *wager {
            Wager::Triple(face) => {
                if outcome.is_triple() && outcome.contains(face) {
                    self.table.triple
                } else {
                    0
                }
            }
            Wager::Combination(_) => {
                if self.recognizes(wager) && self.table.special_sorted() == Some(outcome.sorted()) {
                    self.table.special
                } else {
                    0
                }
            }
            Wager::High => {
                if !outcome.is_triple() && constants::HIGH_SUM_RANGE.contains(&outcome.sum()) {
                    self.table.high_low
                } else {
                    0
                }
            }
            Wager::Low => {
                if !outcome.is_triple() && constants::LOW_SUM_RANGE.contains(&outcome.sum()) {
                    self.table.high_low
                } else {
                    0
                }
            }
            Wager::Pair(x, y) => {
                if outcome.contains(x) && outcome.contains(y) {
                    self.table.pair
                } else {
                    0
                }
            }
            Wager::Single(face) => match outcome.count(face) {
                0 => 0,
                hits => self.table.single[hits.min(3) - 1],
            },
        }
    }

    /// Gross payout (stake included) of `stake` on `wager` for `outcome`.
    ///
    /// # Panics
    /// Panics if `stake` is not positive: intake never accepts such a bet,
    /// so reaching here with one is a defect.
    #[must_use]
    pub fn evaluate(&self, wager: &Wager, stake: Credits, outcome: &Outcome) -> Credits {
        assert!(stake > 0, "stake must be positive, got {stake}");
        stake.saturating_mul(self.multiplier(wager, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn o(s: &str) -> Outcome {
        s.parse().unwrap()
    }

    fn w(s: &str) -> Wager {
        s.parse().unwrap()
    }

    fn eval(code: &str, stake: Credits, outcome: &str) -> Credits {
        let table = PayoutTable::default();
        PayoutRules::new(&table).evaluate(&w(code), stake, &o(outcome))
    }

    #[test]
    fn single_digit_scales_with_hits() {
        assert_eq!(eval("1", 100, "123"), 200);
        assert_eq!(eval("1", 100, "113"), 300);
        assert_eq!(eval("1", 100, "111"), 400);
        assert_eq!(eval("1", 100, "234"), 0);
    }

    #[test]
    fn triple_pays_hundred() {
        assert_eq!(eval("555", 100, "555"), 10_000);
        assert_eq!(eval("555", 100, "556"), 0);
        assert_eq!(eval("555", 100, "444"), 0);
    }

    #[test]
    fn triple_outcome_scores_single_bet_as_single() {
        // A "5" bet on 555 is a three-hit single, not a triple payout.
        assert_eq!(eval("5", 100, "555"), 400);
    }

    #[test]
    fn special_combination_any_order() {
        assert_eq!(eval("456", 10, "645"), 260);
        assert_eq!(eval("654", 10, "456"), 260);
        assert_eq!(eval("456", 10, "455"), 0);
    }

    #[test]
    fn unoffered_combination_is_not_recognized() {
        let table = PayoutTable::default();
        let rules = PayoutRules::new(&table);
        assert!(!rules.recognizes(&w("123")));
        assert!(rules.recognizes(&w("546")));
        assert_eq!(rules.multiplier(&w("123"), &o("123")), 0);
    }

    #[test]
    fn combination_disabled() {
        let table = PayoutTable {
            special_combination: None,
            ..PayoutTable::default()
        };
        let rules = PayoutRules::new(&table);
        assert!(!rules.recognizes(&w("456")));
        assert_eq!(rules.multiplier(&w("456"), &o("456")), 0);
    }

    #[test]
    fn high_low_ranges() {
        assert_eq!(eval("H", 50, "356"), 100); // 14
        assert_eq!(eval("H", 50, "155"), 100); // 11
        assert_eq!(eval("H", 50, "154"), 0); // 10
        assert_eq!(eval("L", 50, "154"), 100); // 10
        assert_eq!(eval("L", 50, "112"), 100); // 4
        assert_eq!(eval("L", 50, "356"), 0);
    }

    #[test]
    fn high_low_lose_on_triples() {
        assert_eq!(eval("H", 50, "555"), 0); // 15, but a triple
        assert_eq!(eval("L", 50, "222"), 0); // 6, but a triple
    }

    #[test]
    fn pair_needs_both_faces() {
        assert_eq!(eval("12", 10, "132"), 60);
        assert_eq!(eval("21", 10, "411"), 0);
        assert_eq!(eval("21", 10, "221"), 60);
    }

    #[test]
    fn custom_table_multipliers() {
        let table = PayoutTable {
            triple: 101,
            pair: 5,
            ..PayoutTable::default()
        };
        let rules = PayoutRules::new(&table);
        assert_eq!(rules.evaluate(&w("222"), 10, &o("222")), 1010);
        assert_eq!(rules.evaluate(&w("23"), 10, &o("234")), 50);
    }

    #[test]
    #[should_panic(expected = "stake must be positive")]
    fn non_positive_stake_is_a_defect() {
        let _ = eval("1", 0, "111");
    }

    #[test]
    fn evaluation_is_deterministic_over_random_outcomes() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let table = PayoutTable::default();
        let rules = PayoutRules::new(&table);
        let wagers: Vec<Wager> = ["H", "L", "1", "6", "12", "56", "333", "456"]
            .iter()
            .map(|c| w(c))
            .collect();
        for _ in 0..500 {
            let outcome = Outcome::random(&mut rng);
            for wager in &wagers {
                let a = rules.evaluate(wager, 10, &outcome);
                let b = rules.evaluate(wager, 10, &outcome);
                assert_eq!(a, b);
                assert!(a == 0 || a >= 20, "{wager} on {outcome} paid {a}");
            }
            // Exactly one of H / L wins unless the outcome is a triple.
            let high = rules.evaluate(&Wager::High, 10, &outcome) > 0;
            let low = rules.evaluate(&Wager::Low, 10, &outcome) > 0;
            assert_eq!(high || low, !outcome.is_triple());
            assert!(!(high && low));
        }
    }
}
