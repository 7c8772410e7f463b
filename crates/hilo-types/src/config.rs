//! Table configuration: stake limits, commission ("water") and payouts.

use std::collections::BTreeSet;

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::{Credits, HiloError, Result, RoundId, constants};

/// Stake-inclusive payout multipliers.
///
/// A multiplier of `x` returns `stake × x` on a win, i.e. the bettor wins
/// `stake × (x − 1)` on top of getting the stake back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutTable {
    pub triple: Credits,
    pub special: Credits,
    pub high_low: Credits,
    pub pair: Credits,
    /// Indexed by the number of dice showing the digit minus one.
    pub single: [Credits; 3],
    /// Digit set paid at `special` irrespective of order. `None` disables
    /// combination wagers entirely.
    pub special_combination: Option<[u8; 3]>,
}

impl Default for PayoutTable {
    fn default() -> Self {
        Self {
            triple: constants::DEFAULT_TRIPLE_MULTIPLIER,
            special: constants::DEFAULT_SPECIAL_MULTIPLIER,
            high_low: constants::DEFAULT_HIGH_LOW_MULTIPLIER,
            pair: constants::DEFAULT_PAIR_MULTIPLIER,
            single: constants::DEFAULT_SINGLE_MULTIPLIERS,
            special_combination: Some(constants::DEFAULT_SPECIAL_COMBINATION),
        }
    }
}

impl PayoutTable {
    /// The special combination in ascending order.
    #[must_use]
    pub fn special_sorted(&self) -> Option<[u8; 3]> {
        self.special_combination.map(|mut digits| {
            digits.sort_unstable();
            digits
        })
    }

    /// # Errors
    /// Returns `InvalidConfig` for a multiplier below 1, or a special
    /// combination with a face outside 1–6 or all three faces equal.
    pub fn validate(&self) -> Result<()> {
        let multipliers = [self.triple, self.special, self.high_low, self.pair];
        if multipliers
            .iter()
            .chain(self.single.iter())
            .any(|&m| m < 1)
        {
            return Err(HiloError::InvalidConfig {
                reason: "payout multipliers must be at least 1".to_string(),
            });
        }
        if let Some(digits) = self.special_combination {
            if digits
                .iter()
                .any(|d| !(constants::DIE_MIN..=constants::DIE_MAX).contains(d))
            {
                return Err(HiloError::InvalidConfig {
                    reason: format!("special combination {digits:?} has a face outside 1-6"),
                });
            }
            if digits[0] == digits[1] && digits[1] == digits[2] {
                return Err(HiloError::InvalidConfig {
                    reason: "special combination cannot be a triple".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Per-table settings, persisted with the engine snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub min_stake: Credits,
    pub max_stake: Credits,
    /// Cap on one account's total stake within a round ("FULL").
    pub per_person_cap: Credits,
    /// Percentage withheld from winning payouts.
    pub water_win: Decimal,
    /// Percentage of a losing stake charged on top of the stake.
    pub water_lose: Decimal,
    /// Rounds in which both commissions are waived.
    #[serde(default)]
    pub free_commission_rounds: BTreeSet<RoundId>,
    /// Balance granted when an account is first referenced.
    pub starting_balance: Credits,
    /// Require bettors to hold enough credit to cover the loss fee of
    /// their round stakes in addition to the stake itself.
    #[serde(default = "default_prefund")]
    pub prefund_loss_fee: bool,
    /// Settled bets retained per account.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default)]
    pub payouts: PayoutTable,
}

fn default_prefund() -> bool {
    true
}

fn default_history_limit() -> usize {
    constants::DEFAULT_HISTORY_LIMIT
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_stake: constants::DEFAULT_MIN_STAKE,
            max_stake: constants::DEFAULT_MAX_STAKE,
            per_person_cap: constants::DEFAULT_PER_PERSON_CAP,
            water_win: Decimal::ZERO,
            water_lose: Decimal::ZERO,
            free_commission_rounds: BTreeSet::new(),
            starting_balance: constants::DEFAULT_STARTING_BALANCE,
            prefund_loss_fee: true,
            history_limit: constants::DEFAULT_HISTORY_LIMIT,
            payouts: PayoutTable::default(),
        }
    }
}

impl TableConfig {
    /// Whether commission is waived for `round`.
    #[must_use]
    pub fn is_commission_free(&self, round: RoundId) -> bool {
        self.free_commission_rounds.contains(&round)
    }

    /// Net payout after win-side commission:
    /// `floor(gross × (100 − water_win) / 100)`.
    ///
    /// # Errors
    /// Returns `Internal` if the result does not fit in [`Credits`].
    pub fn net_win(&self, gross: Credits) -> Result<Credits> {
        apply_percent(gross, Decimal::ONE_HUNDRED - self.water_win)
    }

    /// Extra fee charged on a losing stake:
    /// `floor(stake × water_lose / 100)`.
    ///
    /// # Errors
    /// Returns `Internal` if the result does not fit in [`Credits`].
    pub fn loss_fee(&self, stake: Credits) -> Result<Credits> {
        apply_percent(stake, self.water_lose)
    }

    /// Validate every setting.
    ///
    /// # Errors
    /// Returns `InvalidConfig` describing the first bad setting.
    pub fn validate(&self) -> Result<()> {
        if self.min_stake < 1 {
            return Err(HiloError::InvalidConfig {
                reason: format!("min stake {} must be at least 1", self.min_stake),
            });
        }
        if self.max_stake < self.min_stake {
            return Err(HiloError::InvalidConfig {
                reason: format!(
                    "max stake {} is below min stake {}",
                    self.max_stake, self.min_stake
                ),
            });
        }
        if self.per_person_cap < 1 {
            return Err(HiloError::InvalidConfig {
                reason: format!("per-person cap {} must be at least 1", self.per_person_cap),
            });
        }
        if self.starting_balance < 0 {
            return Err(HiloError::InvalidConfig {
                reason: "starting balance cannot be negative".to_string(),
            });
        }
        validate_water("water_win", self.water_win)?;
        validate_water("water_lose", self.water_lose)?;
        self.payouts.validate()
    }
}

/// `floor(amount × pct / 100)` in exact decimal arithmetic.
fn apply_percent(amount: Credits, pct: Decimal) -> Result<Credits> {
    (Decimal::from(amount) * pct / Decimal::ONE_HUNDRED)
        .floor()
        .to_i64()
        .ok_or_else(|| HiloError::Internal(format!("{pct}% of {amount} overflows")))
}

/// Commission percentages must lie in `[0, 100]`.
///
/// # Errors
/// Returns `InvalidConfig` if `pct` is out of range.
pub fn validate_water(name: &str, pct: Decimal) -> Result<()> {
    if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
        return Err(HiloError::InvalidConfig {
            reason: format!("{name} {pct}% must be between 0 and 100"),
        });
    }
    Ok(())
}
