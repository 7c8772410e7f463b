//! Table defaults and limits for the Hilo wager engine.

use crate::Credits;

/// Smallest face of a die.
pub const DIE_MIN: u8 = 1;

/// Largest face of a die.
pub const DIE_MAX: u8 = 6;

/// Number of dice in an outcome.
pub const DICE_PER_OUTCOME: usize = 3;

/// Inclusive sum range that wins a HIGH wager (triples excluded).
pub const HIGH_SUM_RANGE: std::ops::RangeInclusive<u8> = 11..=17;

/// Inclusive sum range that wins a LOW wager (triples excluded).
pub const LOW_SUM_RANGE: std::ops::RangeInclusive<u8> = 4..=10;

/// Default minimum stake per bet.
pub const DEFAULT_MIN_STAKE: Credits = 1;

/// Default maximum stake per bet.
pub const DEFAULT_MAX_STAKE: Credits = 999_999;

/// Default cap on one account's total stake within a round ("FULL").
pub const DEFAULT_PER_PERSON_CAP: Credits = 999_999;

/// Balance granted to an account the first time it is referenced.
pub const DEFAULT_STARTING_BALANCE: Credits = 0;

/// Settled bets retained per account history.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Stake-inclusive multiplier for an exact triple ("blow").
pub const DEFAULT_TRIPLE_MULTIPLIER: Credits = 100;

/// Stake-inclusive multiplier for the special combination.
pub const DEFAULT_SPECIAL_MULTIPLIER: Credits = 26;

/// Stake-inclusive multiplier for HIGH / LOW.
pub const DEFAULT_HIGH_LOW_MULTIPLIER: Credits = 2;

/// Stake-inclusive multiplier for a pair ("toad").
pub const DEFAULT_PAIR_MULTIPLIER: Credits = 6;

/// Stake-inclusive multipliers for a single digit ("teng"), indexed by
/// how many dice show the digit (1, 2, 3).
pub const DEFAULT_SINGLE_MULTIPLIERS: [Credits; 3] = [2, 3, 4];

/// Default special combination, matched irrespective of order.
pub const DEFAULT_SPECIAL_COMBINATION: [u8; 3] = [4, 5, 6];

/// Format version written into persisted snapshots.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Hilo";
