//! Error types for the Hilo wager engine.
//!
//! All errors use the `HL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Bet intake rejections
//! - 2xx: Settlement errors
//! - 3xx: Rollback errors
//! - 4xx: Configuration / admin errors
//! - 8xx: Ledger invariant violations
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{AccountId, Credits, RoundId};

/// Central error enum for all Hilo operations.
#[derive(Debug, Error)]
pub enum HiloError {
    // =================================================================
    // Intake Errors (1xx)
    // =================================================================
    /// Bets can only be placed while the round is OPEN.
    #[error("HL_ERR_100: Round is not open for bets")]
    RoundNotOpen,

    /// The account has been blocked by an admin.
    #[error("HL_ERR_101: Account is blocked: {0}")]
    AccountBlocked(AccountId),

    /// The wager code is not one the payout rules recognise.
    #[error("HL_ERR_102: Invalid wager code: {code:?}")]
    InvalidWagerCode { code: String },

    /// The stake is outside the configured `[min, max]` window.
    #[error("HL_ERR_103: Stake {stake} outside bounds [{min}, {max}]")]
    StakeOutOfBounds {
        stake: Credits,
        min: Credits,
        max: Credits,
    },

    /// The account's total stake in this round would exceed the cap.
    #[error("HL_ERR_104: Per-person cap exceeded: {total} > {cap}")]
    CapExceeded { total: Credits, cap: Credits },

    /// Not enough credit to fund the stake.
    #[error("HL_ERR_105: Insufficient credit: need {needed}, have {available}")]
    InsufficientCredit { needed: Credits, available: Credits },

    // =================================================================
    // Settlement Errors (2xx)
    // =================================================================
    /// The round has no bets, so there is nothing to resolve.
    #[error("HL_ERR_200: Nothing to settle in {0}")]
    NothingToSettle(RoundId),

    /// The supplied outcome is not three dice faces.
    #[error("HL_ERR_201: Invalid outcome: {reason}")]
    InvalidOutcome { reason: String },

    // =================================================================
    // Rollback Errors (3xx)
    // =================================================================
    /// The single rollback slot is empty.
    #[error("HL_ERR_300: No settlement to roll back")]
    NoSettlementToRollback,

    // =================================================================
    // Configuration Errors (4xx)
    // =================================================================
    /// A table setting was rejected.
    #[error("HL_ERR_400: Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A credit change would take a balance or the issued total outside
    /// the representable range.
    #[error("HL_ERR_401: Credit amount out of range for {account}: {balance} + {delta}")]
    CreditOverflow {
        account: AccountId,
        balance: Credits,
        delta: Credits,
    },

    // =================================================================
    // Invariant Errors (8xx)
    // =================================================================
    /// Credit conservation failed. Always a defect, never a user error.
    #[error("HL_ERR_800: Credit invariant violation: {reason}")]
    CreditInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("HL_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("HL_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// I/O error (snapshot store).
    #[error("HL_ERR_902: I/O error: {0}")]
    Io(String),
}

impl HiloError {
    /// Short message shown to the player or operator who issued the command.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RoundNotOpen => "Betting is closed",
            Self::AccountBlocked(_) => "This account is blocked",
            Self::InvalidWagerCode { .. } => "Unknown bet code",
            Self::StakeOutOfBounds { .. } => "Stake is outside the table limits",
            Self::CapExceeded { .. } => "Over the per-person limit for this round",
            Self::InsufficientCredit { .. } => "Not enough credit",
            Self::NothingToSettle(_) => "No bets to settle",
            Self::InvalidOutcome { .. } => "Result must be three dice, 1-6",
            Self::NoSettlementToRollback => "No result to roll back",
            Self::InvalidConfig { .. } => "Setting rejected",
            Self::CreditOverflow { .. } => "Amount out of range",
            Self::CreditInvariantViolation { .. }
            | Self::Internal(_)
            | Self::Serialization(_)
            | Self::Io(_) => "Internal error, nothing was changed",
        }
    }

    /// Whether this is an expected business rejection (as opposed to a defect
    /// or an infrastructure failure).
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            Self::CreditInvariantViolation { .. }
                | Self::Internal(_)
                | Self::Serialization(_)
                | Self::Io(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, HiloError>;

// Conversion from std::io::Error
impl From<std::io::Error> for HiloError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for HiloError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
