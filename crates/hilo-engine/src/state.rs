//! The engine's complete persisted state.

use hilo_intake::{AccountLedger, RoundLifecycle};
use hilo_settlement::{CreditConservation, RollbackManager};
use hilo_types::{HouseBook, Result, TableConfig};
use serde::{Deserialize, Serialize};

/// Everything one table needs, owned by a single coordinator.
///
/// This is the shape handed to a [`StateStore`](crate::StateStore): the
/// accounts, the current round with its bets, the configuration, the last
/// settlement record and the house book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub config: TableConfig,
    pub ledger: AccountLedger,
    pub round: RoundLifecycle,
    /// The "last round" slot consumed by rollback.
    pub last_settlement: RollbackManager,
    #[serde(default)]
    pub house: HouseBook,
}

impl EngineState {
    /// Fresh state for a table with `config`.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `config` is invalid.
    pub fn new(config: TableConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Validate the configuration and check credit conservation, e.g. after
    /// loading a snapshot.
    ///
    /// # Errors
    /// `InvalidConfig` or `CreditInvariantViolation`.
    pub fn verify(&self) -> Result<()> {
        self.config.validate()?;
        CreditConservation::verify(&self.ledger, &self.round, &self.house)
    }
}
