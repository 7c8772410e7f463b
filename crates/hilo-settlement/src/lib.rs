//! # hilo-settlement
//!
//! **Finality plane**: round resolution, commission, single-level rollback
//! and the credit conservation check.
//!
//! ## Architecture
//!
//! The finality plane receives the closed round from the intake plane and:
//! 1. Scores every bet with [`hilo_payout::PayoutRules`]
//! 2. Applies win commission or the loss fee (skipped in free rounds)
//! 3. Credits the ledger and records a digest-stamped settlement
//! 4. Keeps that record in the rollback slot until the next resolve
//! 5. Verifies credit conservation
//!
//! Resolve and rollback either apply completely or not at all.

pub mod conservation;
pub mod engine;
pub mod rollback;

pub use conservation::CreditConservation;
pub use engine::{SettlementEngine, total_net_change};
pub use rollback::{RollbackManager, RollbackReport};
