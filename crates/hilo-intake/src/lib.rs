//! # hilo-intake
//!
//! **Intake plane**: the credit ledger, the round lifecycle gate and the
//! pre-funded bet intake.
//!
//! ## Flow
//!
//! ```text
//! open → BetIntake.place() → AccountLedger.debit() → RoundLifecycle bets
//!      → close / resolve → settlement
//! ```
//!
//! Every bet in a round has already been paid for: the stake leaves the
//! bettor's balance at acceptance time and only settlement, a refund or a
//! cancel returns credit.

pub mod intake;
pub mod ledger;
pub mod lifecycle;

pub use intake::BetIntake;
pub use ledger::AccountLedger;
pub use lifecycle::RoundLifecycle;
