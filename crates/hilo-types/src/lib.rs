//! # hilo-types
//!
//! Shared types, errors, and configuration for the **Hilo** dice wager engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`RoundId`], [`SettlementId`]
//! - **Account model**: [`Account`], [`HistoryEntry`], [`Credits`]
//! - **Wager model**: [`Wager`], [`Bet`]
//! - **Outcome model**: [`Outcome`]
//! - **Round model**: [`Round`], [`RoundState`]
//! - **Receipts**: [`BetReceipt`], [`RefundSummary`]
//! - **Settlement model**: [`SettlementRecord`], [`SettlementEntry`], [`BetResult`], [`HouseBook`]
//! - **Configuration**: [`TableConfig`], [`PayoutTable`]
//! - **Errors**: [`HiloError`] with `HL_ERR_` prefix codes
//! - **Constants**: table defaults and limits

pub mod account;
pub mod config;
pub mod constants;
pub mod error;
pub mod house;
pub mod ids;
pub mod outcome;
pub mod receipt;
pub mod round;
pub mod settlement;
pub mod wager;

// Re-export all primary types at crate root for ergonomic imports:
//   use hilo_types::{Account, Bet, Outcome, Round, Wager, ...};

pub use account::*;
pub use config::*;
pub use error::*;
pub use house::*;
pub use ids::*;
pub use outcome::*;
pub use receipt::*;
pub use round::*;
pub use settlement::*;
pub use wager::*;

// Constants are accessed via `hilo_types::constants::FOO`
// (not re-exported to avoid name collisions).
