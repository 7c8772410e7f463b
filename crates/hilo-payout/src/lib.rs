//! # hilo-payout
//!
//! **Pure payout scoring for Hilo.**
//!
//! This crate is the compute plane -- it takes a wager, a stake and a
//! revealed outcome and returns the stake-inclusive gross payout. It has:
//!
//! - **Zero side effects**: no ledger access, no commission, no logging
//! - **Deterministic output**: same input -> same payout, always
//! - **Most-specific-first scoring**: triples, then the special
//!   combination, then high/low, pairs and single digits

pub mod rules;

pub use rules::PayoutRules;
