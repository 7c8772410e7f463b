//! Identifiers used throughout Hilo.
//!
//! Participant ids are opaque strings handed to us by the messaging layer.
//! Round ids are a plain counter; settlement ids use UUIDv7 so records
//! sort by the time they were produced.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Opaque participant identifier (the messaging platform's user id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RoundId
// ---------------------------------------------------------------------------

/// Monotonically increasing round counter. The first round is `RoundId(1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub u64);

impl RoundId {
    /// The id of the very first round.
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Default for RoundId {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SettlementId
// ---------------------------------------------------------------------------

/// Unique identifier for a settlement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SettlementId(pub Uuid);

impl SettlementId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SettlementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SettlementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stl:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_id_starts_at_one() {
        assert_eq!(RoundId::default(), RoundId(1));
        assert_eq!(RoundId::FIRST.next(), RoundId(2));
    }

    #[test]
    fn round_id_display() {
        assert_eq!(format!("{}", RoundId(7)), "round:7");
    }

    #[test]
    fn settlement_ids_are_time_ordered() {
        let a = SettlementId::new();
        let b = SettlementId::new();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn account_id_serializes_as_plain_string() {
        let id = AccountId::from("U123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"U123\"");
        let back: AccountId = serde_json::from_str("\"U123\"").unwrap();
        assert_eq!(back, id);
    }
}
