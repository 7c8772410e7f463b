//! Running totals of what the house has taken.

use serde::{Deserialize, Serialize};

use crate::{Credits, SettlementRecord};

/// House-side accounting, kept alongside the ledger so credit conservation
/// can be checked after every settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseBook {
    /// Stakes kept minus payouts credited, commission and forfeits included.
    pub take: Credits,
    /// Commission collected (win and loss side).
    pub commission: Credits,
    /// Stakes kept when a round was reset without refund.
    pub forfeited: Credits,
    pub rounds_settled: u64,
    pub rollbacks: u64,
}

impl HouseBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_settlement(&mut self, record: &SettlementRecord) {
        self.take += record.house_take();
        self.commission += record.total_commission();
        self.rounds_settled += 1;
    }

    /// Exact inverse of [`record_settlement`](Self::record_settlement).
    pub fn reverse_settlement(&mut self, record: &SettlementRecord) {
        self.take -= record.house_take();
        self.commission -= record.total_commission();
        self.rounds_settled = self.rounds_settled.saturating_sub(1);
        self.rollbacks += 1;
    }

    pub fn record_forfeit(&mut self, amount: Credits) {
        self.take += amount;
        self.forfeited += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forfeits_count_towards_take() {
        let mut book = HouseBook::new();
        book.record_forfeit(300);
        assert_eq!(book.take, 300);
        assert_eq!(book.forfeited, 300);
        assert_eq!(book.commission, 0);
    }
}
