//! The closed set of commands the engine understands, and their results.
//!
//! Authorization has already happened by the time a [`Command`] exists: the
//! decoding layer only produces admin commands for admins.

use hilo_types::{
    Account, AccountId, BetReceipt, Credits, Outcome, RefundSummary, RoundId, SettlementRecord,
    TableConfig,
};
use hilo_settlement::RollbackReport;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Round control
    Open,
    Close,
    Reset,
    Refund,
    RollbackLast,
    Resolve { outcome: Outcome },

    // Player
    Place {
        account: AccountId,
        code: String,
        stake: Credits,
    },
    CancelAll { account: AccountId },
    QueryBalance { account: AccountId },

    // Account administration
    AdjustCredit { account: AccountId, delta: Credits },
    SetBlocked { account: AccountId, blocked: bool },
    ToggleBlocked { account: AccountId },
    SetName { account: AccountId, name: String },
    AccountInfo { account: AccountId },

    // Table configuration
    SetWaterWin { percent: Decimal },
    SetWaterLose { percent: Decimal },
    SetMinStake { amount: Credits },
    SetMaxStake { amount: Credits },
    SetPerPersonCap { amount: Credits },
    AddFreeCommissionRound { round: RoundId },
    RemoveFreeCommissionRound { round: RoundId },
}

impl Command {
    /// Short stable name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Reset => "reset",
            Self::Refund => "refund",
            Self::RollbackLast => "rollback_last",
            Self::Resolve { .. } => "resolve",
            Self::Place { .. } => "place",
            Self::CancelAll { .. } => "cancel_all",
            Self::QueryBalance { .. } => "query_balance",
            Self::AdjustCredit { .. } => "adjust_credit",
            Self::SetBlocked { .. } => "set_blocked",
            Self::ToggleBlocked { .. } => "toggle_blocked",
            Self::SetName { .. } => "set_name",
            Self::AccountInfo { .. } => "account_info",
            Self::SetWaterWin { .. } => "set_water_win",
            Self::SetWaterLose { .. } => "set_water_lose",
            Self::SetMinStake { .. } => "set_min_stake",
            Self::SetMaxStake { .. } => "set_max_stake",
            Self::SetPerPersonCap { .. } => "set_per_person_cap",
            Self::AddFreeCommissionRound { .. } => "add_free_commission_round",
            Self::RemoveFreeCommissionRound { .. } => "remove_free_commission_round",
        }
    }

    /// Read-only commands never touch state and are never persisted.
    #[must_use]
    pub fn is_query(&self) -> bool {
        matches!(self, Self::QueryBalance { .. } | Self::AccountInfo { .. })
    }

    /// Commands after which credit conservation is re-checked.
    #[must_use]
    pub fn moves_credit(&self) -> bool {
        !self.is_query()
            && !matches!(
                self,
                Self::SetWaterWin { .. }
                    | Self::SetWaterLose { .. }
                    | Self::SetMinStake { .. }
                    | Self::SetMaxStake { .. }
                    | Self::SetPerPersonCap { .. }
                    | Self::AddFreeCommissionRound { .. }
                    | Self::RemoveFreeCommissionRound { .. }
                    | Self::SetName { .. }
            )
    }
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandOutput {
    RoundOpened { round: RoundId },
    RoundClosed { round: RoundId },
    RoundReset {
        round: RoundId,
        dropped: usize,
        forfeited: Credits,
    },
    RoundRefunded {
        round: RoundId,
        refunds: Vec<RefundSummary>,
    },
    Resolved(Box<SettlementRecord>),
    /// The settlement that was undone, and any interim bets refunded.
    RolledBack(Box<RollbackReport>),
    BetPlaced(BetReceipt),
    Cancelled(RefundSummary),
    Balance {
        account: AccountId,
        balance: Credits,
    },
    CreditAdjusted {
        account: AccountId,
        delta: Credits,
        balance: Credits,
    },
    BlockedChanged {
        account: AccountId,
        blocked: bool,
    },
    Renamed {
        account: AccountId,
        name: String,
    },
    AccountInfo(Box<Account>),
    ConfigUpdated(Box<TableConfig>),
}
