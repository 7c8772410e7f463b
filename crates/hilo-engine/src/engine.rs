//! The coordinator: one owner of [`EngineState`], one command at a time.
//!
//! Every mutating command runs against the live state, then credit
//! conservation is re-checked and the state is saved. If any of those
//! steps fails the state is put back exactly as it was before the command.
//! Commands scoped to one account capture only that account (and the
//! current round for bet intake); everything else captures the whole state.

use hilo_intake::{BetIntake, RoundLifecycle};
use hilo_settlement::{CreditConservation, SettlementEngine};
use hilo_types::{Account, AccountId, Credits, HiloError, Result, TableConfig};

use crate::command::{Command, CommandOutput};
use crate::state::EngineState;
use crate::store::StateStore;

/// Single-threaded command processor over a [`StateStore`].
#[derive(Debug)]
pub struct Engine<S> {
    state: EngineState,
    store: S,
}

impl<S: StateStore> Engine<S> {
    /// Resume from the store, or start a fresh table with `config` if the
    /// store is empty.
    ///
    /// # Errors
    /// Store errors, an invalid `config`, or a loaded snapshot that fails
    /// validation or credit conservation.
    pub fn open(store: S, config: TableConfig) -> Result<Self> {
        let state = match store.load()? {
            Some(state) => {
                state.verify()?;
                tracing::info!(
                    round = state.round.id().0,
                    accounts = state.ledger.len(),
                    "Resumed from snapshot"
                );
                state
            }
            None => {
                let state = EngineState::new(config)?;
                tracing::info!("Starting a fresh table");
                state
            }
        };
        Ok(Self { state, store })
    }

    #[must_use]
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Apply one command.
    ///
    /// # Errors
    /// Any [`HiloError`]. State is unchanged when an error is returned.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutput> {
        let kind = command.kind();
        if command.is_query() {
            return self.query(&command);
        }

        let undo = Undo::capture(&self.state, &command);
        let moves_credit = command.moves_credit();
        let result = self.apply(command).and_then(|output| {
            if moves_credit {
                CreditConservation::verify(&self.state.ledger, &self.state.round, &self.state.house)?;
            }
            self.store.save(&self.state)?;
            Ok(output)
        });

        if let Err(err) = &result {
            undo.restore(&mut self.state);
            if err.is_rejection() {
                tracing::warn!(command = kind, error = %err, "Command rejected");
            } else {
                tracing::error!(command = kind, error = %err, "Command failed, state restored");
            }
        }
        result
    }

    fn query(&self, command: &Command) -> Result<CommandOutput> {
        let starting = self.state.config.starting_balance;
        match command {
            Command::QueryBalance { account } => Ok(CommandOutput::Balance {
                account: account.clone(),
                balance: self.state.ledger.balance_or(account, starting),
            }),
            Command::AccountInfo { account } => {
                let info = self
                    .state
                    .ledger
                    .get(account)
                    .cloned()
                    .unwrap_or_else(|| Account::new(account.clone(), starting));
                Ok(CommandOutput::AccountInfo(Box::new(info)))
            }
            other => Err(HiloError::Internal(format!(
                "{} is not a query",
                other.kind()
            ))),
        }
    }

    fn apply(&mut self, command: Command) -> Result<CommandOutput> {
        let EngineState {
            config,
            ledger,
            round,
            last_settlement,
            house,
        } = &mut self.state;
        let starting = config.starting_balance;

        match command {
            Command::Open => Ok(CommandOutput::RoundOpened { round: round.open() }),
            Command::Close => Ok(CommandOutput::RoundClosed { round: round.close() }),
            Command::Reset => {
                let dropped = round.bets().len();
                let forfeited = round.reset();
                house.record_forfeit(forfeited);
                Ok(CommandOutput::RoundReset {
                    round: round.id(),
                    dropped,
                    forfeited,
                })
            }
            Command::Refund => {
                let refunds = round.refund(ledger)?;
                Ok(CommandOutput::RoundRefunded {
                    round: round.id(),
                    refunds,
                })
            }
            Command::Resolve { outcome } => {
                let record =
                    SettlementEngine::new(config).resolve(ledger, round, house, outcome)?;
                last_settlement.store(record.clone());
                Ok(CommandOutput::Resolved(Box::new(record)))
            }
            Command::RollbackLast => {
                let report = last_settlement.rollback_last(config, ledger, round, house)?;
                Ok(CommandOutput::RolledBack(Box::new(report)))
            }
            Command::Place {
                account,
                code,
                stake,
            } => BetIntake::new(config)
                .place(ledger, round, &account, &code, stake)
                .map(CommandOutput::BetPlaced),
            Command::CancelAll { account } => BetIntake::new(config)
                .cancel_all(ledger, round, &account)
                .map(CommandOutput::Cancelled),
            Command::AdjustCredit { account, delta } => {
                let balance = ledger.adjust(&account, delta, starting)?;
                tracing::info!(account = %account, delta, balance, "Credit adjusted");
                Ok(CommandOutput::CreditAdjusted {
                    account,
                    delta,
                    balance,
                })
            }
            Command::SetBlocked { account, blocked } => {
                ledger.set_blocked(&account, blocked, starting)?;
                tracing::info!(account = %account, blocked, "Block flag set");
                Ok(CommandOutput::BlockedChanged { account, blocked })
            }
            Command::ToggleBlocked { account } => {
                let blocked = ledger.toggle_blocked(&account, starting)?;
                tracing::info!(account = %account, blocked, "Block flag toggled");
                Ok(CommandOutput::BlockedChanged { account, blocked })
            }
            Command::SetName { account, name } => {
                ledger.set_name(&account, name.clone(), starting)?;
                Ok(CommandOutput::Renamed { account, name })
            }
            Command::SetWaterWin { percent } => update_config(config, |c| c.water_win = percent),
            Command::SetWaterLose { percent } => update_config(config, |c| c.water_lose = percent),
            Command::SetMinStake { amount } => update_config(config, |c| c.min_stake = amount),
            Command::SetMaxStake { amount } => update_config(config, |c| c.max_stake = amount),
            Command::SetPerPersonCap { amount } => {
                update_config(config, |c| c.per_person_cap = amount)
            }
            Command::AddFreeCommissionRound { round: id } => update_config(config, |c| {
                c.free_commission_rounds.insert(id);
            }),
            Command::RemoveFreeCommissionRound { round: id } => update_config(config, |c| {
                c.free_commission_rounds.remove(&id);
            }),
            Command::QueryBalance { .. } | Command::AccountInfo { .. } => Err(HiloError::Internal(
                "queries are answered without a state transition".to_string(),
            )),
        }
    }

    /// Convenience for callers that only need a balance.
    ///
    /// # Errors
    /// Never fails in practice; kept fallible to match [`execute`](Self::execute).
    pub fn balance(&self, account: &AccountId) -> Result<Credits> {
        match self.query(&Command::QueryBalance {
            account: account.clone(),
        })? {
            CommandOutput::Balance { balance, .. } => Ok(balance),
            _ => Err(HiloError::Internal("unexpected balance output".to_string())),
        }
    }
}

/// What [`Engine::execute`] puts back when a command fails.
enum Undo {
    Single {
        account: AccountId,
        previous: Option<Account>,
        issued: Credits,
        /// Only bet intake touches the round.
        round: Option<RoundLifecycle>,
    },
    Full(Box<EngineState>),
}

impl Undo {
    fn capture(state: &EngineState, command: &Command) -> Self {
        let single = |account: &AccountId, round: Option<RoundLifecycle>| Self::Single {
            account: account.clone(),
            previous: state.ledger.get(account).cloned(),
            issued: state.ledger.issued(),
            round,
        };
        match command {
            Command::Place { account, .. } | Command::CancelAll { account } => {
                single(account, Some(state.round.clone()))
            }
            Command::AdjustCredit { account, .. }
            | Command::SetBlocked { account, .. }
            | Command::ToggleBlocked { account }
            | Command::SetName { account, .. } => single(account, None),
            _ => Self::Full(Box::new(state.clone())),
        }
    }

    fn restore(self, state: &mut EngineState) {
        match self {
            Self::Single {
                account,
                previous,
                issued,
                round,
            } => {
                state.ledger.restore_account(&account, previous, issued);
                if let Some(round) = round {
                    state.round = round;
                }
            }
            Self::Full(before) => *state = *before,
        }
    }
}

/// Change a copy of the config, validate it, then commit.
fn update_config(
    config: &mut TableConfig,
    change: impl FnOnce(&mut TableConfig),
) -> Result<CommandOutput> {
    let mut next = config.clone();
    change(&mut next);
    next.validate()?;
    *config = next;
    Ok(config_updated(config))
}

fn config_updated(config: &TableConfig) -> CommandOutput {
    tracing::info!(
        min = config.min_stake,
        max = config.max_stake,
        cap = config.per_person_cap,
        water_win = %config.water_win,
        water_lose = %config.water_lose,
        free_rounds = config.free_commission_rounds.len(),
        "Table config updated"
    );
    CommandOutput::ConfigUpdated(Box::new(config.clone()))
}

#[cfg(test)]
mod tests {
    use hilo_types::{RoundId, RoundState};
    use rust_decimal::Decimal;

    use super::*;
    use crate::store::MemoryStore;

    fn engine() -> Engine<MemoryStore> {
        Engine::open(MemoryStore::new(), TableConfig::default()).unwrap()
    }

    fn a() -> AccountId {
        AccountId::from("A")
    }

    #[test]
    fn mutations_are_saved_queries_are_not() {
        let mut e = engine();
        e.execute(Command::Open).unwrap();
        e.execute(Command::QueryBalance { account: a() }).unwrap();
        e.execute(Command::AccountInfo { account: a() }).unwrap();
        assert_eq!(e.store().saves(), 1);
        assert!(e.state().ledger.is_empty());
    }

    #[test]
    fn rejection_is_not_saved() {
        let mut e = engine();
        let err = e
            .execute(Command::Place {
                account: a(),
                code: "H".into(),
                stake: 10,
            })
            .unwrap_err();
        assert!(matches!(err, HiloError::RoundNotOpen));
        assert_eq!(e.store().saves(), 0);
    }

    #[test]
    fn bet_resolve_rollback_cycle() {
        let mut e = engine();
        e.execute(Command::AdjustCredit { account: a(), delta: 1000 })
            .unwrap();
        e.execute(Command::Open).unwrap();
        e.execute(Command::Place {
            account: a(),
            code: "H".into(),
            stake: 100,
        })
        .unwrap();
        let out = e
            .execute(Command::Resolve {
                outcome: "456".parse().unwrap(),
            })
            .unwrap();
        assert!(matches!(out, CommandOutput::Resolved(ref r) if r.round_id == RoundId(1)));
        assert_eq!(e.balance(&a()).unwrap(), 1100);
        assert_eq!(e.state().round.id(), RoundId(2));

        e.execute(Command::RollbackLast).unwrap();
        assert_eq!(e.balance(&a()).unwrap(), 900);
        assert_eq!(e.state().round.state(), RoundState::Open);
        assert!(matches!(
            e.execute(Command::RollbackLast),
            Err(HiloError::NoSettlementToRollback)
        ));
    }

    #[test]
    fn config_setters_validate() {
        let mut e = engine();
        e.execute(Command::SetMaxStake { amount: 500 }).unwrap();
        assert!(matches!(
            e.execute(Command::SetMinStake { amount: 501 }),
            Err(HiloError::InvalidConfig { .. })
        ));
        assert_eq!(e.state().config.min_stake, 1);
        assert!(e
            .execute(Command::SetWaterLose {
                percent: Decimal::new(101, 0)
            })
            .is_err());
        e.execute(Command::SetWaterWin {
            percent: Decimal::new(15, 1),
        })
        .unwrap();
        assert_eq!(e.state().config.water_win, Decimal::new(15, 1));
        e.execute(Command::AddFreeCommissionRound { round: RoundId(3) })
            .unwrap();
        assert!(e.state().config.is_commission_free(RoundId(3)));
        e.execute(Command::RemoveFreeCommissionRound { round: RoundId(3) })
            .unwrap();
        assert!(!e.state().config.is_commission_free(RoundId(3)));
    }

    #[test]
    fn reset_forfeits_to_house() {
        let mut e = engine();
        e.execute(Command::AdjustCredit { account: a(), delta: 500 })
            .unwrap();
        e.execute(Command::Open).unwrap();
        e.execute(Command::Place {
            account: a(),
            code: "5".into(),
            stake: 200,
        })
        .unwrap();
        let out = e.execute(Command::Reset).unwrap();
        assert_eq!(
            out,
            CommandOutput::RoundReset {
                round: RoundId(1),
                dropped: 1,
                forfeited: 200
            }
        );
        assert_eq!(e.state().house.forfeited, 200);
        assert_eq!(e.balance(&a()).unwrap(), 300);
    }

    #[test]
    fn account_info_for_unknown_account_is_not_created() {
        let mut e = engine();
        let out = e.execute(Command::AccountInfo { account: a() }).unwrap();
        match out {
            CommandOutput::AccountInfo(info) => {
                assert_eq!(info.balance, 0);
                assert_eq!(info.play_count, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(e.state().ledger.is_empty());
    }

    #[test]
    fn toggle_block_then_bet_rejected() {
        let mut e = engine();
        e.execute(Command::AdjustCredit { account: a(), delta: 500 })
            .unwrap();
        e.execute(Command::Open).unwrap();
        let out = e.execute(Command::ToggleBlocked { account: a() }).unwrap();
        assert_eq!(
            out,
            CommandOutput::BlockedChanged {
                account: a(),
                blocked: true
            }
        );
        assert!(matches!(
            e.execute(Command::Place {
                account: a(),
                code: "H".into(),
                stake: 10
            }),
            Err(HiloError::AccountBlocked(_))
        ));
    }

    #[test]
    fn adjust_out_of_range_is_rejected_and_not_saved() {
        let mut e = engine();
        e.execute(Command::AdjustCredit {
            account: a(),
            delta: i64::MAX,
        })
        .unwrap();
        let before = e.state().clone();
        let err = e
            .execute(Command::AdjustCredit { account: a(), delta: 1 })
            .unwrap_err();
        assert!(matches!(err, HiloError::CreditOverflow { .. }));
        assert!(err.is_rejection());
        assert_eq!(e.state(), &before);
        assert_eq!(e.balance(&a()).unwrap(), i64::MAX);
        assert_eq!(e.store().saves(), 1);
    }

    #[test]
    fn single_account_undo_restores_only_that_account() {
        let mut e = engine();
        e.execute(Command::AdjustCredit { account: a(), delta: 100 })
            .unwrap();
        e.execute(Command::Open).unwrap();
        let mut state = e.state().clone();
        let command = Command::Place {
            account: AccountId::from("new"),
            code: "H".into(),
            stake: 10,
        };
        let undo = Undo::capture(&state, &command);
        state.ledger.adjust(&AccountId::from("new"), 50, 0).unwrap();
        state.round.close();
        undo.restore(&mut state);
        assert_eq!(&state, e.state());
    }
}
