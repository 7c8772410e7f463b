//! Credit ledger.
//!
//! Tracks one integer balance per account. Debits never take a balance
//! below zero; only admin adjustments may. All mutations are atomic:
//! either the full operation succeeds or the balance is unchanged.

use std::collections::BTreeMap;

use hilo_types::{Account, AccountId, Credits, HiloError, Result};
use serde::{Deserialize, Serialize};

/// Manages account balances and profile flags.
///
/// The ledger is the source of truth for all credit state. Bet intake
/// debits stakes here, settlement and rollback apply deltas computed from
/// a settlement record, and admin commands adjust balances directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLedger {
    /// Accounts by id.
    accounts: BTreeMap<AccountId, Account>,
    /// Credits brought into existence: starting grants plus admin adjustments.
    issued: Credits,
}

impl AccountLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    /// Fetch an account, creating it with `starting_balance` on first use.
    ///
    /// # Errors
    /// Returns `CreditOverflow` if the starting grant would overflow the
    /// issued total; no account is created.
    pub fn get_or_create(
        &mut self,
        id: &AccountId,
        starting_balance: Credits,
    ) -> Result<&mut Account> {
        if !self.accounts.contains_key(id) {
            self.issued = self
                .issued
                .checked_add(starting_balance)
                .ok_or_else(|| HiloError::CreditOverflow {
                    account: id.clone(),
                    balance: self.issued,
                    delta: starting_balance,
                })?;
        }
        Ok(self
            .accounts
            .entry(id.clone())
            .or_insert_with(|| Account::new(id.clone(), starting_balance)))
    }

    /// Balance of `id`, or what it would start with if never referenced.
    #[must_use]
    pub fn balance_or(&self, id: &AccountId, starting_balance: Credits) -> Credits {
        self.accounts
            .get(id)
            .map_or(starting_balance, |a| a.balance)
    }

    /// Whether `id` exists and is blocked.
    #[must_use]
    pub fn is_blocked(&self, id: &AccountId) -> bool {
        self.accounts.get(id).is_some_and(|a| a.blocked)
    }

    /// Debit `amount` from an existing account.
    ///
    /// # Errors
    /// Returns `InsufficientCredit` if the balance is below `amount`
    /// (balance unchanged).
    pub fn debit(&mut self, id: &AccountId, amount: Credits) -> Result<Credits> {
        let entry = self
            .accounts
            .get_mut(id)
            .ok_or(HiloError::InsufficientCredit {
                needed: amount,
                available: 0,
            })?;

        if entry.balance < amount {
            return Err(HiloError::InsufficientCredit {
                needed: amount,
                available: entry.balance,
            });
        }

        entry.balance -= amount;
        Ok(entry.balance)
    }

    /// Check that [`apply`](Self::apply) of `delta` would succeed, without
    /// changing anything.
    ///
    /// # Errors
    /// `Internal` if the account does not exist, `CreditOverflow` if the
    /// balance would leave the representable range.
    pub fn check_apply(&self, id: &AccountId, delta: Credits) -> Result<Credits> {
        let entry = self
            .accounts
            .get(id)
            .ok_or_else(|| HiloError::Internal(format!("settlement touched unknown account {id}")))?;
        entry
            .balance
            .checked_add(delta)
            .ok_or_else(|| HiloError::CreditOverflow {
                account: id.clone(),
                balance: entry.balance,
                delta,
            })
    }

    /// Apply a settlement-side delta to an existing account. Unlike
    /// [`debit`](Self::debit) this does not check the floor: callers have
    /// already planned the delta against the ledger.
    ///
    /// # Errors
    /// See [`check_apply`](Self::check_apply). The balance is unchanged on
    /// error.
    pub fn apply(&mut self, id: &AccountId, delta: Credits) -> Result<Credits> {
        let balance = self.check_apply(id, delta)?;
        if let Some(entry) = self.accounts.get_mut(id) {
            entry.balance = balance;
        }
        Ok(balance)
    }

    /// Administrative adjustment; may take the balance negative.
    ///
    /// # Errors
    /// Returns `CreditOverflow` if the balance or the issued total would
    /// leave the representable range. Nothing changes in that case.
    pub fn adjust(
        &mut self,
        id: &AccountId,
        delta: Credits,
        starting_balance: Credits,
    ) -> Result<Credits> {
        let current = self.balance_or(id, starting_balance);
        let overflow = || HiloError::CreditOverflow {
            account: id.clone(),
            balance: current,
            delta,
        };
        let balance = current.checked_add(delta).ok_or_else(overflow)?;
        let grant = if self.accounts.contains_key(id) { 0 } else { starting_balance };
        let issued = self
            .issued
            .checked_add(grant)
            .and_then(|issued| issued.checked_add(delta))
            .ok_or_else(overflow)?;

        self.get_or_create(id, starting_balance)?.balance = balance;
        self.issued = issued;
        Ok(balance)
    }

    /// # Errors
    /// See [`get_or_create`](Self::get_or_create).
    pub fn set_blocked(
        &mut self,
        id: &AccountId,
        blocked: bool,
        starting_balance: Credits,
    ) -> Result<()> {
        self.get_or_create(id, starting_balance)?.blocked = blocked;
        Ok(())
    }

    /// Flip the blocked flag, returning the new value.
    ///
    /// # Errors
    /// See [`get_or_create`](Self::get_or_create).
    pub fn toggle_blocked(&mut self, id: &AccountId, starting_balance: Credits) -> Result<bool> {
        let entry = self.get_or_create(id, starting_balance)?;
        entry.blocked = !entry.blocked;
        Ok(entry.blocked)
    }

    /// # Errors
    /// See [`get_or_create`](Self::get_or_create).
    pub fn set_name(
        &mut self,
        id: &AccountId,
        name: impl Into<String>,
        starting_balance: Credits,
    ) -> Result<()> {
        self.get_or_create(id, starting_balance)?.name = Some(name.into());
        Ok(())
    }

    /// Put one account and the issued total back to an earlier capture.
    /// `None` removes the account.
    pub fn restore_account(&mut self, id: &AccountId, previous: Option<Account>, issued: Credits) {
        match previous {
            Some(account) => {
                self.accounts.insert(id.clone(), account);
            }
            None => {
                self.accounts.remove(id);
            }
        }
        self.issued = issued;
    }

    /// Sum of every balance. Widened so that balances near the `Credits`
    /// limits cannot overflow the total.
    #[must_use]
    pub fn total_balance(&self) -> i128 {
        self.accounts.values().map(|a| i128::from(a.balance)).sum()
    }
    /// Credits issued since genesis (starting grants + adjustments).
    #[must_use]
    pub fn issued(&self) -> Credits {
        self.issued
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Mutable access for settlement bookkeeping (play count, history).
    pub fn account_mut(&mut self, id: &AccountId) -> Option<&mut Account> {
        self.accounts.get_mut(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
