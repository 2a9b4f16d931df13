//! Balance book: free and conditioned holdings, allowances, and supply.
//!
//! Every mutating primitive validates against unmodified state before its
//! first write, so a returned error means nothing changed. Arithmetic is
//! checked throughout; overflow surfaces as an error, never a wrap.

use crate::error::LedgerError;
use crate::types::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-holder ledger entry.
///
/// Entries are created implicitly the first time an account is referenced
/// and persist for the lifetime of the ledger instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountEntry {
    /// Unrestricted balance, spendable via ordinary transfer.
    pub free: Amount,
    /// Balance earmarked for spending at whitelisted merchants only.
    pub conditioned: Amount,
    /// Spender -> approved amount; overwritten, never accumulated.
    pub allowances: BTreeMap<AccountId, Amount>,
}

/// The balance book and aggregate supply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountBook {
    accounts: BTreeMap<AccountId, AccountEntry>,
    total_supply: Amount,
}

impl AccountBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn free_of(&self, account: AccountId) -> Amount {
        self.accounts.get(&account).map(|e| e.free).unwrap_or(0)
    }

    pub fn conditioned_of(&self, account: AccountId) -> Amount {
        self.accounts
            .get(&account)
            .map(|e| e.conditioned)
            .unwrap_or(0)
    }

    /// Combined holding of an account: free plus conditioned balance.
    pub fn balance_of(&self, account: AccountId) -> Amount {
        // Bounded by total_supply, so the sum cannot overflow.
        self.free_of(account) + self.conditioned_of(account)
    }

    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> Amount {
        self.accounts
            .get(&owner)
            .and_then(|e| e.allowances.get(&spender).copied())
            .unwrap_or(0)
    }

    /// Create new supply in `to`'s free balance.
    pub(crate) fn mint(&mut self, to: AccountId, amount: Amount) -> Result<(), LedgerError> {
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.total_supply = new_supply;
        // Bounded by the supply just checked above.
        self.entry_mut(to).free += amount;
        Ok(())
    }

    /// Move `value` between free balances.
    pub(crate) fn transfer_free(
        &mut self,
        from: AccountId,
        to: AccountId,
        value: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.free_of(from);
        if available < value {
            return Err(LedgerError::InsufficientFunds {
                requested: value,
                available,
            });
        }
        self.entry_mut(from).free -= value;
        self.entry_mut(to).free += value;
        Ok(())
    }

    /// Overwrite the amount `spender` may move on `owner`'s behalf.
    pub(crate) fn set_allowance(&mut self, owner: AccountId, spender: AccountId, value: Amount) {
        self.entry_mut(owner).allowances.insert(spender, value);
    }

    /// Consume `value` of the allowance `from` granted to `spender`.
    pub(crate) fn spend_allowance(
        &mut self,
        from: AccountId,
        spender: AccountId,
        value: Amount,
    ) -> Result<(), LedgerError> {
        let allowed = self.allowance(from, spender);
        if allowed < value {
            return Err(LedgerError::NotAllowed {
                allowed,
                requested: value,
            });
        }
        self.entry_mut(from).allowances.insert(spender, allowed - value);
        Ok(())
    }

    /// Move `value` from `from`'s free balance into `to`'s conditioned
    /// balance. Supply is unchanged.
    pub(crate) fn condition(
        &mut self,
        from: AccountId,
        to: AccountId,
        value: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.free_of(from);
        if available < value {
            return Err(LedgerError::InsufficientFunds {
                requested: value,
                available,
            });
        }
        self.entry_mut(from).free -= value;
        self.entry_mut(to).conditioned += value;
        Ok(())
    }

    /// Draw `amount` out of `from`'s conditioned balance into `to`'s free
    /// balance. Supply is unchanged.
    pub(crate) fn draw_conditioned(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.conditioned_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientConditionedBalance {
                requested: amount,
                available,
            });
        }
        self.entry_mut(from).conditioned -= amount;
        self.entry_mut(to).free += amount;
        Ok(())
    }

    /// Reclassify `amount` of `account`'s conditioned balance as free.
    /// The combined holding of `account` and the supply are unchanged.
    pub(crate) fn reclassify(
        &mut self,
        account: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.conditioned_of(account);
        if available < amount {
            return Err(LedgerError::InsufficientConditionedBalance {
                requested: amount,
                available,
            });
        }
        let entry = self.entry_mut(account);
        entry.conditioned -= amount;
        entry.free += amount;
        Ok(())
    }

    /// Audit: the aggregate supply equals the sum of all holdings.
    pub fn conservation_holds(&self) -> bool {
        let mut sum: Amount = 0;
        for entry in self.accounts.values() {
            sum = match sum
                .checked_add(entry.free)
                .and_then(|s| s.checked_add(entry.conditioned))
            {
                Some(s) => s,
                None => return false,
            };
        }
        sum == self.total_supply
    }

    fn entry_mut(&mut self, account: AccountId) -> &mut AccountEntry {
        self.accounts.entry(account).or_default()
    }
}
