//! Concurrent facade over the ledger aggregate.
//!
//! The core engine is single-writer by construction. Hosts that field
//! concurrent external requests wrap it in [`SharedLedger`], which
//! serializes mutating operations behind a write lock while read-only
//! queries share a read lock; no query can observe a half-applied
//! operation.

use crate::engine::TokenLedger;
use crate::error::LedgerError;
use crate::lending::Loan;
use crate::types::{AccountId, Amount, TokenSummary};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable, thread-safe handle to one ledger instance.
#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<TokenLedger>>,
}

impl SharedLedger {
    pub fn new(ledger: TokenLedger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TokenLedger>, LedgerError> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TokenLedger>, LedgerError> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    pub fn pause(&self, caller: AccountId) -> Result<(), LedgerError> {
        self.write()?.pause(caller)
    }

    pub fn unpause(&self, caller: AccountId) -> Result<(), LedgerError> {
        self.write()?.unpause(caller)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn lend(
        &self,
        caller: AccountId,
        borrower: AccountId,
        id_client: impl Into<String>,
        id_business: impl Into<String>,
        amount_cuy: Amount,
        amount_fiat: Amount,
        interest: Amount,
    ) -> Result<Loan, LedgerError> {
        self.write()?.lend(
            caller,
            borrower,
            id_client,
            id_business,
            amount_cuy,
            amount_fiat,
            interest,
        )
    }

    pub fn transfer(
        &self,
        caller: AccountId,
        to: AccountId,
        value: Amount,
    ) -> Result<(), LedgerError> {
        self.write()?.transfer(caller, to, value)
    }

    pub fn approve(
        &self,
        caller: AccountId,
        spender: AccountId,
        value: Amount,
    ) -> Result<(), LedgerError> {
        self.write()?.approve(caller, spender, value)
    }

    pub fn transfer_from(
        &self,
        caller: AccountId,
        from: AccountId,
        to: AccountId,
        value: Amount,
    ) -> Result<(), LedgerError> {
        self.write()?.transfer_from(caller, from, to, value)
    }

    pub fn transfer_conditioned(
        &self,
        caller: AccountId,
        to: AccountId,
        value: Amount,
        merchants: &[AccountId],
    ) -> Result<(), LedgerError> {
        self.write()?
            .transfer_conditioned(caller, to, value, merchants)
    }

    pub fn shop_pay(
        &self,
        caller: AccountId,
        merchant: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.write()?.shop_pay(caller, merchant, amount)
    }

    pub fn balances_transform(
        &self,
        caller: AccountId,
        account: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.write()?.balances_transform(caller, account, amount)
    }

    pub fn total_supply(&self) -> Result<Amount, LedgerError> {
        Ok(self.read()?.total_supply())
    }

    pub fn balance_of(&self, account: AccountId) -> Result<Amount, LedgerError> {
        Ok(self.read()?.balance_of(account))
    }

    pub fn balance_free_of(&self, account: AccountId) -> Result<Amount, LedgerError> {
        Ok(self.read()?.balance_free_of(account))
    }

    pub fn balance_conditioned_of(&self, account: AccountId) -> Result<Amount, LedgerError> {
        Ok(self.read()?.balance_conditioned_of(account))
    }

    pub fn allowance(
        &self,
        owner: AccountId,
        spender: AccountId,
    ) -> Result<Amount, LedgerError> {
        Ok(self.read()?.allowance(owner, spender))
    }

    pub fn is_white_list(
        &self,
        holder: AccountId,
        merchant: AccountId,
    ) -> Result<Amount, LedgerError> {
        Ok(self.read()?.is_white_list(holder, merchant))
    }

    pub fn loan_balance(&self, borrower: AccountId) -> Result<Option<Loan>, LedgerError> {
        Ok(self.read()?.loan_balance(borrower).cloned())
    }

    pub fn token_summary(&self) -> Result<TokenSummary, LedgerError> {
        Ok(self.read()?.token_summary())
    }

    pub fn is_paused(&self) -> Result<bool, LedgerError> {
        Ok(self.read()?.is_paused())
    }
}
