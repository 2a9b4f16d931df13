//! Loan registry: one principal-plus-interest record per borrower.
//!
//! Loans are opened by the lending operation only. There is no repayment or
//! settlement path on this ledger's surface, so a loan stays open once
//! created; the registry's job is to refuse a second loan while one is open
//! and to serve read-only queries.

use crate::error::LedgerError;
use crate::types::{AccountId, Amount, INTEREST_SCALE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A loan record as stored per borrower.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Loan {
    /// The admin identity that issued the loan.
    pub lender: AccountId,
    pub id_client: String,
    pub id_business: String,
    /// Principal in token units.
    pub amount_cuy: Amount,
    /// Reference fiat principal.
    pub amount_fiat: Amount,
    /// Rate in basis points of [`INTEREST_SCALE`].
    pub interest: Amount,
    /// Fiat interest derived from `amount_fiat` and `interest`.
    pub interest_fiat: Amount,
    /// Outstanding fiat: `amount_fiat + interest_fiat`.
    pub balance_fiat: Amount,
    /// Outstanding token principal, initialized to `amount_cuy`.
    pub balance_cuy: Amount,
    pub open: bool,
}

impl Loan {
    /// Build an open loan record, deriving the fiat interest terms.
    pub fn originate(
        lender: AccountId,
        id_client: impl Into<String>,
        id_business: impl Into<String>,
        amount_cuy: Amount,
        amount_fiat: Amount,
        interest: Amount,
    ) -> Result<Self, LedgerError> {
        let interest_fiat = amount_fiat
            .checked_mul(interest)
            .ok_or(LedgerError::Overflow)?
            / INTEREST_SCALE;
        let balance_fiat = amount_fiat
            .checked_add(interest_fiat)
            .ok_or(LedgerError::Overflow)?;

        Ok(Self {
            lender,
            id_client: id_client.into(),
            id_business: id_business.into(),
            amount_cuy,
            amount_fiat,
            interest,
            interest_fiat,
            balance_fiat,
            balance_cuy: amount_cuy,
            open: true,
        })
    }
}

/// Per-borrower loan store enforcing "at most one open loan".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoanRegistry {
    loans: BTreeMap<AccountId, Loan>,
}

impl LoanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored record for `borrower`, or `None` if never lent to.
    pub fn loan_balance(&self, borrower: AccountId) -> Option<&Loan> {
        self.loans.get(&borrower)
    }

    pub fn has_open_loan(&self, borrower: AccountId) -> bool {
        self.loans
            .get(&borrower)
            .map(|loan| loan.open)
            .unwrap_or(false)
    }

    /// Store `loan` for `borrower`, refusing while an open loan exists.
    /// A closed record is overwritten.
    pub(crate) fn open_loan(
        &mut self,
        borrower: AccountId,
        loan: Loan,
    ) -> Result<(), LedgerError> {
        if self.has_open_loan(borrower) {
            return Err(LedgerError::LoanAlreadyOpen);
        }
        self.loans.insert(borrower, loan);
        Ok(())
    }

    /// Number of borrowers with an open loan.
    pub fn open_loan_count(&self) -> usize {
        self.loans.values().filter(|loan| loan.open).count()
    }
}
