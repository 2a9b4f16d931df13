//! Merchant whitelist caps backing conditioned spending.
//!
//! A cap is the amount a holder authorized a given merchant to draw from the
//! holder's conditioned balance. Caps are written only by conditioned
//! transfers — every listed merchant receives the same full cap, not a
//! split — and are never deleted or decremented: the table records
//! authorization, the conditioned balance carries the funds.

use crate::error::LedgerError;
use crate::types::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// (holder, merchant) -> cap table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WhitelistBook {
    caps: BTreeMap<AccountId, BTreeMap<AccountId, Amount>>,
}

impl WhitelistBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cap `holder` authorized for `merchant`; zero if never listed.
    pub fn cap(&self, holder: AccountId, merchant: AccountId) -> Amount {
        self.caps
            .get(&holder)
            .and_then(|merchants| merchants.get(&merchant).copied())
            .unwrap_or(0)
    }

    /// Overwrite the cap of every listed merchant with `value`.
    pub(crate) fn set_caps(&mut self, holder: AccountId, merchants: &[AccountId], value: Amount) {
        let entry = self.caps.entry(holder).or_default();
        for merchant in merchants {
            entry.insert(*merchant, value);
        }
    }

    /// Gate a merchant draw against the authorized cap.
    pub(crate) fn require_within_cap(
        &self,
        holder: AccountId,
        merchant: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let allowed = self.cap(holder, merchant);
        if amount > allowed {
            return Err(LedgerError::NotAllowed {
                allowed,
                requested: amount,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(tag: u8) -> AccountId {
        let mut bytes = [0u8; 20];
        bytes[19] = tag;
        AccountId::new(bytes)
    }

    #[test]
    fn every_listed_merchant_gets_the_full_cap() {
        let mut book = WhitelistBook::new();
        let merchants = [account(8), account(9), account(10), account(11)];
        book.set_caps(account(1), &merchants, 10_000);

        for merchant in merchants {
            assert_eq!(book.cap(account(1), merchant), 10_000);
        }
    }

    #[test]
    fn later_conditioned_transfer_overwrites_the_cap() {
        let mut book = WhitelistBook::new();
        book.set_caps(account(1), &[account(8)], 10_000);
        book.set_caps(account(1), &[account(8)], 4_000);

        assert_eq!(book.cap(account(1), account(8)), 4_000);
    }

    #[test]
    fn unlisted_merchant_has_zero_cap_and_cannot_draw() {
        let book = WhitelistBook::new();
        assert_eq!(book.cap(account(1), account(8)), 0);
        assert!(matches!(
            book.require_within_cap(account(1), account(8), 1),
            Err(LedgerError::NotAllowed {
                allowed: 0,
                requested: 1
            })
        ));
    }

    #[test]
    fn draws_up_to_the_cap_are_authorized() {
        let mut book = WhitelistBook::new();
        book.set_caps(account(1), &[account(8)], 10_000);

        assert!(book.require_within_cap(account(1), account(8), 10_000).is_ok());
        assert!(matches!(
            book.require_within_cap(account(1), account(8), 10_001),
            Err(LedgerError::NotAllowed { .. })
        ));
    }

    #[test]
    fn caps_are_scoped_per_holder() {
        let mut book = WhitelistBook::new();
        book.set_caps(account(1), &[account(8)], 10_000);

        assert_eq!(book.cap(account(2), account(8)), 0);
    }
}
