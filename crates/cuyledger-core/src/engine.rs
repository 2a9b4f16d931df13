//! The ledger aggregate: gating, atomic mutation, and event emission.
//!
//! Every public operation follows the same discipline: consult the pause
//! switch and role policy, validate every remaining precondition against
//! unmodified state, apply the mutation set, then emit the operation's
//! ordered events. A returned error therefore means no state change and no
//! emission.

use crate::accounts::AccountBook;
use crate::conditioning::WhitelistBook;
use crate::error::LedgerError;
use crate::events::{EventSink, LedgerEvent};
use crate::lending::{Loan, LoanRegistry};
use crate::policy::{PauseSwitch, RolePolicy};
use crate::storage::LedgerSnapshot;
use crate::types::{AccountId, Amount, TokenSummary, DECIMALS};
use std::sync::Arc;
use tracing::{debug, info};

/// Constructor arguments of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    /// Receives the initial supply and both privileged roles.
    pub initial_account: AccountId,
    pub initial_supply: Amount,
}

impl TokenConfig {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        initial_account: AccountId,
        initial_supply: Amount,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            initial_account,
            initial_supply,
        }
    }
}

/// The token-accounting ledger.
///
/// A single owned aggregate: constructed once, mutated one operation at a
/// time, never torn down except with the process. Hosts that field
/// concurrent requests serialize access through [`crate::SharedLedger`].
pub struct TokenLedger {
    name: String,
    symbol: String,
    decimals: u8,
    initial_account: AccountId,
    policy: RolePolicy,
    pause: PauseSwitch,
    accounts: AccountBook,
    loans: LoanRegistry,
    whitelist: WhitelistBook,
    sink: Arc<dyn EventSink>,
}

impl TokenLedger {
    /// Construct the ledger, minting the initial supply to the initial
    /// account (which also becomes owner and admin).
    pub fn new(config: TokenConfig, sink: Arc<dyn EventSink>) -> Result<Self, LedgerError> {
        if config.initial_account.is_zero() {
            return Err(LedgerError::ZeroAddress {
                what: "initial_account",
            });
        }

        let mut ledger = Self {
            name: config.name,
            symbol: config.symbol,
            decimals: DECIMALS,
            initial_account: config.initial_account,
            policy: RolePolicy::new(config.initial_account),
            pause: PauseSwitch::new(),
            accounts: AccountBook::new(),
            loans: LoanRegistry::new(),
            whitelist: WhitelistBook::new(),
            sink,
        };

        if config.initial_supply > 0 {
            ledger
                .accounts
                .mint(config.initial_account, config.initial_supply)?;
            ledger.sink.emit(LedgerEvent::Transfer {
                from: AccountId::ZERO,
                to: config.initial_account,
                value: config.initial_supply,
            });
        }

        Ok(ledger)
    }

    // ------------------------------------------------------------------
    // Circuit breaker
    // ------------------------------------------------------------------

    /// Engage the circuit breaker. Owner only; a repeated call is a no-op
    /// that still notifies.
    pub fn pause(&mut self, caller: AccountId) -> Result<(), LedgerError> {
        self.policy.require_owner(caller)?;
        self.pause.pause();
        info!(account = %caller, "ledger paused");
        self.sink.emit(LedgerEvent::Paused { account: caller });
        Ok(())
    }

    /// Release the circuit breaker. Owner only.
    pub fn unpause(&mut self, caller: AccountId) -> Result<(), LedgerError> {
        self.policy.require_owner(caller)?;
        self.pause.unpause();
        info!(account = %caller, "ledger unpaused");
        self.sink.emit(LedgerEvent::Unpaused { account: caller });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lending
    // ------------------------------------------------------------------

    /// Open a loan for `borrower`, minting `amount_cuy` new supply into the
    /// admin caller's free balance. The borrower receives tokens only via
    /// later transfers initiated by the admin.
    #[allow(clippy::too_many_arguments)]
    pub fn lend(
        &mut self,
        caller: AccountId,
        borrower: AccountId,
        id_client: impl Into<String>,
        id_business: impl Into<String>,
        amount_cuy: Amount,
        amount_fiat: Amount,
        interest: Amount,
    ) -> Result<Loan, LedgerError> {
        self.policy.require_admin(caller)?;
        self.pause.require_active()?;
        if borrower.is_zero() {
            return Err(LedgerError::ZeroAddress { what: "borrower" });
        }
        if self.loans.has_open_loan(borrower) {
            return Err(LedgerError::LoanAlreadyOpen);
        }

        let loan = Loan::originate(
            caller,
            id_client,
            id_business,
            amount_cuy,
            amount_fiat,
            interest,
        )?;

        debug!(
            lender = %caller,
            %borrower,
            amount_cuy,
            amount_fiat,
            interest,
            "opening loan"
        );

        // Commit: mint checks the supply ceiling before its first write;
        // the open-loan slot was verified above, so storing cannot fail.
        self.accounts.mint(caller, amount_cuy)?;
        self.loans.open_loan(borrower, loan.clone())?;

        self.sink.emit(LedgerEvent::Transfer {
            from: AccountId::ZERO,
            to: caller,
            value: amount_cuy,
        });
        self.sink.emit(LedgerEvent::Lend {
            from: borrower,
            value: amount_cuy,
        });

        Ok(loan)
    }

    // ------------------------------------------------------------------
    // Free transfers and allowances
    // ------------------------------------------------------------------

    /// Move `value` of free balance from the caller to `to`.
    pub fn transfer(
        &mut self,
        caller: AccountId,
        to: AccountId,
        value: Amount,
    ) -> Result<(), LedgerError> {
        self.pause.require_active()?;
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress { what: "to" });
        }

        self.accounts.transfer_free(caller, to, value)?;
        self.sink.emit(LedgerEvent::Transfer {
            from: caller,
            to,
            value,
        });
        Ok(())
    }

    /// Authorize `spender` to move up to `value` on the caller's behalf.
    /// The grant replaces any previous one.
    pub fn approve(
        &mut self,
        caller: AccountId,
        spender: AccountId,
        value: Amount,
    ) -> Result<(), LedgerError> {
        self.pause.require_active()?;
        if spender.is_zero() {
            return Err(LedgerError::ZeroAddress { what: "spender" });
        }

        self.accounts.set_allowance(caller, spender, value);
        self.sink.emit(LedgerEvent::Approval {
            owner: caller,
            spender,
            value,
        });
        Ok(())
    }

    /// Move `value` from `from` to `to` against the allowance `from`
    /// granted the caller.
    pub fn transfer_from(
        &mut self,
        caller: AccountId,
        from: AccountId,
        to: AccountId,
        value: Amount,
    ) -> Result<(), LedgerError> {
        self.pause.require_active()?;
        if to.is_zero() {
            // The checked party is the destination; the message keeps the
            // historical wording naming the spender.
            return Err(LedgerError::ZeroAddress { what: "spender" });
        }

        let allowed = self.accounts.allowance(from, caller);
        if allowed < value {
            return Err(LedgerError::NotAllowed {
                allowed,
                requested: value,
            });
        }
        let available = self.accounts.free_of(from);
        if available < value {
            return Err(LedgerError::InsufficientFunds {
                requested: value,
                available,
            });
        }

        self.accounts.spend_allowance(from, caller, value)?;
        self.accounts.transfer_free(from, to, value)?;
        self.sink.emit(LedgerEvent::Transfer { from, to, value });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Conditioned spending
    // ------------------------------------------------------------------

    /// Move `value` of the owner caller's free balance into `to`'s
    /// conditioned balance and authorize every listed merchant to draw up
    /// to the full amount.
    pub fn transfer_conditioned(
        &mut self,
        caller: AccountId,
        to: AccountId,
        value: Amount,
        merchants: &[AccountId],
    ) -> Result<(), LedgerError> {
        self.policy.require_owner(caller)?;
        self.pause.require_active()?;
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress { what: "to" });
        }
        if merchants.iter().any(AccountId::is_zero) {
            return Err(LedgerError::ZeroAddress { what: "merchant" });
        }

        debug!(%caller, %to, value, merchants = merchants.len(), "conditioned transfer");

        self.accounts.condition(caller, to, value)?;
        self.whitelist.set_caps(to, merchants, value);
        self.sink.emit(LedgerEvent::Transfer {
            from: caller,
            to,
            value,
        });
        Ok(())
    }

    /// Pay `amount` of the caller's conditioned balance to a whitelisted
    /// merchant, whose free balance receives the funds.
    pub fn shop_pay(
        &mut self,
        caller: AccountId,
        merchant: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.pause.require_active()?;
        if merchant.is_zero() {
            return Err(LedgerError::ZeroAddress { what: "merchant" });
        }

        self.whitelist.require_within_cap(caller, merchant, amount)?;

        debug!(%caller, %merchant, amount, "merchant payment");

        self.accounts.draw_conditioned(caller, merchant, amount)?;
        self.sink.emit(LedgerEvent::Transfer {
            from: caller,
            to: merchant,
            value: amount,
        });
        Ok(())
    }

    /// Reclassify `amount` of `account`'s conditioned balance as free.
    /// Admin or owner only; the combined holding and the supply are
    /// unchanged, and no event is emitted.
    pub fn balances_transform(
        &mut self,
        caller: AccountId,
        account: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.policy.require_admin_or_owner(caller)?;
        self.pause.require_active()?;
        if account.is_zero() {
            return Err(LedgerError::ZeroAddress { what: "account" });
        }

        self.accounts.reclassify(account, amount)?;
        debug!(%caller, %account, amount, "reclassified conditioned balance");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read-only surface
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.accounts.total_supply()
    }

    /// Combined holding of `account`: free plus conditioned balance.
    pub fn balance_of(&self, account: AccountId) -> Amount {
        self.accounts.balance_of(account)
    }

    pub fn balance_free_of(&self, account: AccountId) -> Amount {
        self.accounts.free_of(account)
    }

    pub fn balance_conditioned_of(&self, account: AccountId) -> Amount {
        self.accounts.conditioned_of(account)
    }

    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> Amount {
        self.accounts.allowance(owner, spender)
    }

    /// The cap `holder` authorized for `merchant`; zero if never listed.
    pub fn is_white_list(&self, holder: AccountId, merchant: AccountId) -> Amount {
        self.whitelist.cap(holder, merchant)
    }

    /// The loan record stored for `borrower`, or `None` if never lent to.
    pub fn loan_balance(&self, borrower: AccountId) -> Option<&Loan> {
        self.loans.loan_balance(borrower)
    }

    pub fn token_summary(&self) -> TokenSummary {
        TokenSummary {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            initial_account: self.initial_account,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn owner(&self) -> AccountId {
        self.policy.owner()
    }

    pub fn admin(&self) -> AccountId {
        self.policy.admin()
    }

    /// Audit: the aggregate supply equals the sum of all holdings.
    pub fn conservation_holds(&self) -> bool {
        self.accounts.conservation_holds()
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Full state image for persistence.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            initial_account: self.initial_account,
            policy: self.policy.clone(),
            pause: self.pause,
            accounts: self.accounts.clone(),
            loans: self.loans.clone(),
            whitelist: self.whitelist.clone(),
        }
    }

    /// Rebuild a ledger from a persisted image, re-verifying supply
    /// conservation before accepting it.
    pub fn from_snapshot(
        snapshot: LedgerSnapshot,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, LedgerError> {
        if !snapshot.accounts.conservation_holds() {
            return Err(LedgerError::Snapshot(
                "persisted supply does not match the sum of holdings".to_string(),
            ));
        }

        Ok(Self {
            name: snapshot.name,
            symbol: snapshot.symbol,
            decimals: snapshot.decimals,
            initial_account: snapshot.initial_account,
            policy: snapshot.policy,
            pause: snapshot.pause,
            accounts: snapshot.accounts,
            loans: snapshot.loans,
            whitelist: snapshot.whitelist,
            sink,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MemoryEventSink, NullEventSink};

    fn account(tag: u8) -> AccountId {
        let mut bytes = [0u8; 20];
        bytes[19] = tag;
        AccountId::new(bytes)
    }

    fn ledger_with(initial_supply: Amount) -> TokenLedger {
        TokenLedger::new(
            TokenConfig::new("CuyToken", "CTK", account(1), initial_supply),
            Arc::new(NullEventSink),
        )
        .unwrap()
    }

    #[test]
    fn constructor_rejects_the_zero_initial_account() {
        let result = TokenLedger::new(
            TokenConfig::new("CuyToken", "CTK", AccountId::ZERO, 0),
            Arc::new(NullEventSink),
        );
        assert!(matches!(
            result,
            Err(LedgerError::ZeroAddress {
                what: "initial_account"
            })
        ));
    }

    #[test]
    fn constructor_mints_the_initial_supply_with_a_transfer_event() {
        let sink = Arc::new(MemoryEventSink::new());
        let ledger = TokenLedger::new(
            TokenConfig::new("CuyToken", "CTK", account(1), 5_000),
            sink.clone(),
        )
        .unwrap();

        assert_eq!(ledger.total_supply(), 5_000);
        assert_eq!(ledger.balance_of(account(1)), 5_000);
        assert_eq!(
            sink.events(),
            vec![LedgerEvent::Transfer {
                from: AccountId::ZERO,
                to: account(1),
                value: 5_000,
            }]
        );
    }

    #[test]
    fn zero_initial_supply_emits_nothing() {
        let sink = Arc::new(MemoryEventSink::new());
        let ledger = TokenLedger::new(
            TokenConfig::new("CuyToken", "CTK", account(1), 0),
            sink.clone(),
        )
        .unwrap();

        assert_eq!(ledger.total_supply(), 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn lend_requires_the_admin_role() {
        let mut ledger = ledger_with(0);
        let result = ledger.lend(account(2), account(3), "C1", "B1", 1_000, 500, 100);
        assert!(matches!(result, Err(LedgerError::NotAdmin)));
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn lend_mints_into_the_caller_not_the_borrower() {
        let mut ledger = ledger_with(0);
        let loan = ledger
            .lend(account(1), account(4), "C1", "B1", 123_123, 10_000, 100)
            .unwrap();

        assert_eq!(ledger.total_supply(), 123_123);
        assert_eq!(ledger.balance_of(account(1)), 123_123);
        assert_eq!(ledger.balance_of(account(4)), 0);
        assert_eq!(loan.lender, account(1));
        assert!(ledger.loan_balance(account(4)).unwrap().open);
    }

    #[test]
    fn lend_emits_transfer_then_lend() {
        let sink = Arc::new(MemoryEventSink::new());
        let mut ledger = TokenLedger::new(
            TokenConfig::new("CuyToken", "CTK", account(1), 0),
            sink.clone(),
        )
        .unwrap();

        ledger
            .lend(account(1), account(4), "C1", "B1", 123_123, 10_000, 100)
            .unwrap();

        assert_eq!(
            sink.events(),
            vec![
                LedgerEvent::Transfer {
                    from: AccountId::ZERO,
                    to: account(1),
                    value: 123_123,
                },
                LedgerEvent::Lend {
                    from: account(4),
                    value: 123_123,
                },
            ]
        );
    }

    #[test]
    fn second_lend_to_the_same_borrower_leaves_supply_unchanged() {
        let mut ledger = ledger_with(0);
        ledger
            .lend(account(1), account(4), "C1", "B1", 123_123, 10_000, 100)
            .unwrap();
        let supply = ledger.total_supply();

        let result = ledger.lend(account(1), account(4), "C1", "B1", 123_123, 10_000, 100);
        assert!(matches!(result, Err(LedgerError::LoanAlreadyOpen)));
        assert_eq!(ledger.total_supply(), supply);
    }

    #[test]
    fn lend_rejects_the_zero_borrower() {
        let mut ledger = ledger_with(0);
        let result = ledger.lend(account(1), AccountId::ZERO, "C1", "B1", 1_000, 500, 100);
        assert!(matches!(
            result,
            Err(LedgerError::ZeroAddress { what: "borrower" })
        ));
    }

    #[test]
    fn paused_ledger_refuses_every_mutating_operation() {
        let mut ledger = ledger_with(100_000);
        ledger
            .lend(account(1), account(4), "C1", "B1", 1_000, 500, 100)
            .unwrap();
        ledger
            .transfer_conditioned(account(1), account(5), 1_000, &[account(6)])
            .unwrap();
        ledger.pause(account(1)).unwrap();

        assert!(matches!(
            ledger.lend(account(1), account(7), "C2", "B2", 1, 1, 1),
            Err(LedgerError::ContractPaused)
        ));
        assert!(matches!(
            ledger.transfer(account(1), account(2), 1),
            Err(LedgerError::ContractPaused)
        ));
        assert!(matches!(
            ledger.approve(account(1), account(2), 1),
            Err(LedgerError::ContractPaused)
        ));
        assert!(matches!(
            ledger.transfer_from(account(2), account(1), account(3), 1),
            Err(LedgerError::ContractPaused)
        ));
        assert!(matches!(
            ledger.transfer_conditioned(account(1), account(2), 1, &[]),
            Err(LedgerError::ContractPaused)
        ));
        assert!(matches!(
            ledger.shop_pay(account(5), account(6), 1),
            Err(LedgerError::ContractPaused)
        ));
        assert!(matches!(
            ledger.balances_transform(account(1), account(5), 1),
            Err(LedgerError::ContractPaused)
        ));

        ledger.unpause(account(1)).unwrap();
        ledger.transfer(account(1), account(2), 1).unwrap();
    }

    #[test]
    fn pause_and_unpause_are_owner_only() {
        let mut ledger = ledger_with(0);
        assert!(matches!(
            ledger.pause(account(2)),
            Err(LedgerError::NotOwner)
        ));
        assert!(matches!(
            ledger.unpause(account(2)),
            Err(LedgerError::NotOwner)
        ));
    }

    #[test]
    fn repeated_pause_succeeds_and_notifies() {
        let sink = Arc::new(MemoryEventSink::new());
        let mut ledger = TokenLedger::new(
            TokenConfig::new("CuyToken", "CTK", account(1), 0),
            sink.clone(),
        )
        .unwrap();

        ledger.pause(account(1)).unwrap();
        ledger.pause(account(1)).unwrap();

        assert!(ledger.is_paused());
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn transfer_from_checks_the_allowance_before_the_balance() {
        let mut ledger = ledger_with(100);
        // No allowance granted: the authorization error wins even though
        // the balance is also insufficient.
        let result = ledger.transfer_from(account(2), account(1), account(3), 200);
        assert!(matches!(result, Err(LedgerError::NotAllowed { .. })));

        ledger.approve(account(1), account(2), 200).unwrap();
        let result = ledger.transfer_from(account(2), account(1), account(3), 200);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                requested: 200,
                available: 100
            })
        ));
        // Failed transfer consumed none of the allowance.
        assert_eq!(ledger.allowance(account(1), account(2)), 200);
    }

    #[test]
    fn transfer_from_zero_destination_keeps_the_spender_wording() {
        let mut ledger = ledger_with(100);
        let result = ledger.transfer_from(account(2), account(1), AccountId::ZERO, 10);
        assert!(matches!(
            result,
            Err(LedgerError::ZeroAddress { what: "spender" })
        ));
    }

    #[test]
    fn transfer_conditioned_is_owner_only() {
        let mut ledger = ledger_with(1_000);
        ledger.transfer(account(1), account(2), 500).unwrap();

        let result = ledger.transfer_conditioned(account(2), account(3), 100, &[account(6)]);
        assert!(matches!(result, Err(LedgerError::NotOwner)));
    }

    #[test]
    fn transfer_conditioned_rejects_zero_merchants() {
        let mut ledger = ledger_with(1_000);
        let result =
            ledger.transfer_conditioned(account(1), account(2), 100, &[AccountId::ZERO]);
        assert!(matches!(
            result,
            Err(LedgerError::ZeroAddress { what: "merchant" })
        ));
        assert_eq!(ledger.balance_of(account(2)), 0);
    }

    #[test]
    fn shop_pay_is_capped_by_the_whitelist() {
        let mut ledger = ledger_with(10_000);
        ledger
            .transfer_conditioned(account(1), account(2), 10_000, &[account(8)])
            .unwrap();

        // Merchant never listed for this holder.
        assert!(matches!(
            ledger.shop_pay(account(2), account(9), 1),
            Err(LedgerError::NotAllowed { .. })
        ));

        ledger.shop_pay(account(2), account(8), 10_000).unwrap();
        assert_eq!(ledger.balance_conditioned_of(account(2)), 0);
        assert_eq!(ledger.balance_of(account(8)), 10_000);
    }

    #[test]
    fn balances_transform_requires_a_privileged_caller() {
        let mut ledger = ledger_with(10_000);
        ledger
            .transfer_conditioned(account(1), account(2), 5_000, &[account(8)])
            .unwrap();

        assert!(matches!(
            ledger.balances_transform(account(2), account(2), 5_000),
            Err(LedgerError::NotAdmin)
        ));

        ledger
            .balances_transform(account(1), account(2), 5_000)
            .unwrap();
        assert_eq!(ledger.balance_conditioned_of(account(2)), 0);
        assert_eq!(ledger.balance_free_of(account(2)), 5_000);
    }

    #[test]
    fn token_summary_reports_the_construction_parameters() {
        let ledger = ledger_with(0);
        let summary = ledger.token_summary();
        assert_eq!(summary.name, "CuyToken");
        assert_eq!(summary.symbol, "CTK");
        assert_eq!(summary.decimals, DECIMALS);
        assert_eq!(summary.initial_account, account(1));
    }
}
