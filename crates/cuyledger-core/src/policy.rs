//! Role gating and the pause circuit breaker.
//!
//! Both gates are consulted at the start of every mutating operation and are
//! intentionally rule-based: the same caller and state always yield the same
//! decision.

use crate::error::LedgerError;
use crate::types::AccountId;
use serde::{Deserialize, Serialize};

/// Privileged identities of the ledger.
///
/// Owner and admin are fixed at construction (both to the initial account in
/// the deployed configuration) and no operation reassigns them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RolePolicy {
    owner: AccountId,
    admin: AccountId,
}

impl RolePolicy {
    pub fn new(initial_account: AccountId) -> Self {
        Self {
            owner: initial_account,
            admin: initial_account,
        }
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn admin(&self) -> AccountId {
        self.admin
    }

    pub fn is_owner(&self, caller: AccountId) -> bool {
        caller == self.owner
    }

    pub fn is_admin(&self, caller: AccountId) -> bool {
        caller == self.admin
    }

    pub fn require_owner(&self, caller: AccountId) -> Result<(), LedgerError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(LedgerError::NotOwner)
        }
    }

    pub fn require_admin(&self, caller: AccountId) -> Result<(), LedgerError> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(LedgerError::NotAdmin)
        }
    }

    /// Gate for operations open to either privileged identity.
    pub fn require_admin_or_owner(&self, caller: AccountId) -> Result<(), LedgerError> {
        if self.is_admin(caller) || self.is_owner(caller) {
            Ok(())
        } else {
            Err(LedgerError::NotAdmin)
        }
    }
}

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PauseState {
    #[default]
    Active,
    Paused,
}

/// Global switch disabling all mutating operations except itself.
///
/// Engaging or releasing the switch when it is already in the target state
/// is a harmless no-op; state is never corrupted by repeated calls.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PauseSwitch {
    state: PauseState,
}

impl PauseSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.state == PauseState::Paused
    }

    pub fn require_active(&self) -> Result<(), LedgerError> {
        match self.state {
            PauseState::Active => Ok(()),
            PauseState::Paused => Err(LedgerError::ContractPaused),
        }
    }

    pub(crate) fn pause(&mut self) {
        self.state = PauseState::Paused;
    }

    pub(crate) fn unpause(&mut self) {
        self.state = PauseState::Active;
    }
}
