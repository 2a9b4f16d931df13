use crate::types::Amount;
use thiserror::Error;

/// Ledger operation errors.
///
/// Every variant is a caller-correctable input or authorization problem:
/// a failed operation leaves no partial state behind and emits no events,
/// so the caller may correct the arguments and resubmit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Only an owner account could make this call.")]
    NotOwner,

    #[error("Only an Admin account could make this call.")]
    NotAdmin,

    #[error("Contract is paused and cannot execute any operation.")]
    ContractPaused,

    #[error("Address of '{what}' cannot be the zero account.")]
    ZeroAddress { what: &'static str },

    #[error("insufficient free balance: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    #[error("insufficient conditioned balance: requested {requested}, available {available}")]
    InsufficientConditionedBalance { requested: Amount, available: Amount },

    #[error("client has an unpaid loan")]
    LoanAlreadyOpen,

    #[error("not allowed: authorized amount {allowed} is below requested {requested}")]
    NotAllowed { allowed: Amount, requested: Amount },

    #[error("arithmetic overflow in ledger accounting")]
    Overflow,

    #[error("ledger lock poisoned")]
    LockPoisoned,

    #[error("snapshot error: {0}")]
    Snapshot(String),
}
