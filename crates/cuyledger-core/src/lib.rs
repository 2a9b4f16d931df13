//! CUY token ledger core.
//!
//! This crate implements a token-accounting ledger that layers micro-lending
//! bookkeeping, conditioned (earmarked) spending, and merchant whitelists on
//! top of a transferable-balance model, with role-based gating, a pausable
//! circuit breaker, exact value conservation, and all-or-nothing operation
//! semantics. Caller identity is supplied explicitly per call by the host;
//! notifications go to a pluggable [`EventSink`].

#![deny(unsafe_code)]

pub mod accounts;
pub mod conditioning;
pub mod engine;
pub mod error;
pub mod events;
pub mod lending;
pub mod policy;
pub mod shared;
pub mod storage;
pub mod types;

pub use accounts::{AccountBook, AccountEntry};
pub use conditioning::WhitelistBook;
pub use engine::{TokenConfig, TokenLedger};
pub use error::LedgerError;
pub use events::{EventSink, LedgerEvent, MemoryEventSink, NullEventSink, TracingEventSink};
pub use lending::{Loan, LoanRegistry};
pub use policy::{PauseState, PauseSwitch, RolePolicy};
pub use shared::SharedLedger;
pub use storage::{LedgerSnapshot, StorageConfig};
pub use types::{AccountId, AddressParseError, Amount, TokenSummary, DECIMALS, INTEREST_SCALE};
