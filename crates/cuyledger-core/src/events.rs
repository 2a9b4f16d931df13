//! Notification stream emitted to external observers.
//!
//! The ledger guarantees an exact, ordered stream of structured records per
//! committed operation: a failed operation emits nothing. How the records are
//! transported or encoded is the sink implementation's concern.

use crate::types::{AccountId, Amount};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Structured notification record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LedgerEvent {
    /// Value moved between accounts; minting reports the zero account as
    /// `from`.
    Transfer {
        from: AccountId,
        to: AccountId,
        value: Amount,
    },

    /// A holder authorized a spender to move up to `value` on their behalf.
    Approval {
        owner: AccountId,
        spender: AccountId,
        value: Amount,
    },

    /// A loan was opened for `from`, minting `value` new supply.
    Lend { from: AccountId, value: Amount },

    /// The circuit breaker was engaged by `account`.
    Paused { account: AccountId },

    /// The circuit breaker was released by `account`.
    Unpaused { account: AccountId },
}

/// Receiver for the ledger's notification stream.
///
/// Implementations must not fail: the ledger has already committed by the
/// time a record is emitted, so a sink that cannot deliver must buffer or
/// drop on its own terms.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: LedgerEvent);
}

/// Sink that discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: LedgerEvent) {}
}

/// In-memory recording sink for tests and embedded observers.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: RwLock<Vec<LedgerEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    /// All records emitted so far, in emission order.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events.read().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: LedgerEvent) {
        self.events.write().push(event);
    }
}

/// Sink that forwards each record to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: LedgerEvent) {
        match &event {
            LedgerEvent::Transfer { from, to, value } => {
                info!(%from, %to, value, "transfer");
            }
            LedgerEvent::Approval {
                owner,
                spender,
                value,
            } => {
                info!(%owner, %spender, value, "approval");
            }
            LedgerEvent::Lend { from, value } => {
                info!(%from, value, "lend");
            }
            LedgerEvent::Paused { account } => {
                info!(%account, "paused");
            }
            LedgerEvent::Unpaused { account } => {
                info!(%account, "unpaused");
            }
        }
    }
}
