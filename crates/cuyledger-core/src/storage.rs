//! Snapshot persistence for the ledger aggregate.
//!
//! The authoritative state lives in memory; persistence is a full JSON
//! image written after a commit and re-verified on hydration. Hosts that
//! need no durability run the `Memory` backend, which persists nothing.

use crate::accounts::AccountBook;
use crate::conditioning::WhitelistBook;
use crate::engine::TokenLedger;
use crate::error::LedgerError;
use crate::events::EventSink;
use crate::lending::LoanRegistry;
use crate::policy::{PauseSwitch, RolePolicy};
use crate::types::AccountId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

/// Full serde image of the ledger state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub initial_account: AccountId,
    pub policy: RolePolicy,
    pub pause: PauseSwitch,
    pub accounts: AccountBook,
    pub loans: LoanRegistry,
    pub whitelist: WhitelistBook,
}

/// Persistence backend configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StorageConfig {
    /// Keep the ledger state in process memory only.
    #[default]
    Memory,
    /// Mirror the full state image to a JSON file.
    File { path: PathBuf },
}

impl StorageConfig {
    pub fn memory() -> Self {
        Self::Memory
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File { .. } => "file",
        }
    }

    /// Persist the ledger's current state. A no-op for `Memory`.
    pub fn save(&self, ledger: &TokenLedger) -> Result<(), LedgerError> {
        match self {
            Self::Memory => Ok(()),
            Self::File { path } => {
                let snapshot = ledger.snapshot();
                let encoded = serde_json::to_vec_pretty(&snapshot)
                    .map_err(|e| LedgerError::Snapshot(format!("encode failed: {e}")))?;
                fs::write(path, encoded)
                    .map_err(|e| LedgerError::Snapshot(format!("write failed: {e}")))
            }
        }
    }

    /// Hydrate a ledger from persisted state.
    ///
    /// Returns `Ok(None)` when nothing was persisted yet (`Memory`, or the
    /// file does not exist). A present but unreadable or
    /// invariant-violating image is an error.
    pub fn load(&self, sink: Arc<dyn EventSink>) -> Result<Option<TokenLedger>, LedgerError> {
        match self {
            Self::Memory => Ok(None),
            Self::File { path } => {
                let bytes = match fs::read(path) {
                    Ok(bytes) => bytes,
                    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                    Err(e) => {
                        return Err(LedgerError::Snapshot(format!("read failed: {e}")));
                    }
                };
                let snapshot: LedgerSnapshot = serde_json::from_slice(&bytes)
                    .map_err(|e| LedgerError::Snapshot(format!("decode failed: {e}")))?;
                TokenLedger::from_snapshot(snapshot, sink).map(Some)
            }
        }
    }
}
