use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Token amount in minimal units.
///
/// Wide enough for 18-decimal denominations; all ledger arithmetic over
/// amounts is checked, never wrapping.
pub type Amount = u128;

/// Number of decimals of the CUY token, fixed at construction.
pub const DECIMALS: u8 = 18;

/// Interest rates are expressed in basis points of this scale.
pub const INTEREST_SCALE: Amount = 10_000;

/// Opaque account handle.
///
/// Two identities are equal only when bit-identical. The all-zero value is
/// reserved: it never holds a balance and is rejected wherever funds would
/// move to or from it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId([u8; 20]);

impl AccountId {
    /// The reserved null identity.
    pub const ZERO: AccountId = AccountId([0u8; 20]);

    /// Byte length of an account handle.
    pub const LEN: usize = 20;

    pub const fn new(bytes: [u8; 20]) -> Self {
        AccountId(bytes)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for AccountId {
    fn from(bytes: [u8; 20]) -> Self {
        AccountId(bytes)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self)
    }
}

/// Failure to parse an account handle from its hex text form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("account id must be {expected} hex characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("account id contains non-hex characters: {0}")]
    InvalidHex(String),
}

impl FromStr for AccountId {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != Self::LEN * 2 {
            return Err(AddressParseError::InvalidLength {
                expected: Self::LEN * 2,
                actual: digits.len(),
            });
        }
        let raw = hex::decode(digits)
            .map_err(|_| AddressParseError::InvalidHex(digits.to_string()))?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&raw);
        Ok(AccountId(bytes))
    }
}

// Hex text form on the wire so account ids can key JSON maps.
impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Read model describing the token as configured at construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenSummary {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub initial_account: AccountId,
}
