//! Account identities.
//!
//! An account is 32 opaque bytes, rendered as base58 wherever it is shown or
//! persisted. The host environment authenticates callers; the registry only
//! compares identities.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Length of an account identity in bytes.
pub const ACCOUNT_ID_LEN: usize = 32;

const DERIVE_CONTEXT: &str = "permit 2024-06 account label";

/// Identity of a participating account.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId([u8; ACCOUNT_ID_LEN]);

impl AccountId {
    /// The hard-coded ledger administrator.
    pub const ADMINISTRATOR: Self = Self({
        let mut bytes = [0u8; ACCOUNT_ID_LEN];
        bytes[ACCOUNT_ID_LEN - 1] = 0x01;
        bytes
    });

    /// Create an account identity from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive a deterministic identity from a human-readable label.
    #[must_use]
    pub fn derive(label: &str) -> Self {
        Self(blake3::derive_key(DERIVE_CONTEXT, label.as_bytes()))
    }

    /// Raw bytes of the identity.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LEN] {
        &self.0
    }

    /// Returns true if this is [`AccountId::ADMINISTRATOR`].
    ///
    /// That is only the default. A registry built with another
    /// [`RegistryConfig::administrator`](crate::RegistryConfig::administrator)
    /// hands the owner credential to that account instead.
    #[must_use]
    pub fn is_default_administrator(&self) -> bool {
        *self == Self::ADMINISTRATOR
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({self})")
    }
}

/// Failure to parse a base58 account identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid account id: {reason}")]
pub struct ParseAccountIdError {
    reason: String,
}

impl FromStr for AccountId {
    type Err = ParseAccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s).into_vec().map_err(|e| ParseAccountIdError {
            reason: format!("invalid base58: {e}"),
        })?;
        let bytes: [u8; ACCOUNT_ID_LEN] =
            bytes.try_into().map_err(|b: Vec<u8>| ParseAccountIdError {
                reason: format!("must be {ACCOUNT_ID_LEN} bytes, got {}", b.len()),
            })?;
        Ok(Self(bytes))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
