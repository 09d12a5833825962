//! Error types and abort codes for registry operations.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::AccountId;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable abort code surfaced to whatever invoked a failed call.
///
/// Codes are shared by every component of the ledger so a host can report a
/// single, deterministic code per aborted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortCode {
    /// Initialize called twice for one account.
    AlreadyInitialized,
    /// The acting account lacks the required record.
    NotInitialized,
    /// A grant or revoke target lacks a permission record.
    NoSuchAccount,
    /// The caller holds no owner credential.
    NotOwner,
    /// A presented proof does not validate.
    Unauthorized,
    /// Minting or burning without minter status.
    NotMinter,
    /// Mint amount exceeds the remaining allowance.
    InsufficientAllowance,
    /// The presenting account is blacklisted.
    IsBlacklisted,
    /// Withdraw amount exceeds the current balance.
    InsufficientBalance,
    /// Split amount exceeds the token's value.
    InsufficientValue,
    /// Token was issued by another ledger instance.
    ForeignToken,
    /// Checked arithmetic overflowed.
    Overflow,
}

impl AbortCode {
    /// Returns all abort codes in numeric order.
    #[must_use]
    pub fn all() -> &'static [AbortCode] {
        &[
            Self::AlreadyInitialized,
            Self::NotInitialized,
            Self::NoSuchAccount,
            Self::NotOwner,
            Self::Unauthorized,
            Self::NotMinter,
            Self::InsufficientAllowance,
            Self::IsBlacklisted,
            Self::InsufficientBalance,
            Self::InsufficientValue,
            Self::ForeignToken,
            Self::Overflow,
        ]
    }

    /// Numeric form of the code. Never zero.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::AlreadyInitialized => 1,
            Self::NotInitialized => 2,
            Self::NoSuchAccount => 3,
            Self::NotOwner => 4,
            Self::Unauthorized => 5,
            Self::NotMinter => 6,
            Self::InsufficientAllowance => 7,
            Self::IsBlacklisted => 8,
            Self::InsufficientBalance => 9,
            Self::InsufficientValue => 10,
            Self::ForeignToken => 11,
            Self::Overflow => 12,
        }
    }
}

impl fmt::Display for AbortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AlreadyInitialized => "already_initialized",
            Self::NotInitialized => "not_initialized",
            Self::NoSuchAccount => "no_such_account",
            Self::NotOwner => "not_owner",
            Self::Unauthorized => "unauthorized",
            Self::NotMinter => "not_minter",
            Self::InsufficientAllowance => "insufficient_allowance",
            Self::IsBlacklisted => "is_blacklisted",
            Self::InsufficientBalance => "insufficient_balance",
            Self::InsufficientValue => "insufficient_value",
            Self::ForeignToken => "foreign_token",
            Self::Overflow => "overflow",
        };
        write!(f, "{name}")
    }
}

/// Errors that can occur in the capability registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The account already has a permission record.
    #[error("account already initialized: {account}")]
    AlreadyInitialized {
        /// The account that called initialize twice.
        account: AccountId,
    },

    /// The acting account has no permission record.
    #[error("account not initialized: {account}")]
    NotInitialized {
        /// The account lacking a record.
        account: AccountId,
    },

    /// A grant or revoke targeted an account without a record.
    #[error("no such account: {account}")]
    NoSuchAccount {
        /// The missing target.
        account: AccountId,
    },

    /// The caller holds no owner credential.
    #[error("account is not the owner: {account}")]
    NotOwner {
        /// The caller.
        account: AccountId,
    },

    /// A presented proof failed validation.
    #[error("unauthorized: {reason}")]
    Unauthorized {
        /// Why the proof was rejected.
        reason: String,
    },

    /// The proof holder lacks minter status.
    #[error("account is not a minter: {account}")]
    NotMinter {
        /// The proof holder.
        account: AccountId,
    },

    /// The mint amount exceeds the remaining allowance.
    #[error("insufficient mint allowance: requested {requested}, remaining {remaining}")]
    InsufficientAllowance {
        /// Amount requested.
        requested: u64,
        /// Allowance left.
        remaining: u64,
    },

    /// The proof holder is blacklisted.
    #[error("account is blacklisted: {account}")]
    IsBlacklisted {
        /// The proof holder.
        account: AccountId,
    },
}

impl Error {
    /// Create an unauthorized error.
    #[must_use]
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Returns the abort code for this error.
    #[must_use]
    pub const fn code(&self) -> AbortCode {
        match self {
            Self::AlreadyInitialized { .. } => AbortCode::AlreadyInitialized,
            Self::NotInitialized { .. } => AbortCode::NotInitialized,
            Self::NoSuchAccount { .. } => AbortCode::NoSuchAccount,
            Self::NotOwner { .. } => AbortCode::NotOwner,
            Self::Unauthorized { .. } => AbortCode::Unauthorized,
            Self::NotMinter { .. } => AbortCode::NotMinter,
            Self::InsufficientAllowance { .. } => AbortCode::InsufficientAllowance,
            Self::IsBlacklisted { .. } => AbortCode::IsBlacklisted,
        }
    }
}

/// A serialized registry or ledger that disagrees with its own journal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid snapshot: {reason}")]
pub struct InvalidSnapshot {
    reason: String,
}

impl InvalidSnapshot {
    /// Create a snapshot error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Why the snapshot was refused.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}
