//! Error types for ledger operations.

use permit_registry::{AbortCode, AccountId};
use thiserror::Error;

use crate::token::{LedgerId, Token};

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the token ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The account already has a balance.
    #[error("balance already initialized: {account}")]
    AlreadyInitialized {
        /// The account that called initialize twice.
        account: AccountId,
    },

    /// The account has no balance.
    #[error("balance not initialized: {account}")]
    NotInitialized {
        /// The account lacking a balance.
        account: AccountId,
    },

    /// Withdraw amount exceeds the balance.
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Current balance.
        have: u64,
        /// Requested amount.
        need: u64,
    },

    /// Split amount exceeds the token's value.
    #[error("insufficient token value for split of {need}")]
    InsufficientValue {
        /// Requested amount.
        need: u64,
    },

    /// The token was issued by a different ledger.
    #[error("token issued by {actual}, expected {expected}")]
    ForeignToken {
        /// The ledger handling the token.
        expected: LedgerId,
        /// The ledger that issued it.
        actual: LedgerId,
    },

    /// The token came from another copy of this ledger.
    #[error("token issued by a different copy of {ledger}")]
    StaleToken {
        /// The ledger both copies share.
        ledger: LedgerId,
    },

    /// Checked arithmetic overflowed.
    #[error("arithmetic overflow in {operation}")]
    Overflow {
        /// The operation that overflowed.
        operation: &'static str,
    },

    /// Capability check rejected by the registry.
    #[error(transparent)]
    Registry(#[from] permit_registry::Error),
}

impl Error {
    /// Create an overflow error.
    #[must_use]
    pub const fn overflow(operation: &'static str) -> Self {
        Self::Overflow { operation }
    }

    /// Returns the abort code for this error.
    #[must_use]
    pub const fn code(&self) -> AbortCode {
        match self {
            Self::AlreadyInitialized { .. } => AbortCode::AlreadyInitialized,
            Self::NotInitialized { .. } => AbortCode::NotInitialized,
            Self::InsufficientBalance { .. } => AbortCode::InsufficientBalance,
            Self::InsufficientValue { .. } => AbortCode::InsufficientValue,
            Self::ForeignToken { .. } | Self::StaleToken { .. } => AbortCode::ForeignToken,
            Self::Overflow { .. } => AbortCode::Overflow,
            Self::Registry(err) => err.code(),
        }
    }
}

/// A token refused by `deposit`, `burn` or [`Token::merge`], handed back to
/// the caller together with the reason.
///
/// Converting into [`Error`] drops the token, which leaves its value in
/// flight.
#[derive(Debug, Error)]
#[error("token rejected: {error}")]
pub struct Rejected {
    #[source]
    error: Error,
    token: Token,
}

impl Rejected {
    pub(crate) const fn new(error: Error, token: Token) -> Self {
        Self { error, token }
    }

    /// Why the token was refused.
    #[must_use]
    pub const fn error(&self) -> &Error {
        &self.error
    }

    /// Returns the abort code for the refusal.
    #[must_use]
    pub const fn code(&self) -> AbortCode {
        self.error.code()
    }

    /// Takes the token back.
    pub fn into_token(self) -> Token {
        self.token
    }

    /// Splits into the reason and the token.
    pub fn into_parts(self) -> (Error, Token) {
        (self.error, self.token)
    }
}

impl From<Rejected> for Error {
    fn from(rejected: Rejected) -> Self {
        rejected.error
    }
}
