//! Detached token values.
//!
//! A [`Token`] is value in transit between balances. It cannot be cloned,
//! and its amount is not readable from outside the crate. The ledger creates
//! tokens in `mint` and `withdraw`; they are consumed by `deposit`, `burn` or
//! [`Token::merge`]. Dropping a non-zero token anywhere else leaves its value
//! counted as in flight forever and logs a warning.
//!
//! A token also remembers which copy of its ledger issued it. Cloning or
//! reloading a ledger starts a new generation, and tokens from any other
//! generation are refused.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Rejected, Result};

/// Identifier of one ledger instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerId(Uuid);

impl LedgerId {
    /// Create a new random ledger ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LedgerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ledger-{}", self.0)
    }
}

/// The ledger copy a token was issued by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Origin {
    pub(crate) ledger: LedgerId,
    pub(crate) generation: Uuid,
}

impl Origin {
    pub(crate) fn fresh(ledger: LedgerId) -> Self {
        Self {
            ledger,
            generation: Uuid::new_v4(),
        }
    }
}

/// A detached, linear token value.
#[must_use = "a token must be deposited or burned"]
pub struct Token {
    origin: Origin,
    value: u64,
}

impl Token {
    pub(crate) const fn new(origin: Origin, value: u64) -> Self {
        Self { origin, value }
    }

    /// The ledger that issued this token.
    #[must_use]
    pub const fn ledger(&self) -> LedgerId {
        self.origin.ledger
    }

    /// Splits `amount` off into a new token of the same ledger.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientValue`] if `amount` exceeds this token's
    /// value; the token is left unchanged.
    pub fn split(&mut self, amount: u64) -> Result<Self> {
        let rest = self
            .value
            .checked_sub(amount)
            .ok_or(Error::InsufficientValue { need: amount })?;
        self.value = rest;
        Ok(Self::new(self.origin, amount))
    }

    /// Absorbs `other` into this token.
    ///
    /// # Errors
    ///
    /// Hands `other` back inside [`Rejected`], with [`Error::ForeignToken`] if
    /// the tokens come from different ledgers or [`Error::Overflow`] if the
    /// sum does not fit.
    pub fn merge(&mut self, other: Self) -> std::result::Result<(), Rejected> {
        if let Err(error) = other.check_origin(self.origin) {
            return Err(Rejected::new(error, other));
        }
        let Some(total) = self.value.checked_add(other.value) else {
            return Err(Rejected::new(Error::overflow("merge"), other));
        };
        let _ = other.into_value();
        self.value = total;
        Ok(())
    }

    pub(crate) fn check_origin(&self, expected: Origin) -> Result<()> {
        if self.origin.ledger != expected.ledger {
            Err(Error::ForeignToken {
                expected: expected.ledger,
                actual: self.origin.ledger,
            })
        } else if self.origin.generation != expected.generation {
            Err(Error::StaleToken {
                ledger: self.origin.ledger,
            })
        } else {
            Ok(())
        }
    }

    pub(crate) const fn peek(&self) -> u64 {
        self.value
    }

    /// Destroys the wrapper and returns its value.
    pub(crate) fn into_value(self) -> u64 {
        let value = self.value;
        std::mem::forget(self);
        value
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("ledger", &self.origin.ledger)
            .finish_non_exhaustive()
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        if self.value != 0 {
            warn!(ledger = %self.origin.ledger, "token dropped without deposit or burn");
        }
    }
}
