//! Host error types.

use std::path::PathBuf;

use permit_registry::AbortCode;
use thiserror::Error;

/// Result type alias for host operations.
pub type Result<T> = std::result::Result<T, HostError>;

/// A call aborted with a stable code. All of its effects were rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("call aborted ({code}): {message}")]
pub struct Abort {
    /// The abort code.
    pub code: AbortCode,
    /// Rendered description of the failure.
    pub message: String,
}

impl Abort {
    /// Create an abort from a code and message.
    #[must_use]
    pub fn new(code: AbortCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<permit_registry::Error> for Abort {
    fn from(err: permit_registry::Error) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<permit_ledger::Error> for Abort {
    fn from(err: permit_ledger::Error) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

// The refused token is dropped with the aborted call's copy of the world.
impl From<permit_ledger::Rejected> for Abort {
    fn from(rejected: permit_ledger::Rejected) -> Self {
        Self::from(permit_ledger::Error::from(rejected))
    }
}

/// Errors surfaced by the host and its CLI.
#[derive(Debug, Error)]
pub enum HostError {
    /// A call aborted.
    #[error(transparent)]
    Aborted(#[from] Abort),

    /// Invalid configuration.
    #[error("configuration error in {path}: {reason}")]
    Config {
        /// The configuration file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// A snapshot on disk could not be read or does not check out.
    #[error("refusing snapshot {path}: {reason}")]
    Snapshot {
        /// The snapshot file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// A committed call could not be written to disk, so it was not applied.
    #[error("failed to save {path}: {source}")]
    Persist {
        /// The snapshot file.
        path: PathBuf,
        /// The underlying failure.
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HostError {
    /// The abort code, if this error is an aborted call.
    #[must_use]
    pub const fn abort_code(&self) -> Option<AbortCode> {
        match self {
            Self::Aborted(abort) => Some(abort.code),
            _ => None,
        }
    }
}
