//! Host configuration.
//!
//! Loaded from a JSON file; every field is optional and falls back to the
//! built-in defaults (hard-coded administrator, allowance of 1000, in-memory
//! state).

use std::path::{Path, PathBuf};

use permit_registry::{AccountId, RegistryConfig, DEFAULT_MINTER_ALLOWANCE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HostError, Result};

/// Default number of call records retained in the audit history.
pub const DEFAULT_HISTORY_LIMIT: usize = 1_000;

/// Configuration of a [`Host`](crate::Host).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Account that receives the owner credential.
    pub administrator: AccountId,
    /// Allowance granted by `grant_minter`.
    pub minter_allowance: u64,
    /// Directory for persisted state. `None` keeps everything in memory.
    pub state_dir: Option<PathBuf>,
    /// Maximum number of call records kept.
    pub history_limit: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            administrator: AccountId::ADMINISTRATOR,
            minter_allowance: DEFAULT_MINTER_ALLOWANCE,
            state_dir: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl HostConfig {
    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| HostError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| HostError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded host configuration");
        Ok(config)
    }

    /// Sets the state directory.
    #[must_use]
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    /// The registry configuration derived from this host configuration.
    #[must_use]
    pub const fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            administrator: self.administrator,
            minter_allowance: self.minter_allowance,
        }
    }
}
