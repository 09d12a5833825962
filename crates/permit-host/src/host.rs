//! Atomic call execution.
//!
//! Every call runs against a copy of the world. The copy replaces the live
//! state only if the call returns `Ok` and, for a host with a state
//! directory, only once the copy is safely on disk. Anything else leaves
//! nothing behind except its entry in the call history.

use chrono::{DateTime, Utc};
use permit_ledger::World;
use permit_registry::{AbortCode, AccountId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::call::{Call, CallResult};
use crate::config::HostConfig;
use crate::error::{HostError, Result};
use crate::persist::JsonStore;

/// How a call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// All effects were committed.
    Committed,
    /// All effects were rolled back.
    Aborted {
        /// The abort code.
        code: AbortCode,
        /// Rendered failure.
        message: String,
    },
    /// The call succeeded but its state could not be saved, so it was
    /// rolled back.
    Failed {
        /// Rendered failure.
        message: String,
    },
}

/// One entry of the call history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// When the call finished.
    pub at: DateTime<Utc>,
    /// The authenticated caller.
    pub caller: AccountId,
    /// What the call did.
    pub label: String,
    /// How it ended.
    pub outcome: Outcome,
}

/// Execution environment for ledger calls.
#[derive(Debug)]
pub struct Host {
    config: HostConfig,
    world: World,
    history: Vec<CallRecord>,
    world_store: Option<JsonStore>,
    history_store: Option<JsonStore>,
}

impl Host {
    /// Opens a host, loading persisted state from the configured state
    /// directory when there is one.
    ///
    /// A fresh world is created only when no snapshot exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Snapshot`] if the world or history snapshot
    /// exists but cannot be read, parsed or validated. Nothing on disk is
    /// touched in that case.
    pub fn open(config: HostConfig) -> Result<Self> {
        let world_store = config.state_dir.as_deref().map(|dir| JsonStore::new(dir, "world"));
        let history_store = config.state_dir.as_deref().map(|dir| JsonStore::new(dir, "calls"));

        let world = match &world_store {
            Some(store) => store.load::<World>()?,
            None => None,
        };
        let world = world.unwrap_or_else(|| World::new(config.registry_config()));
        if *world.registry().config() != config.registry_config() {
            warn!("persisted registry configuration differs from host configuration; keeping persisted");
        }
        let history: Vec<CallRecord> = match &history_store {
            Some(store) => store.load()?.unwrap_or_default(),
            None => Vec::new(),
        };
        debug!(
            accounts = world.registry().accounts().count(),
            calls = history.len(),
            "host state loaded"
        );

        Ok(Self {
            config,
            world,
            history,
            world_store,
            history_store,
        })
    }

    /// Creates an in-memory host with the default configuration.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            config: HostConfig::default(),
            world: World::default(),
            history: Vec::new(),
            world_store: None,
            history_store: None,
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &HostConfig {
        &self.config
    }

    /// The committed world state.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Call history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[CallRecord] {
        &self.history
    }

    /// Runs `f` as one atomic call on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Aborted`] with the first abort raised by `f`, or
    /// [`HostError::Persist`] if the new world could not be saved. None of
    /// the call's effects are kept in either case.
    pub fn execute<T, F>(&mut self, caller: AccountId, label: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Call<'_>) -> CallResult<T>,
    {
        debug!(caller = %caller, label, "call started");
        let mut draft = self.world.clone();
        let result = {
            let mut call = Call::new(caller, &mut draft);
            f(&mut call)
        };

        match result {
            Ok(value) => {
                if let Err(err) = self.save_world(&draft) {
                    error!(caller = %caller, label, error = %err, "call rolled back");
                    self.record(
                        caller,
                        label,
                        Outcome::Failed {
                            message: err.to_string(),
                        },
                    );
                    return Err(err);
                }
                self.world = draft;
                info!(caller = %caller, label, "call committed");
                self.record(caller, label, Outcome::Committed);
                Ok(value)
            }
            Err(abort) => {
                warn!(caller = %caller, label, code = %abort.code, error = %abort.message, "call aborted");
                let outcome = Outcome::Aborted {
                    code: abort.code,
                    message: abort.message.clone(),
                };
                self.record(caller, label, outcome);
                Err(abort.into())
            }
        }
    }

    fn save_world(&self, world: &World) -> Result<()> {
        let Some(store) = &self.world_store else {
            return Ok(());
        };
        store.save(world).map_err(|source| HostError::Persist {
            path: store.path().to_path_buf(),
            source,
        })
    }

    fn record(&mut self, caller: AccountId, label: &str, outcome: Outcome) {
        self.history.push(CallRecord {
            at: Utc::now(),
            caller,
            label: label.to_string(),
            outcome,
        });
        if self.history.len() > self.config.history_limit {
            let excess = self.history.len() - self.config.history_limit;
            self.history.drain(..excess);
        }

        // The history is an audit trail; losing a write does not undo a call.
        if let Some(store) = &self.history_store {
            if let Err(e) = store.save(&self.history) {
                warn!(error = %e, "failed to snapshot call history");
            }
        }
    }
}
