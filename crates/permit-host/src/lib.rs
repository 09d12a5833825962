//! Transactional host for the permit ledger.
//!
//! This crate provides:
//! - [`Host`]: runs each call atomically against a copy of the [`World`],
//!   committing it only once it is on disk
//! - [`Call`]: the operations an authenticated caller may invoke
//! - [`HostConfig`]: administrator, allowance and state directory settings
//! - [`JsonStore`]: JSON snapshots of the world and the call history
//! - The `permit` command-line interface ([`cli`], [`commands`], [`output`])
//!
//! # Example
//!
//! ```
//! use permit_host::Host;
//! use permit_registry::{AbortCode, AccountId};
//!
//! let mut host = Host::in_memory();
//! let admin = AccountId::ADMINISTRATOR;
//!
//! host.execute(admin, "setup", |call| {
//!     call.initialize_registry()?;
//!     call.initialize_ledger()?;
//!     call.grant_minter(&admin)?;
//!     let proof = call.borrow_capability()?;
//!     let token = call.mint(100, &proof)?;
//!     call.deposit(&admin, token, &proof)
//! })?;
//!
//! // Overdrawing aborts and leaves the balance untouched.
//! let err = host
//!     .execute(admin, "overdraw", |call| {
//!         let proof = call.borrow_capability()?;
//!         let token = call.withdraw(101, &proof)?;
//!         call.deposit(&admin, token, &proof)
//!     })
//!     .unwrap_err();
//! assert_eq!(err.abort_code(), Some(AbortCode::InsufficientBalance));
//! assert_eq!(host.world().balance(&admin), Ok(100));
//! # Ok::<(), permit_host::HostError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod call;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod host;
pub mod output;
pub mod persist;

pub use call::{Call, CallResult};
pub use config::{HostConfig, DEFAULT_HISTORY_LIMIT};
pub use error::{Abort, HostError, Result};
pub use host::{CallRecord, Host, Outcome};
pub use permit_ledger::World;
pub use persist::JsonStore;
