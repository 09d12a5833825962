//! # permit-registry
//!
//! Capability registry for the permit token ledger.
//!
//! This crate provides:
//!
//! - [`AccountId`]: account identities (base58, 32 bytes)
//! - [`Registry`]: per-account permission records and the owner credential
//! - [`OwnerProof`] / [`CapabilityProof`]: unforgeable proofs handed out by
//!   the registry's borrow operations
//! - [`AbortCode`]: the abort codes shared by every ledger component
//!
//! ## Example
//!
//! ```rust
//! use permit_registry::{AccountId, Registry};
//!
//! # fn example() -> permit_registry::Result<()> {
//! let admin = AccountId::ADMINISTRATOR;
//! let mut registry = Registry::new();
//! registry.initialize(admin)?;
//!
//! let owner = registry.borrow_owner_proof(&admin)?;
//! registry.grant_minter(&owner, &admin)?;
//!
//! let capability = registry.borrow_capability(&admin)?;
//! registry.require_minter(&capability)?;
//! # Ok(())
//! # }
//! # example().expect("example");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account;
pub mod error;
pub mod proof;
pub mod registry;

pub use account::{AccountId, ParseAccountIdError};
pub use error::{AbortCode, Error, InvalidSnapshot, Result};
pub use proof::{CapabilityProof, OwnerCredential, OwnerProof, RegistryId};
pub use registry::{
    PermissionRecord, Registry, RegistryConfig, RegistryEvent, DEFAULT_MINTER_ALLOWANCE,
};
