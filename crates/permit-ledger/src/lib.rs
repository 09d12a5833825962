//! # permit-ledger
//!
//! Token ledger for the permit system.
//!
//! This crate provides:
//!
//! - [`World`]: a registry and the ledger bound to it, driven together
//! - [`Ledger`]: per-account balances with mint, deposit, withdraw and burn
//! - [`Token`]: detached, linear token values in transit between balances
//! - [`Supply`]: auditable supply totals
//!
//! Every mutation is gated by a [`permit_registry::CapabilityProof`] checked
//! against the [`permit_registry::Registry`] the ledger is bound to. The
//! ledger never grants capabilities. A refused deposit or burn hands the
//! token back in a [`Rejected`].
//!
//! ## Example
//!
//! ```rust
//! use permit_ledger::World;
//! use permit_registry::{AccountId, RegistryConfig};
//!
//! # fn example() -> permit_ledger::Result<()> {
//! let admin = AccountId::ADMINISTRATOR;
//! let mut world = World::new(RegistryConfig::default());
//! world.initialize_registry(admin)?;
//! let owner = world.borrow_owner_proof(&admin)?;
//! world.grant_minter(&owner, &admin)?;
//! world.initialize_ledger(admin)?;
//!
//! let proof = world.borrow_capability(&admin)?;
//! let token = world.mint(100, &proof)?;
//! world.deposit(&admin, token, &proof)?;
//! assert_eq!(world.balance(&admin)?, 100);
//! # Ok(())
//! # }
//! # example().expect("example");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod ledger;
pub mod token;
pub mod world;

pub use error::{Error, Rejected, Result};
pub use ledger::{Balance, Ledger, LedgerEvent, Supply};
pub use token::{LedgerId, Token};
pub use world::World;
