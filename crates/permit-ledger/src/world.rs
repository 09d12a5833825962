//! One registry and the ledger bound to it, owned together.
//!
//! [`World`] is the public way to drive the ledger. It never lends out
//! `&mut Registry`, so every ledger operation runs against the registry the
//! ledger was created with. A clone is a separate copy: tokens issued by one
//! copy are refused by the other.

use std::collections::BTreeMap;

use permit_registry::{
    AccountId, CapabilityProof, InvalidSnapshot, OwnerProof, Registry, RegistryConfig,
    RegistryEvent,
};
use serde::{Deserialize, Serialize};

use crate::error::{Rejected, Result};
use crate::ledger::{Ledger, LedgerEvent, Supply};
use crate::token::Token;

/// Registry plus ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "WorldSnapshot")]
pub struct World {
    registry: Registry,
    ledger: Ledger,
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        let registry = Registry::with_config(config);
        let ledger = Ledger::new(&registry);
        Self { registry, ledger }
    }

    /// The capability registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The token ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// See [`Registry::initialize`].
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInitialized` if the caller has a permission record.
    pub fn initialize_registry(&mut self, caller: AccountId) -> permit_registry::Result<()> {
        self.registry.initialize(caller)
    }

    /// See [`Registry::borrow_owner_proof`].
    ///
    /// # Errors
    ///
    /// Returns `NotOwner` if the caller holds no owner credential.
    pub fn borrow_owner_proof(&self, caller: &AccountId) -> permit_registry::Result<OwnerProof> {
        self.registry.borrow_owner_proof(caller)
    }

    /// See [`Registry::borrow_capability`].
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if the caller has no permission record.
    pub fn borrow_capability(
        &self,
        caller: &AccountId,
    ) -> permit_registry::Result<CapabilityProof> {
        self.registry.borrow_capability(caller)
    }

    /// See [`Registry::grant_minter`].
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` or `NoSuchAccount`.
    pub fn grant_minter(
        &mut self,
        owner: &OwnerProof,
        target: &AccountId,
    ) -> permit_registry::Result<()> {
        self.registry.grant_minter(owner, target)
    }

    /// See [`Registry::revoke_minter`].
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` or `NoSuchAccount`.
    pub fn revoke_minter(
        &mut self,
        owner: &OwnerProof,
        target: &AccountId,
    ) -> permit_registry::Result<()> {
        self.registry.revoke_minter(owner, target)
    }

    /// See [`Registry::grant_blacklist`].
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` or `NoSuchAccount`.
    pub fn grant_blacklist(
        &mut self,
        owner: &OwnerProof,
        target: &AccountId,
    ) -> permit_registry::Result<()> {
        self.registry.grant_blacklist(owner, target)
    }

    /// See [`Registry::revoke_blacklist`].
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` or `NoSuchAccount`.
    pub fn revoke_blacklist(
        &mut self,
        owner: &OwnerProof,
        target: &AccountId,
    ) -> permit_registry::Result<()> {
        self.registry.revoke_blacklist(owner, target)
    }

    /// See [`Registry::check_and_decrement_allowance`].
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` or `InsufficientAllowance`.
    pub fn check_and_decrement_allowance(
        &mut self,
        caller: &AccountId,
        amount: u64,
    ) -> permit_registry::Result<u64> {
        self.registry.check_and_decrement_allowance(caller, amount)
    }

    /// Creates the caller's zero balance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`](crate::Error::AlreadyInitialized).
    pub fn initialize_ledger(&mut self, caller: AccountId) -> Result<()> {
        self.ledger.initialize(caller)
    }

    /// Reads the caller's balance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`](crate::Error::NotInitialized).
    pub fn balance(&self, caller: &AccountId) -> Result<u64> {
        self.ledger.balance(caller)
    }

    /// Mints a detached token against the proof holder's allowance.
    ///
    /// # Errors
    ///
    /// Returns `NotMinter`, `InsufficientAllowance`, a proof validation
    /// error, or an overflow.
    pub fn mint(&mut self, amount: u64, proof: &CapabilityProof) -> Result<Token> {
        self.ledger.mint(&mut self.registry, amount, proof)
    }

    /// Consumes `token` and credits its value to `payee`.
    ///
    /// # Errors
    ///
    /// Hands the token back inside [`Rejected`] when the deposit is refused.
    pub fn deposit(
        &mut self,
        payee: &AccountId,
        token: Token,
        proof: &CapabilityProof,
    ) -> std::result::Result<(), Rejected> {
        self.ledger.deposit(&self.registry, payee, token, proof)
    }

    /// Debits `amount` from the proof holder and returns it as a token.
    ///
    /// # Errors
    ///
    /// Returns `IsBlacklisted`, `NotInitialized`, `InsufficientBalance` or an
    /// overflow.
    pub fn withdraw(&mut self, amount: u64, proof: &CapabilityProof) -> Result<Token> {
        self.ledger.withdraw(&self.registry, amount, proof)
    }

    /// Destroys a detached token.
    ///
    /// # Errors
    ///
    /// Hands the token back inside [`Rejected`] when the burn is refused.
    pub fn burn(
        &mut self,
        token: Token,
        proof: &CapabilityProof,
    ) -> std::result::Result<(), Rejected> {
        self.ledger.burn(&self.registry, token, proof)
    }

    /// Current supply totals.
    #[must_use]
    pub const fn supply(&self) -> Supply {
        self.ledger.supply()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

#[derive(Deserialize)]
struct WorldSnapshot {
    registry: Registry,
    ledger: Ledger,
}

impl TryFrom<WorldSnapshot> for World {
    type Error = InvalidSnapshot;

    fn try_from(snapshot: WorldSnapshot) -> std::result::Result<Self, Self::Error> {
        let WorldSnapshot { registry, ledger } = snapshot;
        if ledger.registry_id() != registry.id() {
            return Err(InvalidSnapshot::new(format!(
                "{} is bound to {}, not {}",
                ledger.id(),
                ledger.registry_id(),
                registry.id()
            )));
        }

        // Every mint draws down the minter's allowance by the same amount.
        let mut spent: BTreeMap<AccountId, u128> = BTreeMap::new();
        for event in registry.events() {
            if let RegistryEvent::AllowanceSpent { account, amount, .. } = event {
                *spent.entry(*account).or_default() += u128::from(*amount);
            }
        }
        let mut minted: BTreeMap<AccountId, u128> = BTreeMap::new();
        for event in ledger.events() {
            if let LedgerEvent::Minted { minter, amount } = event {
                *minted.entry(*minter).or_default() += u128::from(*amount);
            }
        }
        for (minter, total) in &minted {
            if *total > spent.get(minter).copied().unwrap_or_default() {
                return Err(InvalidSnapshot::new(format!(
                    "{minter} minted more than its allowance paid for"
                )));
            }
        }

        Ok(Self { registry, ledger })
    }
}
