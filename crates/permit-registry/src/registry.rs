//! The capability registry.
//!
//! Holds one permission record per initialized account plus the owner
//! credential in the administrator's slot. Every mutation other than
//! [`Registry::initialize`] and [`Registry::check_and_decrement_allowance`]
//! requires an [`OwnerProof`]; there is no "is the caller the admin" check
//! anywhere else.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::account::AccountId;
use crate::error::{Error, InvalidSnapshot, Result};
use crate::proof::{CapabilityProof, OwnerCredential, OwnerProof, RegistryId};

/// Allowance a minter receives on every grant.
pub const DEFAULT_MINTER_ALLOWANCE: u64 = 1_000;

/// Registry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// The account that receives the owner credential on initialize.
    pub administrator: AccountId,
    /// Allowance reset value applied by `grant_minter`.
    pub minter_allowance: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            administrator: AccountId::ADMINISTRATOR,
            minter_allowance: DEFAULT_MINTER_ALLOWANCE,
        }
    }
}

/// Permission state of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionRecord {
    is_minter: bool,
    is_blacklisted: bool,
    remaining_mint_allowance: u64,
}

impl PermissionRecord {
    /// Whether the account may mint.
    #[must_use]
    pub const fn is_minter(&self) -> bool {
        self.is_minter
    }

    /// Whether the account is blacklisted.
    #[must_use]
    pub const fn is_blacklisted(&self) -> bool {
        self.is_blacklisted
    }

    /// Whether the account is in good standing.
    #[must_use]
    pub const fn is_not_blacklisted(&self) -> bool {
        !self.is_blacklisted
    }

    /// Amount the account may still mint before a fresh grant.
    #[must_use]
    pub const fn remaining_mint_allowance(&self) -> u64 {
        self.remaining_mint_allowance
    }
}

/// State-changing events recorded by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A permission record was created.
    Initialized {
        /// The new account.
        account: AccountId,
        /// Whether the owner credential was issued with it.
        owner: bool,
    },
    /// Minter status granted and allowance reset.
    MinterGranted {
        /// The account granted.
        target: AccountId,
        /// The allowance it now holds.
        allowance: u64,
    },
    /// Minter status and allowance removed.
    MinterRevoked {
        /// The account revoked.
        target: AccountId,
    },
    /// Account blacklisted.
    BlacklistGranted {
        /// The account blacklisted.
        target: AccountId,
    },
    /// Account removed from the blacklist.
    BlacklistRevoked {
        /// The account cleared.
        target: AccountId,
    },
    /// Allowance consumed by a mint.
    AllowanceSpent {
        /// The minting account.
        account: AccountId,
        /// Amount consumed.
        amount: u64,
        /// Allowance left afterwards.
        remaining: u64,
    },
}

/// Storage slot of one account.
#[derive(Debug, Serialize)]
struct AccountSlot {
    permissions: PermissionRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<OwnerCredential>,
}

// A clone of the registry is a checkpoint of the whole state, so the
// credential moves with its slot rather than to another account.
impl Clone for AccountSlot {
    fn clone(&self) -> Self {
        Self {
            permissions: self.permissions,
            owner: self
                .owner
                .as_ref()
                .map(|credential| OwnerCredential::issue(credential.issued_by())),
        }
    }
}

/// Per-account permission state and the owner credential.
///
/// Deserializing replays the event journal and refuses any snapshot whose
/// slots disagree with it, so an owner credential can only come back in the
/// configured administrator's slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RegistrySnapshot")]
pub struct Registry {
    id: RegistryId,
    config: RegistryConfig,
    slots: BTreeMap<AccountId, AccountSlot>,
    events: Vec<RegistryEvent>,
}

impl Registry {
    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            id: RegistryId::new(),
            config,
            slots: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// This registry's instance ID.
    #[must_use]
    pub const fn id(&self) -> RegistryId {
        self.id
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Events recorded so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// Returns true if the account has a permission record.
    #[must_use]
    pub fn is_initialized(&self, account: &AccountId) -> bool {
        self.slots.contains_key(account)
    }

    /// Reads an account's permission record.
    #[must_use]
    pub fn record(&self, account: &AccountId) -> Option<&PermissionRecord> {
        self.slots.get(account).map(|slot| &slot.permissions)
    }

    /// Reads the owner credential held by an account, if any.
    #[must_use]
    pub fn owner_credential(&self, account: &AccountId) -> Option<&OwnerCredential> {
        self.slots.get(account).and_then(|slot| slot.owner.as_ref())
    }

    /// Iterates over initialized accounts and their records.
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &PermissionRecord)> {
        self.slots.iter().map(|(id, slot)| (id, &slot.permissions))
    }

    /// Creates the caller's permission record.
    ///
    /// If the caller is the configured administrator, the owner credential is
    /// issued into the same slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] if the caller already has a record.
    pub fn initialize(&mut self, caller: AccountId) -> Result<()> {
        if self.slots.contains_key(&caller) {
            return Err(Error::AlreadyInitialized { account: caller });
        }

        let owner = (caller == self.config.administrator).then(|| OwnerCredential::issue(self.id));
        let is_owner = owner.is_some();
        self.slots.insert(
            caller,
            AccountSlot {
                permissions: PermissionRecord::default(),
                owner,
            },
        );
        self.events.push(RegistryEvent::Initialized {
            account: caller,
            owner: is_owner,
        });
        info!(account = %caller, owner = is_owner, "permission record initialized");
        Ok(())
    }

    /// Grants minter status and resets the target's allowance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] if the proof does not validate and
    /// [`Error::NoSuchAccount`] if the target has no record.
    pub fn grant_minter(&mut self, owner: &OwnerProof, target: &AccountId) -> Result<()> {
        let allowance = self.config.minter_allowance;
        self.update_target(owner, target, |record| {
            record.is_minter = true;
            record.remaining_mint_allowance = allowance;
        })?;
        self.events.push(RegistryEvent::MinterGranted {
            target: *target,
            allowance,
        });
        info!(account = %target, allowance, "minter granted");
        Ok(())
    }

    /// Revokes minter status and zeroes the target's allowance.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::grant_minter`].
    pub fn revoke_minter(&mut self, owner: &OwnerProof, target: &AccountId) -> Result<()> {
        self.update_target(owner, target, |record| {
            record.is_minter = false;
            record.remaining_mint_allowance = 0;
        })?;
        self.events.push(RegistryEvent::MinterRevoked { target: *target });
        info!(account = %target, "minter revoked");
        Ok(())
    }

    /// Blacklists the target.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::grant_minter`].
    pub fn grant_blacklist(&mut self, owner: &OwnerProof, target: &AccountId) -> Result<()> {
        self.update_target(owner, target, |record| record.is_blacklisted = true)?;
        self.events.push(RegistryEvent::BlacklistGranted { target: *target });
        info!(account = %target, "account blacklisted");
        Ok(())
    }

    /// Removes the target from the blacklist.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::grant_minter`].
    pub fn revoke_blacklist(&mut self, owner: &OwnerProof, target: &AccountId) -> Result<()> {
        self.update_target(owner, target, |record| record.is_blacklisted = false)?;
        self.events.push(RegistryEvent::BlacklistRevoked { target: *target });
        info!(account = %target, "account removed from blacklist");
        Ok(())
    }

    /// Returns a proof of the caller's owner credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOwner`] if the caller holds no credential.
    pub fn borrow_owner_proof(&self, caller: &AccountId) -> Result<OwnerProof> {
        if self.owner_credential(caller).is_none() {
            return Err(Error::NotOwner { account: *caller });
        }
        debug!(account = %caller, "owner proof issued");
        Ok(OwnerProof::new(self.id, *caller))
    }

    /// Returns a proof referring to the caller's permission record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the caller has no record.
    pub fn borrow_capability(&self, caller: &AccountId) -> Result<CapabilityProof> {
        if !self.slots.contains_key(caller) {
            return Err(Error::NotInitialized { account: *caller });
        }
        debug!(account = %caller, "capability proof issued");
        Ok(CapabilityProof::new(self.id, *caller))
    }

    /// Resolves a capability proof to the live record it refers to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] for a proof issued by another registry
    /// and [`Error::NotInitialized`] if the record is missing.
    pub fn capability(&self, proof: &CapabilityProof) -> Result<&PermissionRecord> {
        if proof.registry() != self.id {
            return Err(Error::unauthorized(format!(
                "capability proof issued by {}",
                proof.registry()
            )));
        }
        self.record(proof.holder())
            .ok_or(Error::NotInitialized {
                account: *proof.holder(),
            })
    }

    /// Returns true if the proof resolves to a minter.
    #[must_use]
    pub fn is_minter(&self, proof: &CapabilityProof) -> bool {
        self.capability(proof).is_ok_and(PermissionRecord::is_minter)
    }

    /// Returns true if the proof resolves to an account not blacklisted.
    #[must_use]
    pub fn is_not_blacklisted(&self, proof: &CapabilityProof) -> bool {
        self.capability(proof)
            .is_ok_and(PermissionRecord::is_not_blacklisted)
    }

    /// Asserts that the proof holder is a minter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotMinter`] otherwise, or a proof validation error.
    pub fn require_minter(&self, proof: &CapabilityProof) -> Result<()> {
        if self.capability(proof)?.is_minter() {
            Ok(())
        } else {
            Err(Error::NotMinter {
                account: *proof.holder(),
            })
        }
    }

    /// Asserts that the proof holder is not blacklisted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IsBlacklisted`] otherwise, or a proof validation error.
    pub fn require_not_blacklisted(&self, proof: &CapabilityProof) -> Result<()> {
        if self.capability(proof)?.is_not_blacklisted() {
            Ok(())
        } else {
            Err(Error::IsBlacklisted {
                account: *proof.holder(),
            })
        }
    }

    /// Consumes `amount` from the caller's own mint allowance.
    ///
    /// Returns the allowance left afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the caller has no record and
    /// [`Error::InsufficientAllowance`] if `amount` exceeds the allowance.
    pub fn check_and_decrement_allowance(&mut self, caller: &AccountId, amount: u64) -> Result<u64> {
        let slot = self
            .slots
            .get_mut(caller)
            .ok_or(Error::NotInitialized { account: *caller })?;
        let record = &mut slot.permissions;
        let remaining = record
            .remaining_mint_allowance
            .checked_sub(amount)
            .ok_or(Error::InsufficientAllowance {
                requested: amount,
                remaining: record.remaining_mint_allowance,
            })?;
        record.remaining_mint_allowance = remaining;

        self.events.push(RegistryEvent::AllowanceSpent {
            account: *caller,
            amount,
            remaining,
        });
        debug!(account = %caller, amount, remaining, "mint allowance consumed");
        Ok(remaining)
    }

    fn validate_owner(&self, proof: &OwnerProof) -> Result<()> {
        if proof.registry() != self.id {
            return Err(Error::unauthorized(format!(
                "owner proof issued by {}",
                proof.registry()
            )));
        }
        match self.owner_credential(proof.holder()) {
            Some(credential) if credential.issued_by() == self.id => Ok(()),
            _ => Err(Error::unauthorized(format!(
                "{} holds no owner credential",
                proof.holder()
            ))),
        }
    }

    fn replay(&mut self, event: RegistryEvent) -> std::result::Result<(), InvalidSnapshot> {
        match &event {
            RegistryEvent::Initialized { account, owner } => {
                if *owner != (*account == self.config.administrator) {
                    return Err(InvalidSnapshot::new(format!(
                        "owner flag of {account} does not match the administrator"
                    )));
                }
                if self.slots.contains_key(account) {
                    return Err(InvalidSnapshot::new(format!(
                        "{account} initialized twice"
                    )));
                }
                let id = self.id;
                self.slots.insert(
                    *account,
                    AccountSlot {
                        permissions: PermissionRecord::default(),
                        owner: owner.then(|| OwnerCredential::issue(id)),
                    },
                );
            }
            RegistryEvent::MinterGranted { target, allowance } => {
                if *allowance != self.config.minter_allowance {
                    return Err(InvalidSnapshot::new(format!(
                        "grant to {target} of {allowance} differs from the configured allowance"
                    )));
                }
                let record = self.replay_record(target)?;
                record.is_minter = true;
                record.remaining_mint_allowance = *allowance;
            }
            RegistryEvent::MinterRevoked { target } => {
                let record = self.replay_record(target)?;
                record.is_minter = false;
                record.remaining_mint_allowance = 0;
            }
            RegistryEvent::BlacklistGranted { target } => {
                self.replay_record(target)?.is_blacklisted = true;
            }
            RegistryEvent::BlacklistRevoked { target } => {
                self.replay_record(target)?.is_blacklisted = false;
            }
            RegistryEvent::AllowanceSpent {
                account,
                amount,
                remaining,
            } => {
                let record = self.replay_record(account)?;
                if record.remaining_mint_allowance.checked_sub(*amount) != Some(*remaining) {
                    return Err(InvalidSnapshot::new(format!(
                        "allowance spent by {account} does not add up"
                    )));
                }
                record.remaining_mint_allowance = *remaining;
            }
        }
        self.events.push(event);
        Ok(())
    }

    fn replay_record(
        &mut self,
        account: &AccountId,
    ) -> std::result::Result<&mut PermissionRecord, InvalidSnapshot> {
        self.slots
            .get_mut(account)
            .map(|slot| &mut slot.permissions)
            .ok_or_else(|| InvalidSnapshot::new(format!("event for unknown account {account}")))
    }

    fn update_target<F>(&mut self, owner: &OwnerProof, target: &AccountId, update: F) -> Result<()>
    where
        F: FnOnce(&mut PermissionRecord),
    {
        self.validate_owner(owner)?;
        let slot = self
            .slots
            .get_mut(target)
            .ok_or(Error::NoSuchAccount { account: *target })?;
        update(&mut slot.permissions);
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct RegistrySnapshot {
    id: RegistryId,
    config: RegistryConfig,
    slots: BTreeMap<AccountId, SlotSnapshot>,
    events: Vec<RegistryEvent>,
}

#[derive(Deserialize)]
struct SlotSnapshot {
    permissions: PermissionRecord,
    #[serde(default)]
    owner: Option<CredentialSnapshot>,
}

#[derive(Deserialize)]
struct CredentialSnapshot {
    issued_by: RegistryId,
}

impl TryFrom<RegistrySnapshot> for Registry {
    type Error = InvalidSnapshot;

    fn try_from(snapshot: RegistrySnapshot) -> std::result::Result<Self, Self::Error> {
        let mut registry = Self::with_config(snapshot.config);
        registry.id = snapshot.id;
        for event in snapshot.events {
            registry.replay(event)?;
        }

        if registry.slots.len() != snapshot.slots.len() {
            return Err(InvalidSnapshot::new(format!(
                "{} slots stored but {} initialized",
                snapshot.slots.len(),
                registry.slots.len()
            )));
        }
        for (account, stored) in &snapshot.slots {
            let replayed = registry
                .slots
                .get(account)
                .ok_or_else(|| InvalidSnapshot::new(format!("{account} was never initialized")))?;
            if replayed.permissions != stored.permissions {
                return Err(InvalidSnapshot::new(format!(
                    "permission record of {account} disagrees with the journal"
                )));
            }
            let credential_matches = match (&replayed.owner, &stored.owner) {
                (None, None) => true,
                (Some(_), Some(credential)) => credential.issued_by == registry.id,
                _ => false,
            };
            if !credential_matches {
                return Err(InvalidSnapshot::new(format!(
                    "owner credential of {account} disagrees with the journal"
                )));
            }
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AbortCode;
    use proptest::prelude::*;
    use test_case::test_case;

    fn admin() -> AccountId {
        AccountId::ADMINISTRATOR
    }

    fn bootstrapped() -> Registry {
        let mut registry = Registry::new();
        registry.initialize(admin()).expect("admin initialize");
        registry
    }

    #[test]
    fn initialize_creates_empty_record() {
        let mut registry = Registry::new();
        let alice = AccountId::derive("alice");
        registry.initialize(alice).expect("initialize");

        let record = registry.record(&alice).expect("record");
        assert!(!record.is_minter());
        assert!(!record.is_blacklisted());
        assert_eq!(record.remaining_mint_allowance(), 0);
        assert!(registry.owner_credential(&alice).is_none());
    }

    #[test]
    fn initialize_issues_credential_only_to_administrator() {
        let registry = bootstrapped();
        let credential = registry.owner_credential(&admin()).expect("credential");
        assert_eq!(credential.issued_by(), registry.id());
        assert_eq!(
            registry.events(),
            &[RegistryEvent::Initialized {
                account: admin(),
                owner: true
            }]
        );
    }

    #[test]
    fn initialize_twice_fails_every_time() {
        let mut registry = bootstrapped();
        for _ in 0..3 {
            let err = registry.initialize(admin()).expect_err("second initialize");
            assert_eq!(err.code(), AbortCode::AlreadyInitialized);
        }
        assert_eq!(registry.accounts().count(), 1);
    }

    #[test]
    fn configured_administrator_receives_credential() {
        let operator = AccountId::derive("operator");
        let mut registry = Registry::with_config(RegistryConfig {
            administrator: operator,
            minter_allowance: 50,
        });
        registry.initialize(operator).expect("initialize");
        registry.initialize(admin()).expect("initialize");

        assert!(!operator.is_default_administrator());
        assert!(registry.borrow_owner_proof(&operator).is_ok());
        assert!(registry.borrow_owner_proof(&admin()).is_err());

        let proof = registry.borrow_owner_proof(&operator).expect("proof");
        registry.grant_minter(&proof, &operator).expect("grant");
        assert_eq!(
            registry.record(&operator).map(PermissionRecord::remaining_mint_allowance),
            Some(50)
        );
    }

    #[test]
    fn grant_minter_resets_allowance() {
        let mut registry = bootstrapped();
        let owner = registry.borrow_owner_proof(&admin()).expect("proof");
        registry.grant_minter(&owner, &admin()).expect("grant");
        registry
            .check_and_decrement_allowance(&admin(), 400)
            .expect("decrement");
        assert_eq!(
            registry.record(&admin()).map(PermissionRecord::remaining_mint_allowance),
            Some(600)
        );

        registry.grant_minter(&owner, &admin()).expect("grant again");
        let record = registry.record(&admin()).expect("record");
        assert!(record.is_minter());
        assert_eq!(record.remaining_mint_allowance(), DEFAULT_MINTER_ALLOWANCE);
    }

    #[test]
    fn revoke_minter_clears_allowance() {
        let mut registry = bootstrapped();
        let owner = registry.borrow_owner_proof(&admin()).expect("proof");
        registry.grant_minter(&owner, &admin()).expect("grant");
        registry.revoke_minter(&owner, &admin()).expect("revoke");

        let record = registry.record(&admin()).expect("record");
        assert!(!record.is_minter());
        assert_eq!(record.remaining_mint_allowance(), 0);
    }

    #[test]
    fn blacklist_toggles() {
        let mut registry = bootstrapped();
        let bob = AccountId::derive("bob");
        registry.initialize(bob).expect("initialize");
        let owner = registry.borrow_owner_proof(&admin()).expect("proof");

        registry.grant_blacklist(&owner, &bob).expect("blacklist");
        let proof = registry.borrow_capability(&bob).expect("capability");
        assert!(!registry.is_not_blacklisted(&proof));
        let err = registry.require_not_blacklisted(&proof).expect_err("blacklisted");
        assert_eq!(err.code(), AbortCode::IsBlacklisted);

        registry.revoke_blacklist(&owner, &bob).expect("clear");
        assert!(registry.is_not_blacklisted(&proof));
        assert!(registry.require_not_blacklisted(&proof).is_ok());
    }

    #[test_case("grant_minter" ; "grant minter")]
    #[test_case("revoke_minter" ; "revoke minter")]
    #[test_case("grant_blacklist" ; "grant blacklist")]
    #[test_case("revoke_blacklist" ; "revoke blacklist")]
    fn owner_operations_require_existing_target(operation: &str) {
        let mut registry = bootstrapped();
        let owner = registry.borrow_owner_proof(&admin()).expect("proof");
        let ghost = AccountId::derive("ghost");
        let result = match operation {
            "grant_minter" => registry.grant_minter(&owner, &ghost),
            "revoke_minter" => registry.revoke_minter(&owner, &ghost),
            "grant_blacklist" => registry.grant_blacklist(&owner, &ghost),
            _ => registry.revoke_blacklist(&owner, &ghost),
        };
        assert_eq!(result.map_err(|e| e.code()), Err(AbortCode::NoSuchAccount));
    }

    #[test]
    fn non_owner_cannot_borrow_owner_proof() {
        let mut registry = bootstrapped();
        let mallory = AccountId::derive("mallory");
        registry.initialize(mallory).expect("initialize");

        let err = registry.borrow_owner_proof(&mallory).expect_err("not owner");
        assert_eq!(err, Error::NotOwner { account: mallory });

        let err = registry
            .borrow_owner_proof(&AccountId::derive("stranger"))
            .expect_err("not owner");
        assert_eq!(err.code(), AbortCode::NotOwner);
    }

    #[test]
    fn owner_proof_from_other_registry_is_unauthorized() {
        let mut registry = bootstrapped();
        let other = bootstrapped();
        let foreign = other.borrow_owner_proof(&admin()).expect("proof");

        let err = registry
            .grant_minter(&foreign, &admin())
            .expect_err("foreign proof");
        assert_eq!(err.code(), AbortCode::Unauthorized);
        assert!(!registry.record(&admin()).is_some_and(PermissionRecord::is_minter));
    }

    #[test]
    fn capability_proof_from_other_registry_is_unauthorized() {
        let registry = bootstrapped();
        let other = bootstrapped();
        let foreign = other.borrow_capability(&admin()).expect("proof");

        assert_eq!(
            registry.capability(&foreign).map_err(|e| e.code()),
            Err(AbortCode::Unauthorized)
        );
        assert!(!registry.is_minter(&foreign));
        assert!(!registry.is_not_blacklisted(&foreign));
    }

    #[test]
    fn borrow_capability_requires_record() {
        let registry = bootstrapped();
        let err = registry
            .borrow_capability(&AccountId::derive("nobody"))
            .expect_err("no record");
        assert_eq!(err.code(), AbortCode::NotInitialized);
    }

    #[test]
    fn proof_tracks_live_record() {
        let mut registry = bootstrapped();
        let owner = registry.borrow_owner_proof(&admin()).expect("owner");
        let proof = registry.borrow_capability(&admin()).expect("capability");
        assert!(!registry.is_minter(&proof));
        assert_eq!(
            registry.require_minter(&proof).map_err(|e| e.code()),
            Err(AbortCode::NotMinter)
        );

        registry.grant_minter(&owner, &admin()).expect("grant");
        assert!(registry.is_minter(&proof));
        assert!(registry.require_minter(&proof).is_ok());
    }

    #[test]
    fn decrement_rejects_overdraw_without_mutation() {
        let mut registry = bootstrapped();
        let owner = registry.borrow_owner_proof(&admin()).expect("owner");
        registry.grant_minter(&owner, &admin()).expect("grant");

        let err = registry
            .check_and_decrement_allowance(&admin(), 1_001)
            .expect_err("overdraw");
        assert_eq!(
            err,
            Error::InsufficientAllowance {
                requested: 1_001,
                remaining: 1_000
            }
        );
        assert_eq!(
            registry.check_and_decrement_allowance(&admin(), 1_000),
            Ok(0)
        );
    }

    #[test]
    fn decrement_requires_record() {
        let mut registry = bootstrapped();
        let err = registry
            .check_and_decrement_allowance(&AccountId::derive("nobody"), 1)
            .expect_err("no record");
        assert_eq!(err.code(), AbortCode::NotInitialized);
    }

    #[test]
    fn clone_keeps_credential_in_admin_slot() {
        let registry = bootstrapped();
        let checkpoint = registry.clone();
        assert_eq!(checkpoint.id(), registry.id());
        assert!(checkpoint.owner_credential(&admin()).is_some());
        assert!(checkpoint.borrow_owner_proof(&admin()).is_ok());
    }

    #[test]
    fn registry_serialization_roundtrip() {
        let mut registry = bootstrapped();
        let owner = registry.borrow_owner_proof(&admin()).expect("owner");
        registry.grant_minter(&owner, &admin()).expect("grant");

        let json = serde_json::to_string(&registry).expect("serialize");
        let restored: Registry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored.id(), registry.id());
        assert_eq!(restored.record(&admin()), registry.record(&admin()));
        assert!(restored.owner_credential(&admin()).is_some());
        assert_eq!(restored.events(), registry.events());

        // Proofs issued before the snapshot still resolve against the restore.
        let mut restored = restored;
        assert!(restored.revoke_minter(&owner, &admin()).is_ok());
    }

    fn tampered(registry: &Registry, edit: impl FnOnce(&mut serde_json::Value)) -> String {
        let mut value = serde_json::to_value(registry).expect("serialize");
        edit(&mut value);
        serde_json::from_value::<Registry>(value)
            .expect_err("tampered snapshot must be refused")
            .to_string()
    }

    fn with_mallory() -> (Registry, AccountId) {
        let mut registry = bootstrapped();
        let mallory = AccountId::derive("mallory");
        registry.initialize(mallory).expect("initialize");
        (registry, mallory)
    }

    #[test]
    fn snapshot_with_edited_record_is_refused() {
        let (registry, mallory) = with_mallory();
        let err = tampered(&registry, |value| {
            let record = &mut value["slots"][mallory.to_string()]["permissions"];
            record["is_minter"] = true.into();
            record["remaining_mint_allowance"] = 5_000_000.into();
        });
        assert!(err.contains("permission record"), "{err}");
    }

    #[test]
    fn snapshot_with_credential_outside_administrator_is_refused() {
        let (registry, mallory) = with_mallory();
        let issued_by = serde_json::to_value(registry.id()).expect("id");
        let err = tampered(&registry, |value| {
            value["slots"][mallory.to_string()]["owner"] =
                serde_json::json!({ "issued_by": issued_by });
        });
        assert!(err.contains("owner credential"), "{err}");
    }

    #[test]
    fn snapshot_with_moved_credential_is_refused() {
        let (registry, mallory) = with_mallory();
        let err = tampered(&registry, |value| {
            let slots = &mut value["slots"];
            let credential = slots[admin().to_string()]["owner"].take();
            slots[mallory.to_string()]["owner"] = credential;
        });
        assert!(err.contains("owner credential"), "{err}");
    }

    #[test]
    fn snapshot_with_foreign_credential_is_refused() {
        let registry = bootstrapped();
        let other = serde_json::to_value(RegistryId::new()).expect("id");
        let err = tampered(&registry, |value| {
            value["slots"][admin().to_string()]["owner"]["issued_by"] = other;
        });
        assert!(err.contains("owner credential"), "{err}");
    }

    #[test]
    fn snapshot_with_forged_journal_is_refused() {
        let (registry, mallory) = with_mallory();
        let err = tampered(&registry, |value| {
            let events = value["events"].as_array_mut().expect("events");
            events.push(serde_json::json!({
                "type": "initialized",
                "account": mallory.to_string(),
                "owner": true,
            }));
        });
        assert!(err.contains("owner flag"), "{err}");

        let err = tampered(&registry, |value| {
            let events = value["events"].as_array_mut().expect("events");
            events.push(serde_json::json!({
                "type": "minter_granted",
                "target": mallory.to_string(),
                "allowance": 5_000_000,
            }));
        });
        assert!(err.contains("configured allowance"), "{err}");
    }

    #[test]
    fn snapshot_from_other_config_is_refused() {
        let (registry, mallory) = with_mallory();
        let err = tampered(&registry, |value| {
            value["config"]["administrator"] = mallory.to_string().into();
        });
        assert!(err.contains("owner flag"), "{err}");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Grant,
        Revoke,
        Spend(u64),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Grant),
            Just(Op::Revoke),
            (0u64..1_500).prop_map(Op::Spend),
        ]
    }

    proptest! {
        #[test]
        fn prop_allowance_only_increases_on_grant(ops in proptest::collection::vec(arb_op(), 0..40)) {
            let mut registry = bootstrapped();
            let owner = registry.borrow_owner_proof(&admin()).expect("owner");

            for op in ops {
                let before = registry.record(&admin()).map_or(0, PermissionRecord::remaining_mint_allowance);
                match op {
                    Op::Grant => {
                        registry.grant_minter(&owner, &admin()).expect("grant");
                        let after = registry.record(&admin()).map_or(0, PermissionRecord::remaining_mint_allowance);
                        prop_assert_eq!(after, DEFAULT_MINTER_ALLOWANCE);
                    }
                    Op::Revoke => {
                        registry.revoke_minter(&owner, &admin()).expect("revoke");
                        let after = registry.record(&admin()).map_or(0, PermissionRecord::remaining_mint_allowance);
                        prop_assert_eq!(after, 0);
                    }
                    Op::Spend(amount) => {
                        let result = registry.check_and_decrement_allowance(&admin(), amount);
                        let after = registry.record(&admin()).map_or(0, PermissionRecord::remaining_mint_allowance);
                        prop_assert!(after <= before);
                        if amount > before {
                            prop_assert!(result.is_err());
                            prop_assert_eq!(after, before);
                        } else {
                            prop_assert_eq!(after, before - amount);
                        }
                    }
                }
            }
        }

        #[test]
        fn prop_non_owner_never_grants(label in "[a-z]{1,12}") {
            let mut registry = bootstrapped();
            let caller = AccountId::derive(&label);
            let _ = registry.initialize(caller);
            let result = registry.borrow_owner_proof(&caller);
            prop_assert_eq!(result.map(|_| ()).map_err(|e| e.code()), Err(AbortCode::NotOwner));
        }
    }
}
