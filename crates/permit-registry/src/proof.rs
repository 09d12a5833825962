//! Capability proofs.
//!
//! Proofs are opaque handles naming a registry instance and the account whose
//! state they vouch for. They have private fields and no `Clone`, so the only
//! way to hold one is to receive it from [`Registry::borrow_owner_proof`] or
//! [`Registry::borrow_capability`]. A proof can be passed by reference down a
//! call chain; the registry re-validates it at every use.
//!
//! [`Registry::borrow_owner_proof`]: crate::Registry::borrow_owner_proof
//! [`Registry::borrow_capability`]: crate::Registry::borrow_capability

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::AccountId;

/// Identifier of one registry instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistryId(Uuid);

impl RegistryId {
    /// Create a new random registry ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RegistryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "registry-{}", self.0)
    }
}

/// Marker held in the administrator's slot.
///
/// Created once, when the administrator initializes, and never copied or
/// reissued. Having one in a slot is what makes that account the owner.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct OwnerCredential {
    issued_by: RegistryId,
}

impl OwnerCredential {
    pub(crate) const fn issue(registry: RegistryId) -> Self {
        Self { issued_by: registry }
    }

    /// The registry that issued this credential.
    #[must_use]
    pub const fn issued_by(&self) -> RegistryId {
        self.issued_by
    }
}

/// Read-only proof that the holder owns the registry.
#[derive(Debug)]
pub struct OwnerProof {
    registry: RegistryId,
    holder: AccountId,
}

impl OwnerProof {
    pub(crate) const fn new(registry: RegistryId, holder: AccountId) -> Self {
        Self { registry, holder }
    }

    /// The account whose owner credential this proof refers to.
    #[must_use]
    pub const fn holder(&self) -> &AccountId {
        &self.holder
    }

    /// The registry that issued this proof.
    #[must_use]
    pub const fn registry(&self) -> RegistryId {
        self.registry
    }
}

/// Read-only proof referring to an account's permission record.
#[derive(Debug)]
pub struct CapabilityProof {
    registry: RegistryId,
    holder: AccountId,
}

impl CapabilityProof {
    pub(crate) const fn new(registry: RegistryId, holder: AccountId) -> Self {
        Self { registry, holder }
    }

    /// The account that presented this proof.
    #[must_use]
    pub const fn holder(&self) -> &AccountId {
        &self.holder
    }

    /// The registry that issued this proof.
    #[must_use]
    pub const fn registry(&self) -> RegistryId {
        self.registry
    }
}
