//! The call surface a host exposes to an authenticated caller.
//!
//! A [`Call`] wraps the transactional copy of the world for the duration of
//! one host call. The caller identity is fixed when the call is opened;
//! proofs are still passed explicitly to ledger operations.

use permit_ledger::{Supply, Token, World};
use permit_registry::{AccountId, CapabilityProof, OwnerProof, PermissionRecord};

use crate::error::Abort;

/// Result of a single operation inside a call.
pub type CallResult<T> = std::result::Result<T, Abort>;

/// Operations available to the caller of one host call.
#[derive(Debug)]
pub struct Call<'w> {
    caller: AccountId,
    world: &'w mut World,
}

impl<'w> Call<'w> {
    pub(crate) fn new(caller: AccountId, world: &'w mut World) -> Self {
        Self { caller, world }
    }

    /// The authenticated caller.
    #[must_use]
    pub const fn caller(&self) -> &AccountId {
        &self.caller
    }

    /// Read-only view of the world as modified so far by this call.
    #[must_use]
    pub fn world(&self) -> &World {
        self.world
    }

    // Registry

    /// Creates the caller's permission record.
    pub fn initialize_registry(&mut self) -> CallResult<()> {
        Ok(self.world.initialize_registry(self.caller)?)
    }

    /// Grants minter status to `target` with the caller's owner credential.
    pub fn grant_minter(&mut self, target: &AccountId) -> CallResult<()> {
        let owner = self.borrow_owner_proof()?;
        Ok(self.world.grant_minter(&owner, target)?)
    }

    /// Revokes minter status from `target`.
    pub fn revoke_minter(&mut self, target: &AccountId) -> CallResult<()> {
        let owner = self.borrow_owner_proof()?;
        Ok(self.world.revoke_minter(&owner, target)?)
    }

    /// Blacklists `target`.
    pub fn grant_blacklist(&mut self, target: &AccountId) -> CallResult<()> {
        let owner = self.borrow_owner_proof()?;
        Ok(self.world.grant_blacklist(&owner, target)?)
    }

    /// Removes `target` from the blacklist.
    pub fn revoke_blacklist(&mut self, target: &AccountId) -> CallResult<()> {
        let owner = self.borrow_owner_proof()?;
        Ok(self.world.revoke_blacklist(&owner, target)?)
    }

    /// Proof of the caller's owner credential.
    pub fn borrow_owner_proof(&self) -> CallResult<OwnerProof> {
        Ok(self.world.borrow_owner_proof(&self.caller)?)
    }

    /// Proof of the caller's permission record.
    pub fn borrow_capability(&self) -> CallResult<CapabilityProof> {
        Ok(self.world.borrow_capability(&self.caller)?)
    }

    /// The caller's permission record.
    pub fn capability(&self) -> CallResult<PermissionRecord> {
        let proof = self.borrow_capability()?;
        Ok(*self.world.registry().capability(&proof)?)
    }

    /// Consumes `amount` of the caller's own mint allowance.
    pub fn check_and_decrement_allowance(&mut self, amount: u64) -> CallResult<u64> {
        Ok(self.world.check_and_decrement_allowance(&self.caller, amount)?)
    }

    // Ledger

    /// Creates the caller's zero balance.
    pub fn initialize_ledger(&mut self) -> CallResult<()> {
        Ok(self.world.initialize_ledger(self.caller)?)
    }

    /// Mints a detached token.
    pub fn mint(&mut self, amount: u64, proof: &CapabilityProof) -> CallResult<Token> {
        Ok(self.world.mint(amount, proof)?)
    }

    /// The caller's balance.
    pub fn balance(&self) -> CallResult<u64> {
        Ok(self.world.balance(&self.caller)?)
    }

    /// Deposits a detached token into `payee`'s balance.
    ///
    /// A refused token is dropped along with the aborted call.
    pub fn deposit(
        &mut self,
        payee: &AccountId,
        token: Token,
        proof: &CapabilityProof,
    ) -> CallResult<()> {
        Ok(self.world.deposit(payee, token, proof)?)
    }

    /// Withdraws from the proof holder's balance.
    pub fn withdraw(&mut self, amount: u64, proof: &CapabilityProof) -> CallResult<Token> {
        Ok(self.world.withdraw(amount, proof)?)
    }

    /// Destroys a detached token.
    pub fn burn(&mut self, token: Token, proof: &CapabilityProof) -> CallResult<()> {
        Ok(self.world.burn(token, proof)?)
    }

    /// Current supply totals.
    #[must_use]
    pub fn supply(&self) -> Supply {
        self.world.supply()
    }
}
