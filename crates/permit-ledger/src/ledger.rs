//! The token ledger.
//!
//! Balances live here; permissions do not. Every mutating operation takes a
//! [`CapabilityProof`] and asks the bound [`Registry`] to vouch for it before
//! any balance or supply counter changes. All arithmetic is checked up front,
//! so a failing call leaves the ledger untouched.
//!
//! The mutating operations are crate-private. Outside this crate they are
//! reached through [`World`](crate::World), which owns the one registry the
//! ledger is bound to.

use std::collections::BTreeMap;

use permit_registry::{AccountId, CapabilityProof, InvalidSnapshot, Registry, RegistryId};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Rejected, Result};
use crate::token::{LedgerId, Origin, Token};

/// Balance record of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    amount: u64,
}

impl Balance {
    /// The balance amount.
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.amount
    }
}

/// Supply totals.
///
/// `sum(balances) + in_flight == minted - burned` holds after every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Supply {
    /// Total ever minted.
    pub minted: u64,
    /// Total ever burned.
    pub burned: u64,
    /// Value held in detached tokens.
    pub in_flight: u64,
}

impl Supply {
    /// Minted minus burned.
    #[must_use]
    pub const fn circulating(&self) -> u64 {
        self.minted.saturating_sub(self.burned)
    }
}

/// State-changing events recorded by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A zero balance was created.
    Initialized {
        /// The new account.
        account: AccountId,
    },
    /// A detached token was minted.
    Minted {
        /// The minting account.
        minter: AccountId,
        /// Amount minted.
        amount: u64,
    },
    /// A token was deposited.
    Deposited {
        /// The account that presented the proof.
        presenter: AccountId,
        /// The account credited.
        payee: AccountId,
        /// Amount credited.
        amount: u64,
    },
    /// Balance converted into a detached token.
    Withdrawn {
        /// The account debited.
        account: AccountId,
        /// Amount debited.
        amount: u64,
    },
    /// A detached token was destroyed.
    Burned {
        /// The minting account that burned it.
        minter: AccountId,
        /// Amount destroyed.
        amount: u64,
    },
}

/// Per-account balances of a single fungible token.
///
/// A clone or a deserialized copy is a new generation of the same ledger:
/// it refuses tokens issued by any other copy. Deserializing replays the
/// event journal and refuses balances or totals that disagree with it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(try_from = "LedgerSnapshot")]
pub struct Ledger {
    id: LedgerId,
    registry: RegistryId,
    balances: BTreeMap<AccountId, Balance>,
    supply: Supply,
    events: Vec<LedgerEvent>,
    #[serde(skip)]
    generation: Uuid,
}

impl Ledger {
    pub(crate) fn new(registry: &Registry) -> Self {
        Self::empty(LedgerId::new(), registry.id())
    }

    fn empty(id: LedgerId, registry: RegistryId) -> Self {
        let origin = Origin::fresh(id);
        Self {
            id,
            registry,
            balances: BTreeMap::new(),
            supply: Supply::default(),
            events: Vec::new(),
            generation: origin.generation,
        }
    }

    const fn origin(&self) -> Origin {
        Origin {
            ledger: self.id,
            generation: self.generation,
        }
    }

    /// This ledger's instance ID.
    #[must_use]
    pub const fn id(&self) -> LedgerId {
        self.id
    }

    /// The registry this ledger trusts.
    #[must_use]
    pub const fn registry_id(&self) -> RegistryId {
        self.registry
    }

    /// Current supply totals.
    #[must_use]
    pub const fn supply(&self) -> Supply {
        self.supply
    }

    /// Events recorded so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Iterates over accounts and their balances.
    pub fn balances(&self) -> impl Iterator<Item = (&AccountId, &Balance)> {
        self.balances.iter()
    }

    /// Sum of all balances.
    #[must_use]
    pub fn total_balance(&self) -> u128 {
        self.balances.values().map(|b| u128::from(b.amount)).sum()
    }

    /// Creates a zero balance for the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] if the caller has a balance.
    pub(crate) fn initialize(&mut self, caller: AccountId) -> Result<()> {
        if self.balances.contains_key(&caller) {
            return Err(Error::AlreadyInitialized { account: caller });
        }
        self.balances.insert(caller, Balance::default());
        self.events.push(LedgerEvent::Initialized { account: caller });
        info!(account = %caller, "balance initialized");
        Ok(())
    }

    /// Reads the caller's balance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the caller has no balance.
    pub fn balance(&self, caller: &AccountId) -> Result<u64> {
        self.balances
            .get(caller)
            .map(Balance::amount)
            .ok_or(Error::NotInitialized { account: *caller })
    }

    /// Mints a detached token against the proof holder's allowance.
    ///
    /// # Errors
    ///
    /// Returns `NotMinter` or `InsufficientAllowance` from the registry, or
    /// [`Error::Overflow`] if the supply counters would overflow.
    pub(crate) fn mint(
        &mut self,
        registry: &mut Registry,
        amount: u64,
        proof: &CapabilityProof,
    ) -> Result<Token> {
        self.check_registry(registry)?;
        registry.require_minter(proof)?;
        let minted = self
            .supply
            .minted
            .checked_add(amount)
            .ok_or(Error::overflow("mint"))?;
        let in_flight = self
            .supply
            .in_flight
            .checked_add(amount)
            .ok_or(Error::overflow("mint"))?;

        let minter = *proof.holder();
        registry.check_and_decrement_allowance(&minter, amount)?;

        self.supply.minted = minted;
        self.supply.in_flight = in_flight;
        self.events.push(LedgerEvent::Minted { minter, amount });
        info!(account = %minter, amount, "tokens minted");
        Ok(Token::new(self.origin(), amount))
    }

    /// Consumes `token` and credits its value to `payee`.
    ///
    /// The blacklist check applies to the proof's holder, i.e. the acting
    /// account, not to the payee.
    ///
    /// # Errors
    ///
    /// Hands the token back inside [`Rejected`] with `IsBlacklisted` from the
    /// registry, [`Error::ForeignToken`], [`Error::StaleToken`],
    /// [`Error::NotInitialized`] if the payee has no balance, or
    /// [`Error::Overflow`].
    pub(crate) fn deposit(
        &mut self,
        registry: &Registry,
        payee: &AccountId,
        token: Token,
        proof: &CapabilityProof,
    ) -> std::result::Result<(), Rejected> {
        let (credited, in_flight) = match self.prepare_deposit(registry, payee, &token, proof) {
            Ok(next) => next,
            Err(error) => return Err(Rejected::new(error, token)),
        };

        let amount = token.into_value();
        self.balances.insert(*payee, Balance { amount: credited });
        self.supply.in_flight = in_flight;
        self.events.push(LedgerEvent::Deposited {
            presenter: *proof.holder(),
            payee: *payee,
            amount,
        });
        info!(presenter = %proof.holder(), payee = %payee, amount, "tokens deposited");
        Ok(())
    }

    /// Debits `amount` from the proof holder and returns it as a token.
    ///
    /// # Errors
    ///
    /// Returns `IsBlacklisted` from the registry, [`Error::NotInitialized`],
    /// [`Error::InsufficientBalance`] or [`Error::Overflow`].
    pub(crate) fn withdraw(
        &mut self,
        registry: &Registry,
        amount: u64,
        proof: &CapabilityProof,
    ) -> Result<Token> {
        self.check_registry(registry)?;
        registry.require_not_blacklisted(proof)?;
        let account = *proof.holder();
        let current = self.balance(&account)?;
        let remaining = current
            .checked_sub(amount)
            .ok_or(Error::InsufficientBalance {
                have: current,
                need: amount,
            })?;
        let in_flight = self
            .supply
            .in_flight
            .checked_add(amount)
            .ok_or(Error::overflow("withdraw"))?;

        self.balances.insert(account, Balance { amount: remaining });
        self.supply.in_flight = in_flight;
        self.events.push(LedgerEvent::Withdrawn { account, amount });
        info!(account = %account, amount, "tokens withdrawn");
        Ok(Token::new(self.origin(), amount))
    }

    /// Destroys a detached token, reducing supply.
    ///
    /// # Errors
    ///
    /// Hands the token back inside [`Rejected`] with `NotMinter` from the
    /// registry, [`Error::ForeignToken`], [`Error::StaleToken`] or
    /// [`Error::Overflow`].
    pub(crate) fn burn(
        &mut self,
        registry: &Registry,
        token: Token,
        proof: &CapabilityProof,
    ) -> std::result::Result<(), Rejected> {
        let (burned, in_flight) = match self.prepare_burn(registry, &token, proof) {
            Ok(next) => next,
            Err(error) => return Err(Rejected::new(error, token)),
        };

        let amount = token.into_value();
        self.supply.burned = burned;
        self.supply.in_flight = in_flight;
        let minter = *proof.holder();
        self.events.push(LedgerEvent::Burned { minter, amount });
        info!(account = %minter, amount, "tokens burned");
        Ok(())
    }

    /// New payee balance and in-flight total for a deposit.
    fn prepare_deposit(
        &self,
        registry: &Registry,
        payee: &AccountId,
        token: &Token,
        proof: &CapabilityProof,
    ) -> Result<(u64, u64)> {
        self.check_registry(registry)?;
        registry.require_not_blacklisted(proof)?;
        token.check_origin(self.origin())?;
        let current = self.balance(payee)?;
        let amount = token.peek();
        let credited = current
            .checked_add(amount)
            .ok_or(Error::overflow("deposit"))?;
        let in_flight = self
            .supply
            .in_flight
            .checked_sub(amount)
            .ok_or(Error::overflow("deposit"))?;
        Ok((credited, in_flight))
    }

    /// New burned and in-flight totals for a burn.
    fn prepare_burn(
        &self,
        registry: &Registry,
        token: &Token,
        proof: &CapabilityProof,
    ) -> Result<(u64, u64)> {
        self.check_registry(registry)?;
        registry.require_minter(proof)?;
        token.check_origin(self.origin())?;
        let amount = token.peek();
        let burned = self
            .supply
            .burned
            .checked_add(amount)
            .ok_or(Error::overflow("burn"))?;
        let in_flight = self
            .supply
            .in_flight
            .checked_sub(amount)
            .ok_or(Error::overflow("burn"))?;
        Ok((burned, in_flight))
    }

    fn replay(&mut self, event: LedgerEvent) -> std::result::Result<(), InvalidSnapshot> {
        let overflow = || InvalidSnapshot::new("supply counters overflow in the journal");
        match &event {
            LedgerEvent::Initialized { account } => {
                if self.balances.insert(*account, Balance::default()).is_some() {
                    return Err(InvalidSnapshot::new(format!(
                        "{account} initialized twice"
                    )));
                }
            }
            LedgerEvent::Minted { amount, .. } => {
                self.supply.minted = self.supply.minted.checked_add(*amount).ok_or_else(overflow)?;
                self.supply.in_flight =
                    self.supply.in_flight.checked_add(*amount).ok_or_else(overflow)?;
            }
            LedgerEvent::Deposited { payee, amount, .. } => {
                self.supply.in_flight =
                    self.supply.in_flight.checked_sub(*amount).ok_or_else(overflow)?;
                let balance = self.replay_balance(payee)?;
                balance.amount = balance.amount.checked_add(*amount).ok_or_else(overflow)?;
            }
            LedgerEvent::Withdrawn { account, amount } => {
                let balance = self.replay_balance(account)?;
                balance.amount = balance.amount.checked_sub(*amount).ok_or_else(overflow)?;
                self.supply.in_flight =
                    self.supply.in_flight.checked_add(*amount).ok_or_else(overflow)?;
            }
            LedgerEvent::Burned { amount, .. } => {
                self.supply.in_flight =
                    self.supply.in_flight.checked_sub(*amount).ok_or_else(overflow)?;
                self.supply.burned = self.supply.burned.checked_add(*amount).ok_or_else(overflow)?;
            }
        }
        self.events.push(event);
        Ok(())
    }

    fn replay_balance(
        &mut self,
        account: &AccountId,
    ) -> std::result::Result<&mut Balance, InvalidSnapshot> {
        self.balances
            .get_mut(account)
            .ok_or_else(|| InvalidSnapshot::new(format!("event for unknown account {account}")))
    }

    fn check_registry(&self, registry: &Registry) -> Result<()> {
        if registry.id() == self.registry {
            Ok(())
        } else {
            Err(permit_registry::Error::unauthorized(format!(
                "{} is bound to {}, not {}",
                self.id,
                self.registry,
                registry.id()
            ))
            .into())
        }
    }
}

impl Clone for Ledger {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            registry: self.registry,
            balances: self.balances.clone(),
            supply: self.supply,
            events: self.events.clone(),
            generation: Origin::fresh(self.id).generation,
        }
    }
}

#[derive(Deserialize)]
struct LedgerSnapshot {
    id: LedgerId,
    registry: RegistryId,
    balances: BTreeMap<AccountId, Balance>,
    supply: Supply,
    events: Vec<LedgerEvent>,
}

impl TryFrom<LedgerSnapshot> for Ledger {
    type Error = InvalidSnapshot;

    fn try_from(snapshot: LedgerSnapshot) -> std::result::Result<Self, Self::Error> {
        let mut ledger = Self::empty(snapshot.id, snapshot.registry);
        for event in snapshot.events {
            ledger.replay(event)?;
        }
        if ledger.balances != snapshot.balances {
            return Err(InvalidSnapshot::new("balances disagree with the journal"));
        }
        if ledger.supply != snapshot.supply {
            return Err(InvalidSnapshot::new("supply totals disagree with the journal"));
        }
        Ok(ledger)
    }
}
