//! In-memory token ledger.

use std::collections::{BTreeMap, HashMap, HashSet};

use poap_types::{Address, CredentialId};
use serde::{Deserialize, Serialize};

use crate::token::{TokenBinding, TokenLedger};
use crate::StoreError;

/// Token ledger held entirely in memory.
///
/// Serializable so the node can persist it next to the issuance snapshot.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryTokenLedger {
    owners: BTreeMap<CredentialId, Address>,
    #[serde(skip)]
    balances: HashMap<Address, u64>,
}

impl MemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the per-owner balance cache after deserialization.
    pub fn reindex(&mut self) {
        self.balances.clear();
        for owner in self.owners.values() {
            *self.balances.entry(*owner).or_default() += 1;
        }
    }

    /// All bindings in id order.
    pub fn bindings(&self) -> impl Iterator<Item = TokenBinding> + '_ {
        self.owners
            .iter()
            .map(|(&id, &owner)| TokenBinding { id, owner })
    }

    fn check(&self, bindings: &[TokenBinding]) -> Result<(), StoreError> {
        let mut seen = HashSet::with_capacity(bindings.len());
        for b in bindings {
            if b.id.is_unclaimed() {
                return Err(StoreError::ReservedId);
            }
            if b.owner.is_zero() {
                return Err(StoreError::ZeroOwner(b.id));
            }
            if self.owners.contains_key(&b.id) {
                return Err(StoreError::AlreadyBound(b.id));
            }
            if !seen.insert(b.id) {
                return Err(StoreError::DuplicateBinding(b.id));
            }
        }
        Ok(())
    }
}

impl TokenLedger for MemoryTokenLedger {
    fn bind_all(&mut self, bindings: &[TokenBinding]) -> Result<(), StoreError> {
        self.check(bindings)?;
        for b in bindings {
            self.owners.insert(b.id, b.owner);
            *self.balances.entry(b.owner).or_default() += 1;
        }
        Ok(())
    }

    fn owner_of(&self, id: CredentialId) -> Option<Address> {
        self.owners.get(&id).copied()
    }

    fn balance_of(&self, owner: &Address) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn total_bound(&self) -> u64 {
        self.owners.len() as u64
    }
}
