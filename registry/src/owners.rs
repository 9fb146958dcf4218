//! Per-address issuance history.

use std::collections::HashMap;

use poap_types::{Address, CredentialId};

/// Append-only `address → [credential id]` index, in issuance order.
#[derive(Clone, Debug, Default)]
pub struct OwnerIndex {
    tokens: HashMap<Address, Vec<CredentialId>>,
}

impl OwnerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens_of(&self, owner: &Address) -> &[CredentialId] {
        self.tokens.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn append(&mut self, owner: Address, id: CredentialId) {
        self.tokens.entry(owner).or_default().push(id);
    }
}
