//! Token ledger trait.

use poap_types::{Address, CredentialId};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// One ownership binding handed to the token ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBinding {
    pub id: CredentialId,
    pub owner: Address,
}

/// Minimal mint/owner-query interface of the non-fungible token ledger.
///
/// Transfer, approval and balance bookkeeping beyond [`TokenLedger::balance_of`]
/// belong to the backend and are not part of this interface.
pub trait TokenLedger: Send {
    /// Bind every id to its owner as one unit.
    ///
    /// Either all bindings are applied or, on error, none are. Fails if any
    /// id is already bound, is the reserved id 0, or repeats within `bindings`.
    fn bind_all(&mut self, bindings: &[TokenBinding]) -> Result<(), StoreError>;

    /// Current owner of `id`, or `None` if it was never bound.
    fn owner_of(&self, id: CredentialId) -> Option<Address>;

    /// Number of tokens currently owned by `owner`.
    fn balance_of(&self, owner: &Address) -> u64;

    /// Total number of bound tokens.
    fn total_bound(&self) -> u64;

    /// Bind a single id.
    fn bind(&mut self, id: CredentialId, owner: Address) -> Result<(), StoreError> {
        self.bind_all(&[TokenBinding { id, owner }])
    }

    fn is_bound(&self, id: CredentialId) -> bool {
        self.owner_of(id).is_some()
    }
}
