//! Nullable token ledger: in-memory bindings with injectable failures.

use poap_store::{MemoryTokenLedger, StoreError, TokenBinding, TokenLedger};
use poap_types::{Address, CredentialId};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A token ledger for testing.
///
/// Delegates to [`MemoryTokenLedger`] but can be told to reject the next
/// `bind_all` call with a backend error.
#[derive(Default)]
pub struct NullTokenLedger {
    inner: MemoryTokenLedger,
    fail_next: AtomicBool,
    bind_calls: AtomicU64,
}

impl NullTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `bind_all` fail without binding anything.
    pub fn fail_next_bind(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Number of `bind_all` calls seen, failed ones included.
    pub fn bind_calls(&self) -> u64 {
        self.bind_calls.load(Ordering::SeqCst)
    }
}

impl TokenLedger for NullTokenLedger {
    fn bind_all(&mut self, bindings: &[TokenBinding]) -> Result<(), StoreError> {
        self.bind_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected failure".into()));
        }
        self.inner.bind_all(bindings)
    }

    fn owner_of(&self, id: CredentialId) -> Option<Address> {
        self.inner.owner_of(id)
    }

    fn balance_of(&self, owner: &Address) -> u64 {
        self.inner.balance_of(owner)
    }

    fn total_bound(&self) -> u64 {
        self.inner.total_bound()
    }
}
