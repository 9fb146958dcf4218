//! Credential id sequencer.

use poap_types::CredentialId;

use crate::error::RegistryError;

/// Hands out strictly increasing credential ids, starting at 1.
///
/// Allocation is two-phase: [`IdSequencer::reserve`] (or `peek` for a single
/// id) names the ids without consuming them, and the commit path consumes
/// them with `advance_past` once the issuance can no longer fail.
#[derive(Clone, Debug)]
pub struct IdSequencer {
    next: CredentialId,
}

impl IdSequencer {
    pub fn new() -> Self {
        Self {
            next: CredentialId::FIRST,
        }
    }

    /// Resume after `last` (the highest id ever assigned).
    pub fn resume_after(last: CredentialId) -> Result<Self, RegistryError> {
        let next = last.successor().ok_or(RegistryError::IdSpaceExhausted)?;
        Ok(Self { next })
    }

    /// The id the next issuance will be assigned.
    pub fn peek(&self) -> CredentialId {
        self.next
    }

    /// The next `count` ids, without consuming them.
    pub fn reserve(&self, count: usize) -> Result<Vec<CredentialId>, RegistryError> {
        let mut ids = Vec::with_capacity(count);
        let mut cursor = self.next;
        for _ in 0..count {
            ids.push(cursor);
            cursor = cursor.successor().ok_or(RegistryError::IdSpaceExhausted)?;
        }
        Ok(ids)
    }

    /// Consume every id up to and including `last`.
    pub(crate) fn advance_past(&mut self, last: CredentialId) -> Result<(), RegistryError> {
        if last >= self.next {
            self.next = last.successor().ok_or(RegistryError::IdSpaceExhausted)?;
        }
        Ok(())
    }
}

impl Default for IdSequencer {
    fn default() -> Self {
        Self::new()
    }
}
