//! Claim ledger: at most one credential per `(lecture, address)`.

use std::collections::HashMap;

use poap_types::{Address, CredentialId, Fingerprint};

use crate::error::RegistryError;

#[derive(Clone, Debug, Default)]
pub struct ClaimLedger {
    claims: HashMap<(Fingerprint, Address), CredentialId>,
    per_lecture: HashMap<Fingerprint, u64>,
}

impl ClaimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The credential issued to `attendee` for `fingerprint`, or
    /// [`CredentialId::UNCLAIMED`].
    pub fn claimed_id(&self, fingerprint: &Fingerprint, attendee: &Address) -> CredentialId {
        self.claims
            .get(&(*fingerprint, *attendee))
            .copied()
            .unwrap_or(CredentialId::UNCLAIMED)
    }

    pub fn is_claimed(&self, fingerprint: &Fingerprint, attendee: &Address) -> bool {
        !self.claimed_id(fingerprint, attendee).is_unclaimed()
    }

    /// Record a fulfilled claim. Only the issuer calls this.
    pub(crate) fn record_claim(
        &mut self,
        fingerprint: Fingerprint,
        attendee: Address,
        id: CredentialId,
    ) -> Result<(), RegistryError> {
        let existing = self.claimed_id(&fingerprint, &attendee);
        if !existing.is_unclaimed() {
            return Err(RegistryError::AlreadyClaimed {
                fingerprint,
                attendee,
                id: existing,
            });
        }
        self.claims.insert((fingerprint, attendee), id);
        *self.per_lecture.entry(fingerprint).or_default() += 1;
        Ok(())
    }

    /// Undo a claim recorded earlier in the same uncommitted operation.
    pub(crate) fn unrecord(&mut self, fingerprint: &Fingerprint, attendee: &Address) {
        if self.claims.remove(&(*fingerprint, *attendee)).is_some() {
            if let Some(n) = self.per_lecture.get_mut(fingerprint) {
                *n -= 1;
                if *n == 0 {
                    self.per_lecture.remove(fingerprint);
                }
            }
        }
    }

    /// Number of credentials issued for a lecture.
    pub fn claims_for(&self, fingerprint: &Fingerprint) -> u64 {
        self.per_lecture.get(fingerprint).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(n: u8) -> Fingerprint {
        Fingerprint::new([n; 32])
    }

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn unclaimed_reads_as_sentinel() {
        let ledger = ClaimLedger::new();
        assert_eq!(ledger.claimed_id(&fp(1), &addr(1)), CredentialId::UNCLAIMED);
        assert!(!ledger.is_claimed(&fp(1), &addr(1)));
    }

    #[test]
    fn second_record_for_same_key_fails() {
        let mut ledger = ClaimLedger::new();
        ledger.record_claim(fp(1), addr(1), CredentialId::new(1)).unwrap();
        let err = ledger
            .record_claim(fp(1), addr(1), CredentialId::new(2))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::AlreadyClaimed {
                fingerprint: fp(1),
                attendee: addr(1),
                id: CredentialId::new(1),
            }
        );
        assert_eq!(ledger.claimed_id(&fp(1), &addr(1)), CredentialId::new(1));
    }

    #[test]
    fn claims_are_per_lecture() {
        let mut ledger = ClaimLedger::new();
        ledger.record_claim(fp(1), addr(1), CredentialId::new(1)).unwrap();
        ledger.record_claim(fp(2), addr(1), CredentialId::new(2)).unwrap();
        ledger.record_claim(fp(1), addr(2), CredentialId::new(3)).unwrap();
        assert_eq!(ledger.claims_for(&fp(1)), 2);
        assert_eq!(ledger.claims_for(&fp(2)), 1);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn unrecord_restores_prior_state() {
        let mut ledger = ClaimLedger::new();
        ledger.record_claim(fp(1), addr(1), CredentialId::new(1)).unwrap();
        ledger.unrecord(&fp(1), &addr(1));
        assert!(!ledger.is_claimed(&fp(1), &addr(1)));
        assert_eq!(ledger.claims_for(&fp(1)), 0);
        assert!(ledger.is_empty());
    }
}
