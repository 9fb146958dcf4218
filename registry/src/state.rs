//! The complete issuance state and its stage-then-commit write path.

use std::collections::BTreeMap;

use poap_store::{TokenBinding, TokenLedger};
use poap_types::{Address, CredentialId, Fingerprint};

use crate::claims::ClaimLedger;
use crate::error::RegistryError;
use crate::events::{EventRecord, LedgerEvent};
use crate::lecture::LectureRegistry;
use crate::owners::OwnerIndex;
use crate::sequencer::IdSequencer;

/// Back-reference kept for every issued credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CredentialRef {
    pub fingerprint: Fingerprint,
    pub attendee: Address,
}

/// Everything the ledger owns. Mutated only through [`LedgerState::commit_issuance`]
/// and the registration/event helpers, always under the ledger lock.
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    pub lectures: LectureRegistry,
    pub claims: ClaimLedger,
    pub owners: OwnerIndex,
    pub sequencer: IdSequencer,
    pub credentials: BTreeMap<CredentialId, CredentialRef>,
    pub events: Vec<EventRecord>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_event(&mut self, event: LedgerEvent) -> EventRecord {
        let record = EventRecord {
            seq: self.events.len() as u64 + 1,
            event,
        };
        self.events.push(record.clone());
        record
    }

    /// Notifications with a sequence number greater than `after`.
    pub fn events_since(&self, after: u64) -> &[EventRecord] {
        let start = usize::try_from(after).unwrap_or(usize::MAX).min(self.events.len());
        &self.events[start..]
    }

    /// Commit a set of already-validated issuances for one lecture.
    ///
    /// `bindings` must carry ids reserved from the sequencer, in order. The
    /// fallible steps (claim recording, id advance, token binding) run first
    /// and are undone on failure; the remaining steps cannot fail. Returns the
    /// appended notifications.
    pub fn commit_issuance<T: TokenLedger>(
        &mut self,
        tokens: &mut T,
        fingerprint: Fingerprint,
        bindings: &[TokenBinding],
    ) -> Result<Vec<EventRecord>, RegistryError> {
        let Some(last) = bindings.last() else {
            return Ok(Vec::new());
        };

        let mut sequencer = self.sequencer.clone();
        sequencer.advance_past(last.id)?;

        for (i, b) in bindings.iter().enumerate() {
            if let Err(e) = self.claims.record_claim(fingerprint, b.owner, b.id) {
                self.unrecord_claims(&fingerprint, &bindings[..i]);
                return Err(e);
            }
        }

        if let Err(e) = tokens.bind_all(bindings) {
            self.unrecord_claims(&fingerprint, bindings);
            return Err(e.into());
        }

        self.sequencer = sequencer;
        let mut records = Vec::with_capacity(bindings.len());
        for b in bindings {
            self.credentials.insert(
                b.id,
                CredentialRef {
                    fingerprint,
                    attendee: b.owner,
                },
            );
            self.owners.append(b.owner, b.id);
            records.push(self.append_event(LedgerEvent::CredentialIssued {
                fingerprint,
                attendee: b.owner,
                id: b.id,
            }));
        }
        Ok(records)
    }

    fn unrecord_claims(&mut self, fingerprint: &Fingerprint, bindings: &[TokenBinding]) {
        for b in bindings {
            self.claims.unrecord(fingerprint, &b.owner);
        }
    }
}
