//! Ledger snapshots: the complete issuance state in a serializable form.
//!
//! Claims and the owner index are not stored: both are rebuilt from the
//! credential list, which keeps every invariant checkable on restore.

use serde::{Deserialize, Serialize};

use poap_types::{Address, CredentialId, Fingerprint};

use crate::error::RegistryError;
use crate::events::EventRecord;
use crate::lecture::LectureRecord;
use crate::sequencer::IdSequencer;
use crate::state::{CredentialRef, LedgerState};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: u32,
    /// Lectures in registration order.
    pub lectures: Vec<LectureRecord>,
    /// Issued credentials in id order.
    pub credentials: Vec<IssuedCredential>,
    /// The id the sequencer hands out next.
    pub next_id: CredentialId,
    pub events: Vec<EventRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCredential {
    pub id: CredentialId,
    pub fingerprint: Fingerprint,
    pub attendee: Address,
}

fn invalid(msg: impl Into<String>) -> RegistryError {
    RegistryError::Snapshot(msg.into())
}

impl LedgerState {
    pub(crate) fn to_snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            version: SNAPSHOT_VERSION,
            lectures: self.lectures.iter().cloned().collect(),
            credentials: self
                .credentials
                .iter()
                .map(|(&id, r)| IssuedCredential {
                    id,
                    fingerprint: r.fingerprint,
                    attendee: r.attendee,
                })
                .collect(),
            next_id: self.sequencer.peek(),
            events: self.events.clone(),
        }
    }

    pub(crate) fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, RegistryError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(invalid(format!(
                "unsupported version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        let mut state = LedgerState::new();
        for lecture in snapshot.lectures {
            let expected = poap_crypto::lecture_fingerprint(
                &lecture.name,
                lecture.deadline,
                &lecture.metadata_uri,
            );
            if expected != lecture.fingerprint {
                return Err(invalid(format!(
                    "lecture {:?} has fingerprint {} but hashes to {}",
                    lecture.name, lecture.fingerprint, expected
                )));
            }
            state
                .lectures
                .insert(lecture)
                .map_err(|e| invalid(e.to_string()))?;
        }

        if snapshot.next_id.is_unclaimed() {
            return Err(invalid("next id cannot be the unclaimed sentinel"));
        }
        let mut previous = CredentialId::UNCLAIMED;
        for c in snapshot.credentials {
            if c.id <= previous {
                return Err(invalid(format!("credential {} is out of order", c.id)));
            }
            if c.id >= snapshot.next_id {
                return Err(invalid(format!(
                    "credential {} is not below next id {}",
                    c.id, snapshot.next_id
                )));
            }
            if !state.lectures.contains(&c.fingerprint) {
                return Err(invalid(format!(
                    "credential {} references unknown lecture {}",
                    c.id, c.fingerprint
                )));
            }
            state
                .claims
                .record_claim(c.fingerprint, c.attendee, c.id)
                .map_err(|e| invalid(e.to_string()))?;
            state.owners.append(c.attendee, c.id);
            state.credentials.insert(
                c.id,
                CredentialRef {
                    fingerprint: c.fingerprint,
                    attendee: c.attendee,
                },
            );
            previous = c.id;
        }
        state.sequencer = match snapshot.next_id.as_u64() {
            1 => IdSequencer::new(),
            n => IdSequencer::resume_after(CredentialId::new(n - 1))?,
        };

        for (i, record) in snapshot.events.iter().enumerate() {
            if record.seq != i as u64 + 1 {
                return Err(invalid(format!(
                    "event at position {} has sequence {}",
                    i, record.seq
                )));
            }
        }
        state.events = snapshot.events;
        Ok(state)
    }
}
