//! Lecture records and the append-only lecture registry.

use std::collections::HashMap;

use poap_types::{Fingerprint, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// An immutable lecture record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureRecord {
    /// `lecture_fingerprint(name, deadline, metadata_uri)`.
    pub fingerprint: Fingerprint,
    pub name: String,
    /// First instant at which credentials can be claimed (inclusive).
    pub start: Timestamp,
    /// Last instant at which credentials can be claimed (inclusive).
    pub deadline: Timestamp,
    /// Shared by every credential issued for this lecture.
    pub metadata_uri: String,
}

/// Where `now` falls relative to a lecture's claim window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowStatus {
    Upcoming,
    Open,
    Closed,
}

impl LectureRecord {
    pub fn new(
        name: impl Into<String>,
        start: Timestamp,
        deadline: Timestamp,
        metadata_uri: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let metadata_uri = metadata_uri.into();
        let fingerprint = poap_crypto::lecture_fingerprint(&name, deadline, &metadata_uri);
        Self {
            fingerprint,
            name,
            start,
            deadline,
            metadata_uri,
        }
    }

    /// The claim window is `start <= now <= deadline`, used by both single
    /// and batch issuance.
    pub fn window_status(&self, now: Timestamp) -> WindowStatus {
        if now < self.start {
            WindowStatus::Upcoming
        } else if now > self.deadline {
            WindowStatus::Closed
        } else {
            WindowStatus::Open
        }
    }

    pub fn check_window(&self, now: Timestamp) -> Result<(), RegistryError> {
        match self.window_status(now) {
            WindowStatus::Open => Ok(()),
            WindowStatus::Upcoming => Err(RegistryError::NotYetOpen {
                start: self.start,
                now,
            }),
            WindowStatus::Closed => Err(RegistryError::WindowClosed {
                deadline: self.deadline,
                now,
            }),
        }
    }
}

/// Append-only store of lecture records.
#[derive(Clone, Debug, Default)]
pub struct LectureRegistry {
    records: HashMap<Fingerprint, LectureRecord>,
    /// Fingerprints in registration order.
    order: Vec<Fingerprint>,
}

impl LectureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.records.contains_key(fingerprint)
    }

    /// Insert a record, rejecting duplicate fingerprints and inverted windows.
    pub fn insert(&mut self, record: LectureRecord) -> Result<Fingerprint, RegistryError> {
        Self::validate(&record)?;
        if self.contains(&record.fingerprint) {
            return Err(RegistryError::DuplicateEvent(record.fingerprint));
        }
        let fingerprint = record.fingerprint;
        self.order.push(fingerprint);
        self.records.insert(fingerprint, record);
        Ok(fingerprint)
    }

    /// Checks that don't depend on registry contents.
    pub fn validate(record: &LectureRecord) -> Result<(), RegistryError> {
        if record.start > record.deadline {
            return Err(RegistryError::InvalidWindow {
                start: record.start,
                deadline: record.deadline,
            });
        }
        Ok(())
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&LectureRecord> {
        self.records.get(fingerprint)
    }

    pub fn get_by_index(&self, index: usize) -> Result<&LectureRecord, RegistryError> {
        self.order
            .get(index)
            .and_then(|fp| self.records.get(fp))
            .ok_or(RegistryError::OutOfRange {
                index,
                count: self.order.len(),
            })
    }

    pub fn count(&self) -> usize {
        self.order.len()
    }

    /// Records in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &LectureRecord> + '_ {
        self.order.iter().filter_map(|fp| self.records.get(fp))
    }
}
