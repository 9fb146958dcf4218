//! Credential identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A sequential credential id.
///
/// Assigned ids start at 1. The value 0 is reserved as the "unclaimed"
/// sentinel returned by claim lookups and is never assigned to a credential.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CredentialId(u64);

impl CredentialId {
    /// Sentinel meaning "no credential has been issued for this claim".
    pub const UNCLAIMED: Self = Self(0);

    /// The first id handed out by a fresh sequencer.
    pub const FIRST: Self = Self(1);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_unclaimed(&self) -> bool {
        self.0 == 0
    }

    /// The id immediately after this one, or `None` on overflow.
    pub fn successor(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CredentialId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
