//! POAP issuance ledger.
//!
//! Issues non-transferable proof-of-attendance credentials for registered
//! lectures. Each address can claim at most one credential per lecture, only
//! while the lecture's window is open, and only while the system is not halted.
//!
//! Components:
//! - [`LectureRegistry`]: immutable lecture records keyed by fingerprint
//! - [`ClaimLedger`]: `(fingerprint, address) → credential id`
//! - [`OwnerIndex`]: per-address issuance history
//! - [`IdSequencer`]: strictly increasing ids starting at 1
//! - [`PoapLedger`]: the serialized service that validates, stages and
//!   commits every operation as one unit

pub mod claims;
pub mod error;
pub mod events;
pub mod issuer;
pub mod lecture;
pub mod owners;
pub mod sequencer;
pub mod snapshot;
mod state;

pub use claims::ClaimLedger;
pub use error::{ErrorKind, RegistryError};
pub use events::{EventBus, EventRecord, LedgerEvent};
pub use issuer::{BatchOutcome, Credential, PoapLedger};
pub use lecture::{LectureRecord, LectureRegistry, WindowStatus};
pub use owners::OwnerIndex;
pub use sequencer::IdSequencer;
pub use snapshot::{IssuedCredential, LedgerSnapshot, SNAPSHOT_VERSION};
