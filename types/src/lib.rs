//! Fundamental types for the POAP issuance ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! attendee addresses, lecture fingerprints, credential ids, and timestamps.

pub mod address;
pub mod credential;
pub mod error;
pub mod hash;
pub mod time;

pub use address::Address;
pub use credential::CredentialId;
pub use error::TypeError;
pub use hash::Fingerprint;
pub use time::{Clock, FixedClock, SystemClock, Timestamp};
