//! Hashing primitives for the POAP issuance ledger.
//!
//! - **Blake2b-256** for every digest in the workspace
//! - Lecture fingerprint derivation from `(name, deadline, metadata URI)`

pub mod hash;

pub use hash::{blake2b_256, blake2b_256_multi, lecture_fingerprint};
