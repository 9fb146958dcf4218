//! Token ownership storage for the POAP issuance ledger.
//!
//! The issuance core never owns tokens itself: it hands `(id, owner)`
//! bindings to a [`TokenLedger`] and asks it who owns what. Every backend
//! (in-memory, persistent, test doubles) implements the trait; the rest of
//! the codebase depends only on the trait.

pub mod error;
pub mod memory;
pub mod token;

pub use error::StoreError;
pub use memory::MemoryTokenLedger;
pub use token::{TokenBinding, TokenLedger};
