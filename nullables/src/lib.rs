//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! Everything the ledger reaches outside itself for (the clock, the
//! capability gate, the token ledger) sits behind a trait. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Can be told to fail at a chosen moment
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod gate;
pub mod store;

pub use clock::NullClock;
pub use gate::NullGate;
pub use store::NullTokenLedger;
