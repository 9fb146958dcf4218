//! Capability gate: who may do what, and whether anything may happen at all.
//!
//! The issuance ledger never inspects permissions itself. It asks a
//! [`CapabilityGate`] two questions before every mutating operation:
//! - does the caller hold the required [`Role`]?
//! - is the emergency halt engaged?
//!
//! Design:
//! - Three roles: `Admin` (manages roles), `Issuer` (registers lectures and
//!   issues credentials), `HaltController` (engages and releases the halt)
//! - [`RoleTable`] is the in-process gate used by the node; tests substitute
//!   their own implementations to simulate denied or halted states

pub mod error;
pub mod gate;
pub mod role;
pub mod table;

pub use error::AccessError;
pub use gate::CapabilityGate;
pub use role::Role;
pub use table::{RoleAssignments, RoleTable};
