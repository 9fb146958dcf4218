//! The capability gate trait.

use std::sync::Arc;

use poap_types::Address;

use crate::error::AccessError;
use crate::role::Role;

/// Answers role and halt questions for the issuance ledger.
///
/// Implementations use interior mutability: the ledger holds the gate by
/// shared reference and serializes calls to the mutators itself.
pub trait CapabilityGate: Send + Sync {
    fn has_role(&self, role: Role, account: &Address) -> bool;
    fn is_halted(&self) -> bool;

    /// Flip the halt flag. Role checks happen in the caller.
    fn set_halted(&self, halted: bool);

    /// Grant `role` to `account`. Returns `false` if it was already held.
    fn grant(&self, role: Role, account: Address) -> bool;

    /// Revoke `role` from `account`. Returns `false` if it was not held.
    fn revoke(&self, role: Role, account: &Address) -> bool;

    fn require_role(&self, role: Role, account: &Address) -> Result<(), AccessError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(AccessError::Unauthorized {
                role,
                account: *account,
            })
        }
    }

    fn require_running(&self) -> Result<(), AccessError> {
        if self.is_halted() {
            Err(AccessError::Halted)
        } else {
            Ok(())
        }
    }
}

impl<G: CapabilityGate + ?Sized> CapabilityGate for Arc<G> {
    fn has_role(&self, role: Role, account: &Address) -> bool {
        (**self).has_role(role, account)
    }

    fn is_halted(&self) -> bool {
        (**self).is_halted()
    }

    fn set_halted(&self, halted: bool) {
        (**self).set_halted(halted)
    }

    fn grant(&self, role: Role, account: Address) -> bool {
        (**self).grant(role, account)
    }

    fn revoke(&self, role: Role, account: &Address) -> bool {
        (**self).revoke(role, account)
    }
}
