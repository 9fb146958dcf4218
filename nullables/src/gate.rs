//! Nullable capability gate: scripted roles and halt flag.

use poap_access::{CapabilityGate, Role, RoleTable};
use poap_types::Address;
use std::sync::Mutex;

/// A capability gate for testing.
///
/// A permissive gate grants every role to every account. Otherwise roles
/// come from an inner [`RoleTable`]. The halt flag can be scripted to flip
/// after a number of checks, which simulates a halt landing in the middle of
/// a multi-step operation.
pub struct NullGate {
    permissive: bool,
    table: RoleTable,
    halt_countdown: Mutex<Option<u64>>,
}

impl NullGate {
    /// Every account holds every role.
    pub fn permissive() -> Self {
        Self {
            permissive: true,
            table: RoleTable::new(),
            halt_countdown: Mutex::new(None),
        }
    }

    /// Nobody holds any role until granted.
    pub fn denying() -> Self {
        Self {
            permissive: false,
            ..Self::permissive()
        }
    }

    /// Report running for the next `checks` halt queries, then engage the halt.
    pub fn halt_after_checks(&self, checks: u64) {
        let mut countdown = self
            .halt_countdown
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *countdown = Some(checks);
    }
}

impl Default for NullGate {
    fn default() -> Self {
        Self::permissive()
    }
}

impl CapabilityGate for NullGate {
    fn has_role(&self, role: Role, account: &Address) -> bool {
        self.permissive || self.table.has_role(role, account)
    }

    fn is_halted(&self) -> bool {
        let mut countdown = self
            .halt_countdown
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        match *countdown {
            Some(0) => {
                *countdown = None;
                self.table.set_halted(true);
            }
            Some(n) => *countdown = Some(n - 1),
            None => {}
        }
        self.table.is_halted()
    }

    fn set_halted(&self, halted: bool) {
        self.table.set_halted(halted);
    }

    fn grant(&self, role: Role, account: Address) -> bool {
        self.table.grant(role, account)
    }

    fn revoke(&self, role: Role, account: &Address) -> bool {
        self.table.revoke(role, account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissive_allows_anyone() {
        let gate = NullGate::permissive();
        assert!(gate.has_role(Role::Admin, &Address::new([9; 20])));
    }

    #[test]
    fn denying_requires_grants() {
        let gate = NullGate::denying();
        let account = Address::new([1; 20]);
        assert!(!gate.has_role(Role::Issuer, &account));
        gate.grant(Role::Issuer, account);
        assert!(gate.has_role(Role::Issuer, &account));
    }

    #[test]
    fn halt_engages_after_countdown() {
        let gate = NullGate::permissive();
        gate.halt_after_checks(2);
        assert!(!gate.is_halted());
        assert!(!gate.is_halted());
        assert!(gate.is_halted());
        assert!(gate.is_halted());
        gate.set_halted(false);
        assert!(!gate.is_halted());
    }
}
