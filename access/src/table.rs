//! In-process role table with an emergency halt flag.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use poap_types::Address;
use serde::{Deserialize, Serialize};

use crate::gate::CapabilityGate;
use crate::role::Role;

/// Serializable view of a role table, used for persistence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignments {
    pub members: BTreeMap<Role, BTreeSet<Address>>,
    pub halted: bool,
}

/// Registry of role holders plus the halt flag.
pub struct RoleTable {
    members: RwLock<BTreeMap<Role, BTreeSet<Address>>>,
    halted: AtomicBool,
}

impl RoleTable {
    pub fn new() -> Self {
        Self {
            members: RwLock::new(BTreeMap::new()),
            halted: AtomicBool::new(false),
        }
    }

    /// A table where `admin` holds every role, as a freshly deployed
    /// ledger's operator does.
    pub fn with_admin(admin: Address) -> Self {
        let table = Self::new();
        for role in Role::ALL {
            table.grant(role, admin);
        }
        table
    }

    pub fn from_assignments(assignments: RoleAssignments) -> Self {
        Self {
            members: RwLock::new(assignments.members),
            halted: AtomicBool::new(assignments.halted),
        }
    }

    pub fn assignments(&self) -> RoleAssignments {
        let members = self
            .members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        RoleAssignments {
            members,
            halted: self.is_halted(),
        }
    }

    /// All holders of `role`, in address order.
    pub fn members(&self, role: Role) -> Vec<Address> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for RoleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityGate for RoleTable {
    fn has_role(&self, role: Role, account: &Address) -> bool {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&role)
            .is_some_and(|set| set.contains(account))
    }

    fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    fn set_halted(&self, halted: bool) {
        self.halted.store(halted, Ordering::SeqCst);
    }

    fn grant(&self, role: Role, account: Address) -> bool {
        let added = self
            .members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(role)
            .or_default()
            .insert(account);
        if added {
            tracing::debug!(%role, %account, "role granted");
        }
        added
    }

    fn revoke(&self, role: Role, account: &Address) -> bool {
        let removed = self
            .members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&role)
            .is_some_and(|set| set.remove(account));
        if removed {
            tracing::debug!(%role, %account, "role revoked");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccessError;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn admin_holds_every_role() {
        let table = RoleTable::with_admin(addr(1));
        for role in Role::ALL {
            assert!(table.has_role(role, &addr(1)));
            assert!(!table.has_role(role, &addr(2)));
        }
    }

    #[test]
    fn grant_and_revoke_report_changes() {
        let table = RoleTable::new();
        assert!(table.grant(Role::Issuer, addr(2)));
        assert!(!table.grant(Role::Issuer, addr(2)));
        assert!(table.has_role(Role::Issuer, &addr(2)));
        assert!(table.revoke(Role::Issuer, &addr(2)));
        assert!(!table.revoke(Role::Issuer, &addr(2)));
        assert!(!table.has_role(Role::Issuer, &addr(2)));
    }

    #[test]
    fn require_role_names_the_missing_role() {
        let table = RoleTable::new();
        let err = table.require_role(Role::Issuer, &addr(3)).unwrap_err();
        assert_eq!(
            err,
            AccessError::Unauthorized {
                role: Role::Issuer,
                account: addr(3)
            }
        );
    }

    #[test]
    fn halt_flag_drives_require_running() {
        let table = RoleTable::new();
        assert!(table.require_running().is_ok());
        table.set_halted(true);
        assert_eq!(table.require_running(), Err(AccessError::Halted));
        table.set_halted(false);
        assert!(table.require_running().is_ok());
    }

    #[test]
    fn assignments_round_trip() {
        let table = RoleTable::with_admin(addr(1));
        table.grant(Role::Issuer, addr(2));
        table.set_halted(true);
        let json = serde_json::to_string(&table.assignments()).unwrap();
        let restored = RoleTable::from_assignments(serde_json::from_str(&json).unwrap());
        assert!(restored.is_halted());
        assert_eq!(restored.members(Role::Issuer), vec![addr(1), addr(2)]);
        assert_eq!(restored.members(Role::HaltController), vec![addr(1)]);
    }

    #[test]
    fn shared_handle_sees_the_same_table() {
        let table = std::sync::Arc::new(RoleTable::new());
        let handle = std::sync::Arc::clone(&table);
        assert!(handle.grant(Role::Issuer, addr(4)));
        handle.set_halted(true);
        assert!(CapabilityGate::has_role(&table, Role::Issuer, &addr(4)));
        assert!(CapabilityGate::is_halted(&table));
    }
}
