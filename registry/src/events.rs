//! Notifications produced by the issuance ledger.

use poap_access::Role;
use poap_types::{Address, CredentialId, Fingerprint, Timestamp};
use serde::{Deserialize, Serialize};

/// Ledger-level notifications, appended once per committed operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A lecture was registered.
    EventRegistered {
        fingerprint: Fingerprint,
        name: String,
        start: Timestamp,
        deadline: Timestamp,
        metadata_uri: String,
    },
    /// A credential was issued to an attendee.
    CredentialIssued {
        fingerprint: Fingerprint,
        attendee: Address,
        id: CredentialId,
    },
    /// The emergency halt was engaged.
    Halted { by: Address },
    /// The emergency halt was released.
    Resumed { by: Address },
    RoleGranted {
        role: Role,
        account: Address,
        by: Address,
    },
    RoleRevoked {
        role: Role,
        account: Address,
        by: Address,
    },
}

/// A notification with its position in the log. Sequence numbers start at 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub event: LedgerEvent,
}

/// Synchronous fan-out of committed notifications.
///
/// Listeners are invoked inline while the ledger lock is held, after the
/// operation has committed. They must not call back into the ledger.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&EventRecord) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&EventRecord) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, record: &EventRecord) {
        for listener in &self.listeners {
            listener(record);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
