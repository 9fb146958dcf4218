//! The POAP node: wires the issuance ledger to its role table, token
//! ledger, clock, metrics and state file.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use poap_access::{CapabilityGate, Role, RoleTable};
use poap_registry::{BatchOutcome, PoapLedger, RegistryError};
use poap_store::MemoryTokenLedger;
use poap_types::{Address, Clock, CredentialId, Fingerprint, SystemClock, Timestamp};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::metrics::PoapMetrics;
use crate::persistence::{load_state, save_state, PersistedState};

/// The ledger as the node runs it.
pub type NodeLedger = PoapLedger<RoleTable, MemoryTokenLedger>;

/// A running POAP node.
pub struct PoapNode {
    config: NodeConfig,
    ledger: NodeLedger,
    metrics: Option<PoapMetrics>,
}

impl PoapNode {
    /// Open the node on the system clock.
    pub fn open(config: NodeConfig) -> Result<Self, NodeError> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    /// Load the state file if it exists, otherwise start an empty ledger
    /// and grant the configured bootstrap roles.
    pub fn open_with_clock(config: NodeConfig, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        let path = config.state_path();
        let ledger = match load_state(&path)? {
            Some(state) => {
                let roles = RoleTable::from_assignments(state.roles);
                let ledger = PoapLedger::restore(state.ledger, roles, state.tokens, clock)?;
                info!(path = %path.display(), "state loaded");
                ledger
            }
            None => {
                let roles = RoleTable::new();
                grant_bootstrap_roles(&config, &roles);
                let ledger = PoapLedger::new(roles, MemoryTokenLedger::new(), clock);
                info!(path = %path.display(), "no state file, starting a fresh ledger");
                ledger
            }
        };

        let metrics = if config.enable_metrics {
            let metrics = PoapMetrics::new()?;
            metrics.halted.set(i64::from(ledger.is_halted()));
            let observer = metrics.clone();
            ledger.subscribe(Box::new(move |record| observer.observe_event(record)));
            Some(metrics)
        } else {
            None
        };

        Ok(Self {
            config,
            ledger,
            metrics,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn ledger(&self) -> &NodeLedger {
        &self.ledger
    }

    pub fn metrics(&self) -> Option<&PoapMetrics> {
        self.metrics.as_ref()
    }

    pub fn state_path(&self) -> PathBuf {
        self.config.state_path()
    }

    /// Write the current state to the state file.
    pub fn save(&self) -> Result<(), NodeError> {
        let (ledger, (tokens, roles)) = self
            .ledger
            .snapshot_with(|tokens| (tokens.clone(), self.ledger.role_assignments()));
        save_state(&self.state_path(), &PersistedState { ledger, tokens, roles })
    }

    fn observe<V>(&self, result: Result<V, RegistryError>) -> Result<V, NodeError> {
        if let (Err(e), Some(metrics)) = (&result, &self.metrics) {
            metrics.observe_rejection(e);
        }
        result.map_err(NodeError::from)
    }

    // ── Mutations ───────────────────────────────────────────────────────

    pub fn register(
        &self,
        caller: &Address,
        name: &str,
        start: Timestamp,
        deadline: Timestamp,
        metadata_uri: &str,
    ) -> Result<Fingerprint, NodeError> {
        self.observe(self.ledger.register(caller, name, start, deadline, metadata_uri))
    }

    pub fn issue(
        &self,
        caller: &Address,
        fingerprint: &Fingerprint,
        attendee: Address,
    ) -> Result<CredentialId, NodeError> {
        self.observe(self.ledger.issue(caller, fingerprint, attendee))
    }

    pub fn issue_batch(
        &self,
        caller: &Address,
        fingerprint: &Fingerprint,
        attendees: &[Address],
    ) -> Result<BatchOutcome, NodeError> {
        self.observe(self.ledger.issue_batch(caller, fingerprint, attendees))
    }

    pub fn halt(&self, caller: &Address) -> Result<(), NodeError> {
        self.observe(self.ledger.halt(caller))
    }

    pub fn resume(&self, caller: &Address) -> Result<(), NodeError> {
        self.observe(self.ledger.resume(caller))
    }

    pub fn grant_role(
        &self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<bool, NodeError> {
        self.observe(self.ledger.grant_role(caller, role, account))
    }

    pub fn revoke_role(
        &self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<bool, NodeError> {
        self.observe(self.ledger.revoke_role(caller, role, account))
    }
}

fn grant_bootstrap_roles(config: &NodeConfig, gate: &RoleTable) {
    if let Some(admin) = config.admin {
        for role in Role::ALL {
            gate.grant(role, admin);
        }
    }
    for issuer in &config.issuers {
        gate.grant(Role::Issuer, *issuer);
    }
    for controller in &config.halt_controllers {
        gate.grant(Role::HaltController, *controller);
    }
}
