//! Prometheus metrics for the POAP node.
//!
//! [`PoapMetrics`] owns a dedicated [`Registry`]. Counters driven by
//! committed ledger notifications are fed from a ledger subscription; the
//! rejection counter is fed by the node as operations fail.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

use poap_registry::{EventRecord, LedgerEvent, RegistryError};

use crate::NodeError;

/// Central collection of all node-level Prometheus metrics.
#[derive(Clone)]
pub struct PoapMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Lectures registered since the process started.
    pub lectures_registered: IntCounter,
    /// Credentials issued since the process started.
    pub credentials_issued: IntCounter,
    /// Rejected mutating operations, labelled by error kind.
    pub issuance_rejected: IntCounterVec,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// 1 while the emergency halt is engaged.
    pub halted: IntGauge,
}

impl PoapMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        let lectures_registered = register_int_counter_with_registry!(
            Opts::new(
                "poap_lectures_registered_total",
                "Total lectures registered"
            ),
            registry
        )?;

        let credentials_issued = register_int_counter_with_registry!(
            Opts::new(
                "poap_credentials_issued_total",
                "Total credentials issued"
            ),
            registry
        )?;

        let issuance_rejected = register_int_counter_vec_with_registry!(
            Opts::new(
                "poap_issuance_rejected_total",
                "Total rejected ledger operations by error kind"
            ),
            &["kind"],
            registry
        )?;

        let halted = register_int_gauge_with_registry!(
            Opts::new("poap_halted", "Whether the emergency halt is engaged"),
            registry
        )?;

        Ok(Self {
            registry,
            lectures_registered,
            credentials_issued,
            issuance_rejected,
            halted,
        })
    }

    /// Update counters for one committed notification.
    pub fn observe_event(&self, record: &EventRecord) {
        match &record.event {
            LedgerEvent::EventRegistered { .. } => self.lectures_registered.inc(),
            LedgerEvent::CredentialIssued { .. } => self.credentials_issued.inc(),
            LedgerEvent::Halted { .. } => self.halted.set(1),
            LedgerEvent::Resumed { .. } => self.halted.set(0),
            LedgerEvent::RoleGranted { .. } | LedgerEvent::RoleRevoked { .. } => {}
        }
    }

    pub fn observe_rejection(&self, error: &RegistryError) {
        self.issuance_rejected
            .with_label_values(&[error.kind().as_str()])
            .inc();
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
