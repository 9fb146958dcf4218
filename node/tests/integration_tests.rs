//! Integration tests exercising the full node lifecycle:
//! config → open → issue → save → reopen → readback.
//!
//! These tests wire the ledger to the real role table, token ledger and
//! state file, verifying the pieces work together and not just in isolation.

use std::sync::Arc;

use poap_access::Role;
use poap_node::{NodeConfig, NodeError, PoapNode};
use poap_nullables::NullClock;
use poap_registry::{ErrorKind, LedgerEvent};
use poap_types::{Address, CredentialId, Fingerprint, Timestamp};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ADMIN: Address = Address::new([0xAD; 20]);

fn attendee(n: u8) -> Address {
    Address::new([n; 20])
}

fn temp_config(dir: &tempfile::TempDir) -> NodeConfig {
    NodeConfig {
        data_dir: dir.path().to_path_buf(),
        admin: Some(ADMIN),
        enable_metrics: true,
        ..NodeConfig::default()
    }
}

fn open_at(config: &NodeConfig, now: u64) -> (PoapNode, Arc<NullClock>) {
    let clock = Arc::new(NullClock::new(now));
    let node = PoapNode::open_with_clock(config.clone(), clock.clone()).expect("open node");
    (node, clock)
}

fn register_intro(node: &PoapNode) -> Fingerprint {
    node.register(
        &ADMIN,
        "Intro",
        Timestamp::new(100),
        Timestamp::new(200),
        "ipfs://x",
    )
    .expect("register")
}

fn registry_kind(err: NodeError) -> ErrorKind {
    match err {
        NodeError::Registry(e) => e.kind(),
        other => panic!("expected a ledger error, got {other}"),
    }
}

// ---------------------------------------------------------------------------
// 1. Persistence round-trip
// ---------------------------------------------------------------------------

#[test]
fn state_survives_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = temp_config(&dir);

    let f = {
        let (node, _) = open_at(&config, 150);
        let f = register_intro(&node);
        node.issue_batch(&ADMIN, &f, &[attendee(1), attendee(2)])
            .expect("batch");
        node.save().expect("save");
        f
    };

    let (node, _) = open_at(&config, 150);
    let ledger = node.ledger();
    assert_eq!(ledger.lecture_count(), 1);
    assert_eq!(ledger.claimed_id(&f, &attendee(2)), CredentialId::new(2));
    assert_eq!(ledger.tokens_of(&attendee(1)), vec![CredentialId::new(1)]);
    assert_eq!(ledger.owner_of(CredentialId::new(2)).unwrap(), attendee(2));
    assert_eq!(ledger.events_since(0).len(), 3);

    // Ids continue after the restored high-water mark.
    assert_eq!(
        node.issue(&ADMIN, &f, attendee(3)).unwrap(),
        CredentialId::new(3)
    );
}

#[test]
fn halt_and_roles_survive_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = temp_config(&dir);

    {
        let (node, _) = open_at(&config, 150);
        node.grant_role(&ADMIN, Role::Issuer, attendee(9)).unwrap();
        node.halt(&ADMIN).unwrap();
        node.save().unwrap();
    }

    let (node, _) = open_at(&config, 150);
    assert!(node.ledger().is_halted());
    assert_eq!(
        node.ledger().role_assignments().members[&Role::Issuer]
            .iter()
            .copied()
            .collect::<Vec<_>>(),
        vec![attendee(9), ADMIN]
    );
    assert_eq!(node.metrics().unwrap().halted.get(), 1);
}

#[test]
fn bootstrap_roles_apply_only_to_a_fresh_ledger() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut config = temp_config(&dir);
    config.issuers = vec![attendee(5)];

    {
        let (node, _) = open_at(&config, 150);
        assert!(node.revoke_role(&ADMIN, Role::Issuer, attendee(5)).unwrap());
        node.save().unwrap();
    }

    let (node, _) = open_at(&config, 150);
    let err = node
        .register(&attendee(5), "X", Timestamp::new(0), Timestamp::new(1), "u")
        .unwrap_err();
    assert_eq!(registry_kind(err), ErrorKind::Unauthorized);
}

#[test]
fn corrupted_state_file_refuses_to_open() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = temp_config(&dir);
    std::fs::write(config.state_path(), b"not a state file").unwrap();

    let clock = Arc::new(NullClock::new(0));
    assert!(PoapNode::open_with_clock(config, clock).is_err());
}

// ---------------------------------------------------------------------------
// 2. End-to-end issuance
// ---------------------------------------------------------------------------

#[test]
fn intro_lecture_end_to_end() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (node, clock) = open_at(&temp_config(&dir), 150);
    let f = register_intro(&node);

    assert_eq!(node.issue(&ADMIN, &f, attendee(0xA)).unwrap(), CredentialId::FIRST);
    assert_eq!(
        registry_kind(node.issue(&ADMIN, &f, attendee(0xA)).unwrap_err()),
        ErrorKind::AlreadyClaimed
    );

    clock.set(250);
    assert_eq!(
        registry_kind(node.issue(&ADMIN, &f, attendee(0xB)).unwrap_err()),
        ErrorKind::WindowClosed
    );
    assert_eq!(
        node.ledger().metadata_of(CredentialId::FIRST).unwrap(),
        "ipfs://x"
    );

    let metrics = node.metrics().unwrap();
    assert_eq!(metrics.lectures_registered.get(), 1);
    assert_eq!(metrics.credentials_issued.get(), 1);
    assert_eq!(
        metrics
            .issuance_rejected
            .with_label_values(&["window_closed"])
            .get(),
        1
    );
}

#[test]
fn halted_node_rejects_issuance_until_resumed() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (node, _) = open_at(&temp_config(&dir), 150);
    let f = register_intro(&node);

    node.halt(&ADMIN).unwrap();
    let err = node
        .issue_batch(&ADMIN, &f, &[attendee(1), attendee(2)])
        .unwrap_err();
    assert_eq!(registry_kind(err), ErrorKind::SystemHalted);
    assert_eq!(node.ledger().total_issued(), 0);

    node.resume(&ADMIN).unwrap();
    let outcome = node
        .issue_batch(&ADMIN, &f, &[attendee(1), attendee(2)])
        .unwrap();
    assert_eq!(outcome.issued.len(), 2);

    let events: Vec<_> = node
        .ledger()
        .events_since(0)
        .into_iter()
        .map(|r| r.event)
        .collect();
    assert!(matches!(events[1], LedgerEvent::Halted { by } if by == ADMIN));
    assert!(matches!(events[2], LedgerEvent::Resumed { by } if by == ADMIN));
}

#[test]
fn metrics_disabled_by_default() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = NodeConfig {
        data_dir: dir.path().to_path_buf(),
        ..NodeConfig::default()
    };
    let (node, _) = open_at(&config, 0);
    assert!(node.metrics().is_none());
    assert!(node.ledger().lectures().is_empty());
}
