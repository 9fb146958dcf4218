//! The credential issuer: the serialized entry point for every operation.
//!
//! Every public method takes the ledger lock for its whole duration, so
//! operations never interleave and reads never observe a half-applied batch.
//! Mutations are validated and staged first, then committed through
//! [`LedgerState::commit_issuance`], so a failure leaves no trace.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use poap_access::{CapabilityGate, Role, RoleAssignments, RoleTable};
use poap_store::{TokenBinding, TokenLedger};
use poap_types::{Address, Clock, CredentialId, Fingerprint, Timestamp};
use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::events::{EventBus, EventRecord, LedgerEvent};
use crate::lecture::LectureRecord;
use crate::snapshot::LedgerSnapshot;
use crate::state::LedgerState;

/// An issued credential as seen from outside the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Credential {
    pub id: CredentialId,
    /// Current owner according to the token ledger.
    pub owner: Address,
    pub fingerprint: Fingerprint,
}

/// Result of a batch issuance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Newly issued credentials, in attendee order.
    pub issued: Vec<(Address, CredentialId)>,
    /// Attendees that already held a credential for the lecture, or
    /// appeared earlier in the same batch.
    pub skipped: Vec<Address>,
}

struct Inner<T> {
    state: LedgerState,
    tokens: T,
    bus: EventBus,
}

impl<T> Inner<T> {
    fn publish(&mut self, event: LedgerEvent) {
        let record = self.state.append_event(event);
        self.bus.emit(&record);
    }
}

/// The POAP issuance ledger.
pub struct PoapLedger<G, T> {
    gate: G,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner<T>>,
}

fn log_rejection<V>(op: &'static str, result: &Result<V, RegistryError>) {
    if let Err(e) = result {
        if e.is_benign() {
            debug!(op, kind = e.kind().as_str(), error = %e, "operation rejected");
        } else {
            warn!(op, kind = e.kind().as_str(), error = %e, "operation rejected");
        }
    }
}

impl<G: CapabilityGate, T: TokenLedger> PoapLedger<G, T> {
    pub fn new(gate: G, tokens: T, clock: Arc<dyn Clock>) -> Self {
        Self::from_parts(LedgerState::new(), gate, tokens, clock)
    }

    /// Rebuild a ledger from a snapshot. Every credential in the snapshot
    /// must already be bound in `tokens`.
    pub fn restore(
        snapshot: LedgerSnapshot,
        gate: G,
        tokens: T,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RegistryError> {
        let state = LedgerState::from_snapshot(snapshot)?;
        if let Some(id) = state.credentials.keys().find(|id| !tokens.is_bound(**id)) {
            return Err(RegistryError::Snapshot(format!(
                "credential {id} is not bound in the token ledger"
            )));
        }
        info!(
            lectures = state.lectures.count(),
            credentials = state.credentials.len(),
            "ledger restored"
        );
        Ok(Self::from_parts(state, gate, tokens, clock))
    }

    fn from_parts(state: LedgerState, gate: G, tokens: T, clock: Arc<dyn Clock>) -> Self {
        Self {
            gate,
            clock,
            inner: Mutex::new(Inner {
                state,
                tokens,
                bus: EventBus::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn authorize(&self, role: Role, caller: &Address) -> Result<(), RegistryError> {
        self.gate.require_role(role, caller)?;
        self.gate.require_running()?;
        Ok(())
    }

    fn check_claim(
        state: &LedgerState,
        lecture: &LectureRecord,
        attendee: &Address,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        lecture.check_window(now)?;
        let existing = state.claims.claimed_id(&lecture.fingerprint, attendee);
        if !existing.is_unclaimed() {
            return Err(RegistryError::AlreadyClaimed {
                fingerprint: lecture.fingerprint,
                attendee: *attendee,
                id: existing,
            });
        }
        Ok(())
    }

    // ── Lecture registry ────────────────────────────────────────────────

    /// Register a lecture. Requires the issuer role and a running system.
    pub fn register(
        &self,
        caller: &Address,
        name: &str,
        start: Timestamp,
        deadline: Timestamp,
        metadata_uri: &str,
    ) -> Result<Fingerprint, RegistryError> {
        let mut inner = self.lock();
        let record = LectureRecord::new(name, start, deadline, metadata_uri);
        let result = self.register_locked(&mut inner, caller, record);
        log_rejection("register", &result);
        result
    }

    fn register_locked(
        &self,
        inner: &mut Inner<T>,
        caller: &Address,
        record: LectureRecord,
    ) -> Result<Fingerprint, RegistryError> {
        self.authorize(Role::Issuer, caller)?;
        let event = LedgerEvent::EventRegistered {
            fingerprint: record.fingerprint,
            name: record.name.clone(),
            start: record.start,
            deadline: record.deadline,
            metadata_uri: record.metadata_uri.clone(),
        };
        let (start, deadline) = (record.start, record.deadline);
        let fingerprint = inner.state.lectures.insert(record)?;
        inner.publish(event);
        info!(
            %fingerprint,
            start = start.as_secs(),
            deadline = deadline.as_secs(),
            "lecture registered"
        );
        Ok(fingerprint)
    }

    pub fn lecture(&self, fingerprint: &Fingerprint) -> Option<LectureRecord> {
        self.lock().state.lectures.get(fingerprint).cloned()
    }

    pub fn lecture_by_index(&self, index: usize) -> Result<LectureRecord, RegistryError> {
        self.lock().state.lectures.get_by_index(index).cloned()
    }

    pub fn lecture_count(&self) -> usize {
        self.lock().state.lectures.count()
    }

    /// All lectures in registration order.
    pub fn lectures(&self) -> Vec<LectureRecord> {
        self.lock().state.lectures.iter().cloned().collect()
    }

    // ── Issuance ────────────────────────────────────────────────────────

    /// Issue one credential for `fingerprint` to `attendee`.
    pub fn issue(
        &self,
        caller: &Address,
        fingerprint: &Fingerprint,
        attendee: Address,
    ) -> Result<CredentialId, RegistryError> {
        let mut inner = self.lock();
        let now = self.clock.now();
        let result = self.issue_locked(&mut inner, caller, fingerprint, attendee, now);
        log_rejection("issue", &result);
        result
    }

    fn issue_locked(
        &self,
        inner: &mut Inner<T>,
        caller: &Address,
        fingerprint: &Fingerprint,
        attendee: Address,
        now: Timestamp,
    ) -> Result<CredentialId, RegistryError> {
        self.authorize(Role::Issuer, caller)?;
        let lecture = inner
            .state
            .lectures
            .get(fingerprint)
            .ok_or(RegistryError::UnknownEvent(*fingerprint))?;
        Self::check_claim(&inner.state, lecture, &attendee, now)?;

        let id = inner.state.sequencer.peek();
        let bindings = [TokenBinding {
            id,
            owner: attendee,
        }];
        let Inner { state, tokens, bus } = inner;
        for record in state.commit_issuance(tokens, *fingerprint, &bindings)? {
            bus.emit(&record);
        }
        info!(%fingerprint, %attendee, %id, "credential issued");
        Ok(id)
    }

    /// Issue credentials to every attendee that has not yet claimed one.
    ///
    /// Lecture existence and the window are checked once up front. Already
    /// claimed attendees, and repeats within `attendees`, are skipped. Any
    /// other failure aborts the whole call and nobody is issued anything.
    pub fn issue_batch(
        &self,
        caller: &Address,
        fingerprint: &Fingerprint,
        attendees: &[Address],
    ) -> Result<BatchOutcome, RegistryError> {
        let mut inner = self.lock();
        let now = self.clock.now();
        let result = self.issue_batch_locked(&mut inner, caller, fingerprint, attendees, now);
        log_rejection("issue_batch", &result);
        result
    }

    fn issue_batch_locked(
        &self,
        inner: &mut Inner<T>,
        caller: &Address,
        fingerprint: &Fingerprint,
        attendees: &[Address],
        now: Timestamp,
    ) -> Result<BatchOutcome, RegistryError> {
        let lecture = inner
            .state
            .lectures
            .get(fingerprint)
            .ok_or(RegistryError::UnknownEvent(*fingerprint))?;
        lecture.check_window(now)?;

        let mut planned = Vec::with_capacity(attendees.len());
        let mut seen = HashSet::with_capacity(attendees.len());
        let mut skipped = Vec::new();
        for attendee in attendees {
            if inner.state.claims.is_claimed(fingerprint, attendee) || !seen.insert(*attendee) {
                debug!(%fingerprint, %attendee, "already claimed, skipping");
                skipped.push(*attendee);
                continue;
            }
            self.authorize(Role::Issuer, caller)?;
            Self::check_claim(&inner.state, lecture, attendee, now)?;
            planned.push(*attendee);
        }

        let ids = inner.state.sequencer.reserve(planned.len())?;
        let bindings: Vec<TokenBinding> = ids
            .into_iter()
            .zip(planned)
            .map(|(id, owner)| TokenBinding { id, owner })
            .collect();

        let Inner { state, tokens, bus } = inner;
        for record in state.commit_issuance(tokens, *fingerprint, &bindings)? {
            bus.emit(&record);
        }
        if !bindings.is_empty() {
            info!(
                %fingerprint,
                issued = bindings.len(),
                skipped = skipped.len(),
                "batch issued"
            );
        }
        Ok(BatchOutcome {
            issued: bindings.iter().map(|b| (b.owner, b.id)).collect(),
            skipped,
        })
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// The credential `attendee` holds for `fingerprint`, or
    /// [`CredentialId::UNCLAIMED`].
    pub fn claimed_id(&self, fingerprint: &Fingerprint, attendee: &Address) -> CredentialId {
        self.lock().state.claims.claimed_id(fingerprint, attendee)
    }

    /// Ids issued to `owner`, in issuance order.
    pub fn tokens_of(&self, owner: &Address) -> Vec<CredentialId> {
        self.lock().state.owners.tokens_of(owner).to_vec()
    }

    /// Metadata URI of the lecture a credential was issued for.
    pub fn metadata_of(&self, id: CredentialId) -> Result<String, RegistryError> {
        let inner = self.lock();
        let fingerprint = inner
            .state
            .credentials
            .get(&id)
            .map(|r| r.fingerprint)
            .ok_or(RegistryError::UnknownCredential(id))?;
        inner
            .state
            .lectures
            .get(&fingerprint)
            .map(|l| l.metadata_uri.clone())
            .ok_or(RegistryError::UnknownEvent(fingerprint))
    }

    pub fn lecture_of(&self, id: CredentialId) -> Result<Fingerprint, RegistryError> {
        self.lock()
            .state
            .credentials
            .get(&id)
            .map(|r| r.fingerprint)
            .ok_or(RegistryError::UnknownCredential(id))
    }

    pub fn credential(&self, id: CredentialId) -> Result<Credential, RegistryError> {
        let inner = self.lock();
        let r = inner
            .state
            .credentials
            .get(&id)
            .ok_or(RegistryError::UnknownCredential(id))?;
        Ok(Credential {
            id,
            owner: inner.tokens.owner_of(id).unwrap_or(r.attendee),
            fingerprint: r.fingerprint,
        })
    }

    pub fn owner_of(&self, id: CredentialId) -> Result<Address, RegistryError> {
        self.credential(id).map(|c| c.owner)
    }

    pub fn total_issued(&self) -> u64 {
        self.lock().state.credentials.len() as u64
    }

    /// Number of credentials issued for one lecture.
    pub fn claims_for(&self, fingerprint: &Fingerprint) -> u64 {
        self.lock().state.claims.claims_for(fingerprint)
    }

    pub fn is_halted(&self) -> bool {
        self.gate.is_halted()
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// Notifications with a sequence number greater than `after`.
    pub fn events_since(&self, after: u64) -> Vec<EventRecord> {
        self.lock().state.events_since(after).to_vec()
    }

    /// Register a listener for notifications committed from now on.
    pub fn subscribe(&self, listener: Box<dyn Fn(&EventRecord) + Send + Sync>) {
        self.lock().bus.subscribe(listener);
    }

    // ── Administration ──────────────────────────────────────────────────

    /// Engage the emergency halt. Requires the halt-controller role.
    pub fn halt(&self, caller: &Address) -> Result<(), RegistryError> {
        let mut inner = self.lock();
        let result = self.set_halted_locked(&mut inner, caller, true);
        log_rejection("halt", &result);
        result
    }

    /// Release the emergency halt. Requires the halt-controller role.
    pub fn resume(&self, caller: &Address) -> Result<(), RegistryError> {
        let mut inner = self.lock();
        let result = self.set_halted_locked(&mut inner, caller, false);
        log_rejection("resume", &result);
        result
    }

    fn set_halted_locked(
        &self,
        inner: &mut Inner<T>,
        caller: &Address,
        halted: bool,
    ) -> Result<(), RegistryError> {
        self.gate.require_role(Role::HaltController, caller)?;
        match (self.gate.is_halted(), halted) {
            (true, true) => return Err(RegistryError::SystemHalted),
            (false, false) => return Err(RegistryError::NotHalted),
            _ => {}
        }
        self.gate.set_halted(halted);
        let by = *caller;
        if halted {
            inner.publish(LedgerEvent::Halted { by });
            info!(%by, "ledger halted");
        } else {
            inner.publish(LedgerEvent::Resumed { by });
            info!(%by, "ledger resumed");
        }
        Ok(())
    }

    /// Grant `role` to `account`. Requires the admin role; allowed while
    /// halted. Returns `false` if the role was already held.
    pub fn grant_role(
        &self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<bool, RegistryError> {
        let mut inner = self.lock();
        let result = self.change_role_locked(&mut inner, caller, role, account, true);
        log_rejection("grant_role", &result);
        result
    }

    /// Revoke `role` from `account`. Requires the admin role; allowed while
    /// halted. Returns `false` if the role was not held.
    pub fn revoke_role(
        &self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<bool, RegistryError> {
        let mut inner = self.lock();
        let result = self.change_role_locked(&mut inner, caller, role, account, false);
        log_rejection("revoke_role", &result);
        result
    }

    fn change_role_locked(
        &self,
        inner: &mut Inner<T>,
        caller: &Address,
        role: Role,
        account: Address,
        grant: bool,
    ) -> Result<bool, RegistryError> {
        self.gate.require_role(Role::Admin, caller)?;
        let by = *caller;
        let changed = if grant {
            self.gate.grant(role, account)
        } else {
            self.gate.revoke(role, &account)
        };
        if changed {
            if grant {
                inner.publish(LedgerEvent::RoleGranted { role, account, by });
                info!(%role, %account, %by, "role granted");
            } else {
                inner.publish(LedgerEvent::RoleRevoked { role, account, by });
                info!(%role, %account, %by, "role revoked");
            }
        }
        Ok(changed)
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.lock().state.to_snapshot()
    }

    /// Take a snapshot and read the token ledger under the same lock, so
    /// both halves describe one instant.
    pub fn snapshot_with<R>(&self, f: impl FnOnce(&T) -> R) -> (LedgerSnapshot, R) {
        let inner = self.lock();
        (inner.state.to_snapshot(), f(&inner.tokens))
    }

    /// Run `f` against the token ledger under the ledger lock.
    pub fn with_tokens<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock().tokens)
    }
}

impl<T: TokenLedger> PoapLedger<RoleTable, T> {
    /// A copy of the current role holders and halt flag. Changes go through
    /// [`PoapLedger::grant_role`], [`PoapLedger::revoke_role`],
    /// [`PoapLedger::halt`] and [`PoapLedger::resume`].
    pub fn role_assignments(&self) -> RoleAssignments {
        self.gate.assignments()
    }
}
