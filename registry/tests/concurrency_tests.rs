use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::thread;

use poap_nullables::{NullClock, NullGate};
use poap_registry::PoapLedger;
use poap_store::MemoryTokenLedger;
use poap_types::{Address, CredentialId, Fingerprint, Timestamp};

const ISSUER: Address = Address::new([0xAA; 20]);
const THREADS: usize = 8;
const ATTENDEES: u8 = 12;

fn attendee(n: u8) -> Address {
    Address::new([n; 20])
}

/// Each worker covers an overlapping slice of the attendee range, half of
/// them one at a time and half in batches, so most pairs are contended.
fn worker_attendees(worker: usize) -> Vec<Address> {
    let first = (worker as u8 * 3) % ATTENDEES;
    (0..8).map(|i| attendee(1 + (first + i) % ATTENDEES)).collect()
}

#[test]
fn concurrent_issuance_keeps_one_credential_per_pair() {
    let clock = Arc::new(NullClock::new(150));
    let ledger = Arc::new(PoapLedger::new(
        NullGate::permissive(),
        MemoryTokenLedger::new(),
        clock,
    ));
    let lectures: Vec<Fingerprint> = ["Intro", "Advanced"]
        .iter()
        .map(|name| {
            ledger
                .register(&ISSUER, name, Timestamp::new(100), Timestamp::new(200), "ipfs://x")
                .unwrap()
        })
        .collect();

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let ledger = Arc::clone(&ledger);
            let lectures = lectures.clone();
            thread::spawn(move || {
                let attendees = worker_attendees(worker);
                let mut issued = Vec::new();
                for fingerprint in &lectures {
                    if worker % 2 == 0 {
                        for who in &attendees {
                            match ledger.issue(&ISSUER, fingerprint, *who) {
                                Ok(id) => issued.push((*fingerprint, *who, id)),
                                Err(e) => assert!(e.is_benign(), "unexpected error: {e}"),
                            }
                        }
                    } else {
                        let outcome = ledger.issue_batch(&ISSUER, fingerprint, &attendees).unwrap();
                        issued.extend(outcome.issued.into_iter().map(|(who, id)| (*fingerprint, who, id)));
                    }
                }
                issued
            })
        })
        .collect();

    let issued: Vec<(Fingerprint, Address, CredentialId)> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();

    let pairs: HashSet<(Fingerprint, Address)> = (0..THREADS)
        .flat_map(|worker| {
            let attendees = worker_attendees(worker);
            lectures
                .iter()
                .flat_map(move |fp| attendees.clone().into_iter().map(move |who| (*fp, who)))
        })
        .collect();

    assert_eq!(ledger.total_issued(), pairs.len() as u64);
    assert_eq!(issued.len(), pairs.len());

    let ids: BTreeSet<u64> = issued.iter().map(|(_, _, id)| id.as_u64()).collect();
    assert_eq!(ids.len(), issued.len(), "an id was handed out twice");
    assert_eq!(ids, (1..=pairs.len() as u64).collect::<BTreeSet<_>>());

    for (fingerprint, who) in &pairs {
        let id = ledger.claimed_id(fingerprint, who);
        assert!(!id.is_unclaimed());
        assert!(ledger.tokens_of(who).contains(&id));
        assert_eq!(ledger.lecture_of(id).unwrap(), *fingerprint);
        assert_eq!(ledger.owner_of(id).unwrap(), *who);
    }
    for n in 1..=ATTENDEES {
        let who = attendee(n);
        let claimed = lectures
            .iter()
            .filter(|fp| !ledger.claimed_id(fp, &who).is_unclaimed())
            .count();
        assert_eq!(ledger.tokens_of(&who).len(), claimed);
    }
}
