use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use poap_nullables::{NullClock, NullGate};
use poap_registry::{PoapLedger, RegistryError};
use poap_store::MemoryTokenLedger;
use poap_types::{Address, Fingerprint, Timestamp};

const ISSUER: Address = Address::new([0xAA; 20]);

fn open_ledger() -> (PoapLedger<NullGate, MemoryTokenLedger>, Vec<Fingerprint>) {
    let clock = Arc::new(NullClock::new(150));
    let ledger = PoapLedger::new(NullGate::permissive(), MemoryTokenLedger::new(), clock);
    let lectures = ["Intro", "Advanced", "Seminar"]
        .iter()
        .map(|name| {
            ledger
                .register(&ISSUER, name, Timestamp::new(100), Timestamp::new(200), "ipfs://x")
                .unwrap()
        })
        .collect();
    (ledger, lectures)
}

fn attendee(n: u8) -> Address {
    Address::new([n; 20])
}

proptest! {
    /// Issued ids are strictly increasing across every lecture, and each
    /// (lecture, attendee) pair is issued at most once.
    #[test]
    fn ids_increase_and_claims_are_unique(
        ops in prop::collection::vec((0usize..3, 1u8..8), 1..60),
    ) {
        let (ledger, lectures) = open_ledger();
        let mut last = 0u64;
        let mut claimed = HashSet::new();
        for (lecture, who) in ops {
            let f = lectures[lecture];
            match ledger.issue(&ISSUER, &f, attendee(who)) {
                Ok(id) => {
                    prop_assert!(id.as_u64() > last, "id {} after {}", id, last);
                    prop_assert!(claimed.insert((lecture, who)), "double issue");
                    last = id.as_u64();
                }
                Err(RegistryError::AlreadyClaimed { id, .. }) => {
                    prop_assert!(claimed.contains(&(lecture, who)));
                    prop_assert_eq!(ledger.claimed_id(&f, &attendee(who)), id);
                }
                Err(e) => prop_assert!(false, "unexpected error {}", e),
            }
        }
        prop_assert_eq!(ledger.total_issued(), claimed.len() as u64);
    }

    /// Replaying a batch issues nothing and skips everyone.
    #[test]
    fn batch_is_idempotent(who in prop::collection::vec(1u8..16, 0..24)) {
        let (ledger, lectures) = open_ledger();
        let f = lectures[0];
        let attendees: Vec<Address> = who.iter().copied().map(attendee).collect();
        let distinct: HashSet<_> = attendees.iter().copied().collect();

        let first = ledger.issue_batch(&ISSUER, &f, &attendees).unwrap();
        prop_assert_eq!(first.issued.len(), distinct.len());
        prop_assert_eq!(first.issued.len() + first.skipped.len(), attendees.len());

        let snapshot = ledger.snapshot();
        let second = ledger.issue_batch(&ISSUER, &f, &attendees).unwrap();
        prop_assert!(second.issued.is_empty());
        prop_assert_eq!(second.skipped.len(), attendees.len());
        prop_assert_eq!(ledger.snapshot(), snapshot);
    }

    /// Every owner's history holds exactly one id per lecture they attended.
    #[test]
    fn owner_history_matches_claims(
        ops in prop::collection::vec((0usize..3, 1u8..5), 0..40),
    ) {
        let (ledger, lectures) = open_ledger();
        for (lecture, who) in &ops {
            let _ = ledger.issue(&ISSUER, &lectures[*lecture], attendee(*who));
        }
        for who in 1u8..5 {
            let history = ledger.tokens_of(&attendee(who));
            let expected: HashSet<_> = ops
                .iter()
                .filter(|(_, w)| *w == who)
                .map(|(l, _)| *l)
                .collect();
            prop_assert_eq!(history.len(), expected.len());
            for id in history {
                let f = ledger.lecture_of(id).unwrap();
                prop_assert_eq!(ledger.claimed_id(&f, &attendee(who)), id);
            }
        }
    }
}
