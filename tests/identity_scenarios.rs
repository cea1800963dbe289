//! End-to-end identity scenarios
//!
//! Saves, updates, and reloads identity records through the record-map
//! workflow on both ephemeral and disk-backed databases.

mod common;

use common::*;
use std::collections::BTreeMap;
use std::sync::{Arc, Barrier};
use std::thread;
use vaultdb::identity::Device;
use vaultdb::{load_map, save_record};

// ============================================================================
// Fresh dataset
// ============================================================================

#[test]
fn test_fresh_dataset_reads_as_empty() {
    let tdb = TestDb::new();
    let ds = tdb.identities();

    assert_eq!(ds.head().unwrap(), None);
    let map = load_map(&ds).unwrap();
    assert!(map.is_empty());
    assert_eq!(map.base(), None);
    assert!(tdb.db.datasets().is_empty());
}

// ============================================================================
// Save and update
// ============================================================================

#[test]
fn test_save_alice_and_reload() {
    let tdb = TestDb::new();
    let repo = tdb.repository();
    let alice = Identity::generate(&mut rng(1));

    repo.save(&alice).unwrap();

    let map = load_map(repo.dataset()).unwrap();
    let stored: Identity = map.get_record(&alice.uuid).unwrap().unwrap();
    assert_eq!(stored, alice);
    assert_eq!(stored.devices.len(), 1);
}

#[test]
fn test_update_alice_with_second_device() {
    let tdb = TestDb::new();
    let repo = tdb.repository();
    let mut rng = rng(2);
    let mut alice = Identity::generate(&mut rng);
    let first_device = alice.devices.keys().next().cloned().unwrap();

    let first_head = repo.save(&alice).unwrap();

    alice.metadata = BTreeMap::from([("myUpdate".to_string(), "another thing".to_string())]);
    let new_device = Device::generate(&mut rng);
    let new_device_id = new_device.uuid.clone();
    alice.add_device(new_device);

    // Commit against the head observed after the first save
    let ds = tdb.identities();
    let mut map = load_map(&ds).unwrap();
    assert_eq!(map.base(), Some(first_head));
    map.set_record(alice.uuid.clone(), &alice).unwrap();
    map.commit(&ds).unwrap();

    let reloaded = repo.load(&alice.uuid).unwrap().unwrap();
    assert_eq!(reloaded, alice);
    assert!(reloaded.devices.contains_key(&first_device));
    assert!(reloaded.devices.contains_key(&new_device_id));
    assert_eq!(reloaded.metadata.get("myUpdate").map(String::as_str), Some("another thing"));
    assert!(!reloaded.metadata.contains_key("EncryptedRootKey"));
    assert_eq!(ds.history().unwrap().len(), 2);
}

#[test]
fn test_sequential_saves_keep_all_identities() {
    let tdb = TestDb::new();
    let repo = tdb.repository();
    let mut rng = rng(3);

    let mut saved = Vec::new();
    let mut last_height = 0;
    for _ in 0..10 {
        let identity = Identity::generate(&mut rng);
        repo.save(&identity).unwrap();
        saved.push(identity);

        let height = repo.dataset().head_commit().unwrap().unwrap().height;
        assert!(height > last_height);
        last_height = height;

        let map = load_map(repo.dataset()).unwrap();
        assert_eq!(map.len(), saved.len());
        for identity in &saved {
            assert!(map.contains_key(&identity.uuid));
        }
    }
}

// ============================================================================
// Conflicts
// ============================================================================

#[test]
fn test_stale_head_commit_fails_and_leaves_head() {
    let tdb = TestDb::new();
    let ds = tdb.identities();
    let mut rng = rng(4);
    let alice = Identity::generate(&mut rng);
    let bob = Identity::generate(&mut rng);

    let stale = load_map(&ds).unwrap();
    let head = save_record(&ds, &alice.uuid, &alice).unwrap();

    let mut stale = stale;
    stale.set_record(bob.uuid.clone(), &bob).unwrap();
    let err = stale.commit(&ds).unwrap_err();

    match err {
        VaultError::ConcurrentModification {
            expected, actual, ..
        } => {
            assert_eq!(expected, None);
            assert_eq!(actual, Some(head));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(ds.head().unwrap(), Some(head));
    assert!(tdb.repository().load(&bob.uuid).unwrap().is_none());
}

#[test]
fn test_two_writers_exactly_one_succeeds() {
    let tdb = TestDb::new();
    let repo = tdb.repository();
    let mut rng = rng(5);
    repo.save(&Identity::generate(&mut rng)).unwrap();

    let writers: Vec<Identity> = (0..2).map(|_| Identity::generate(&mut rng)).collect();
    let barrier = Arc::new(Barrier::new(writers.len()));
    let handles: Vec<_> = writers
        .into_iter()
        .map(|identity| {
            let ds = tdb.identities();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut map = load_map(&ds).unwrap();
                map.set_record(identity.uuid.clone(), &identity).unwrap();
                barrier.wait();
                map.commit(&ds)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let conflicts = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .filter(|e| e.is_conflict())
        .count();
    assert_eq!(conflicts, 1);
    assert_eq!(repo.list().unwrap().len(), 2);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_identities_survive_reopen() {
    let mut tdb = TestDb::new_strict();
    let mut rng = rng(6);
    let alice = Identity::generate(&mut rng);
    let bob = Identity::generate(&mut rng);

    let head = {
        let repo = tdb.repository();
        repo.save(&alice).unwrap();
        repo.save(&bob).unwrap()
    };

    tdb.reopen();

    let repo = tdb.repository();
    assert_eq!(repo.dataset().head().unwrap(), Some(head));
    assert_eq!(repo.load(&alice.uuid).unwrap(), Some(alice));
    assert_eq!(repo.load(&bob.uuid).unwrap(), Some(bob));
    assert_eq!(tdb.db.datasets(), vec![IDENTITIES_DATASET.to_string()]);
}

#[test]
fn test_ephemeral_scenario_matches_disk() {
    let db = Database::ephemeral().unwrap();
    let repo = IdentityRepository::open(&db).unwrap();
    let alice = Identity::generate(&mut rng(7));

    repo.save(&alice).unwrap();
    assert_eq!(repo.load(&alice.uuid).unwrap(), Some(alice));
    assert!(db.is_ephemeral());
}
