//! Integration tests for the storage layer
//!
//! These tests verify MemoryStore and LocalStore as complete systems:
//! - Round-trip identity for arbitrary values
//! - Durability of values and heads across reopen
//! - Recovery from a torn value log tail
//! - Concurrent puts

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;
use vault_core::{HeadStore, Reference, Value, ValueStore};
use vault_durability::{DurabilityMode, StorePaths};
use vault_storage::{LocalStore, MemoryStore, StoreConfig};

// ============================================================================
// Helper Functions
// ============================================================================

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e12f64..1.0e12).prop_map(Value::Float),
        "[a-zA-Z0-9 ]{0,32}".prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6).prop_map(Value::Map),
        ]
    })
}

fn random_record(rng: &mut StdRng, i: usize) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert("id".to_string(), Value::Int(i as i64));
    let body: String = (0..rng.gen_range(8..256))
        .map(|_| rng.gen_range(b'a'..=b'z') as char)
        .collect();
    fields.insert("body".to_string(), Value::String(body));
    Value::Map(fields)
}

// ============================================================================
// Round-trip properties
// ============================================================================

proptest! {
    #[test]
    fn prop_memory_store_roundtrip(value in arb_value()) {
        let store = MemoryStore::default();
        let r = store.put(&value).unwrap();
        prop_assert_eq!(store.get(&r).unwrap(), value.clone());
        prop_assert_eq!(store.put(&value).unwrap(), r);
    }

    #[test]
    fn prop_local_store_roundtrip(values in prop::collection::vec(arb_value(), 1..8)) {
        let dir = TempDir::new().unwrap();
        let refs: Vec<Reference> = {
            let store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
            let refs = values.iter().map(|v| store.put(v).unwrap()).collect::<Vec<_>>();
            for (r, v) in refs.iter().zip(&values) {
                prop_assert_eq!(&store.get(r).unwrap(), v);
            }
            refs
        };

        let reopened = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
        for (r, v) in refs.iter().zip(&values) {
            prop_assert_eq!(&reopened.get(r).unwrap(), v);
        }
    }
}

// ============================================================================
// Durability
// ============================================================================

mod durability {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let values: Vec<Value> = (0..200).map(|i| random_record(&mut rng, i)).collect();

        let refs: Vec<Reference> = {
            let config = StoreConfig::default().with_mem_table_size(4096);
            let store = LocalStore::open(dir.path(), config).unwrap();
            let refs = values.iter().map(|v| store.put(v).unwrap()).collect();
            store.flush().unwrap();
            refs
        };

        let store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
        assert_eq!(store.stats().values, values.len());
        for (r, v) in refs.iter().zip(&values) {
            assert_eq!(&store.get(r).unwrap(), v);
        }
    }

    #[test]
    fn test_unflushed_values_written_on_drop() {
        let dir = TempDir::new().unwrap();
        let r = {
            let store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
            let r = store.put(&Value::from("pending")).unwrap();
            assert!(store.stats().pending_bytes > 0);
            r
        };

        let store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
        assert_eq!(store.get(&r).unwrap(), Value::from("pending"));
    }

    #[test]
    fn test_heads_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let mut heads = BTreeMap::new();
        {
            let store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
            let r = store.put(&Value::from("head value")).unwrap();
            store.flush().unwrap();
            heads.insert("identities".to_string(), r);
            store.persist_heads(&heads).unwrap();
        }

        let store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
        assert_eq!(store.load_heads().unwrap(), heads);
    }

    #[test]
    fn test_torn_tail_is_dropped_on_reopen() {
        let dir = TempDir::new().unwrap();
        let kept = {
            let config = StoreConfig::default().with_durability(DurabilityMode::Always);
            let store = LocalStore::open(dir.path(), config).unwrap();
            store.put(&Value::from("kept")).unwrap()
        };

        let log_path = StorePaths::from_root(dir.path()).value_log();
        let mut f = OpenOptions::new().append(true).open(&log_path).unwrap();
        f.write_all(&[0x10, 0x00, 0x00, 0x00, 0xAB]).unwrap();
        drop(f);

        let store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
        assert_eq!(store.get(&kept).unwrap(), Value::from("kept"));
        assert_eq!(store.stats().values, 1);
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = TempDir::new().unwrap();
        {
            let _store = LocalStore::open(dir.path(), StoreConfig::default()).unwrap();
        }
        assert!(LocalStore::open(dir.path(), StoreConfig::default()).is_ok());
    }
}

// ============================================================================
// Concurrency
// ============================================================================

mod concurrency {
    use super::*;

    fn concurrent_puts<S: ValueStore + 'static>(store: Arc<S>) {
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(t);
                    (0..100)
                        .map(|i| {
                            let v = random_record(&mut rng, i);
                            (store.put(&v).unwrap(), v)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for h in handles {
            for (r, v) in h.join().unwrap() {
                assert_eq!(store.get(&r).unwrap(), v);
            }
        }
    }

    #[test]
    fn test_memory_store_concurrent_puts() {
        concurrent_puts(Arc::new(MemoryStore::default()));
    }

    #[test]
    fn test_local_store_concurrent_puts() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::default().with_mem_table_size(2048);
        concurrent_puts(Arc::new(LocalStore::open(dir.path(), config).unwrap()));
    }
}
