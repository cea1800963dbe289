//! In-memory value store
//!
//! DashMap keyed by reference: lock-free reads, sharded writes. Nothing is
//! durable; dropping the store drops every value and head.

use crate::config::StoreConfig;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use vault_core::{HeadStore, Reference, StoreStats, Value, ValueStore, VaultError, VaultResult};

/// Value and head storage held entirely in memory
pub struct MemoryStore {
    values: DashMap<Reference, Arc<Value>>,
    bytes: AtomicU64,
    heads: RwLock<BTreeMap<String, Reference>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new(config: &StoreConfig) -> Self {
        MemoryStore {
            values: DashMap::with_capacity(config.initial_capacity),
            bytes: AtomicU64::new(0),
            heads: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

impl ValueStore for MemoryStore {
    fn put(&self, value: &Value) -> VaultResult<Reference> {
        let encoded = value.canonical_bytes();
        let reference = Reference::of_encoded(&encoded);
        if let dashmap::mapref::entry::Entry::Vacant(slot) = self.values.entry(reference) {
            slot.insert(Arc::new(value.clone()));
            self.bytes.fetch_add(encoded.len() as u64, Ordering::Relaxed);
            debug!(target: "vault::store", reference = %reference.short(), bytes = encoded.len(), "Value stored");
        }
        Ok(reference)
    }

    fn get(&self, reference: &Reference) -> VaultResult<Value> {
        self.values
            .get(reference)
            .map(|v| v.as_ref().clone())
            .ok_or_else(|| VaultError::not_found(*reference))
    }

    fn has(&self, reference: &Reference) -> bool {
        self.values.contains_key(reference)
    }

    fn flush(&self) -> VaultResult<()> {
        Ok(())
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            values: self.values.len(),
            bytes: self.bytes.load(Ordering::Relaxed),
            pending_bytes: 0,
        }
    }
}

impl HeadStore for MemoryStore {
    fn load_heads(&self) -> VaultResult<BTreeMap<String, Reference>> {
        Ok(self.heads.read().clone())
    }

    fn persist_heads(&self, heads: &BTreeMap<String, Reference>) -> VaultResult<()> {
        *self.heads.write() = heads.clone();
        Ok(())
    }
}
