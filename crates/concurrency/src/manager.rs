//! Head manager for coordinating dataset head swaps
//!
//! Every dataset head change goes through one [`HeadManager`]. A swap is
//! first-committer-wins: it succeeds only if the head still equals the
//! caller's expectation.
//!
//! ## Swap Sequence
//!
//! ```text
//! 1. Acquire the commit lock
//! 2. Compare current head with expected
//! 3. IF mismatch: return ConcurrentModification
//! 4. Build the next table (clone + change)
//! 5. persist_heads(next)   (DURABILITY POINT)
//! 6. Publish next table
//! 7. Increment version
//! ```
//!
//! The published table sits behind its own `RwLock`, held only to read or
//! replace an `Arc`. Readers never wait on step 5. If step 5 fails nothing
//! is published, so readers never see a head the store has not persisted.

use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use vault_core::{Reference, Store, VaultError, VaultResult};

/// Serializes head swaps for every dataset in one store
pub struct HeadManager {
    store: Arc<dyn Store>,

    /// Held for the whole swap, including persistence
    commit_lock: Mutex<()>,

    /// Last persisted head table
    heads: RwLock<Arc<BTreeMap<String, Reference>>>,

    /// Number of successful head changes since open
    version: AtomicU64,
}

impl HeadManager {
    /// Load the head table from `store`
    pub fn open(store: Arc<dyn Store>) -> VaultResult<Self> {
        let heads = store.load_heads()?;
        debug!(target: "vault::commit", datasets = heads.len(), "Head table loaded");
        Ok(HeadManager {
            store,
            commit_lock: Mutex::new(()),
            heads: RwLock::new(Arc::new(heads)),
            version: AtomicU64::new(0),
        })
    }

    fn published(&self) -> Arc<BTreeMap<String, Reference>> {
        Arc::clone(&*self.heads.read())
    }

    /// Current head of `dataset`
    pub fn head(&self, dataset: &str) -> Option<Reference> {
        self.heads.read().get(dataset).copied()
    }

    /// Names of every dataset with a head, in order
    pub fn list(&self) -> Vec<String> {
        self.published().keys().cloned().collect()
    }

    /// Copy of the whole head table
    pub fn snapshot(&self) -> BTreeMap<String, Reference> {
        self.published().as_ref().clone()
    }

    /// Successful head changes since open
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Move `dataset`'s head from `expected` to `new`
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` if the current head is not `expected`
    /// - Any error from persisting the head table; the head is unchanged
    pub fn compare_and_swap(
        &self,
        dataset: &str,
        expected: Option<Reference>,
        new: Reference,
    ) -> VaultResult<u64> {
        self.swap(dataset, expected, Some(new))
    }

    /// Remove `dataset`'s head if it is still `expected`
    ///
    /// Deleting a dataset that has no head while expecting none is a no-op.
    pub fn delete(&self, dataset: &str, expected: Option<Reference>) -> VaultResult<u64> {
        self.swap(dataset, expected, None)
    }

    fn swap(
        &self,
        dataset: &str,
        expected: Option<Reference>,
        new: Option<Reference>,
    ) -> VaultResult<u64> {
        let _commit = self.commit_lock.lock();
        let current = self.published();
        let actual = current.get(dataset).copied();
        if actual != expected {
            warn!(
                target: "vault::commit",
                dataset,
                expected = %head_label(expected),
                actual = %head_label(actual),
                "Head moved by another writer"
            );
            return Err(VaultError::concurrent_modification(dataset, expected, actual));
        }
        if actual == new {
            return Ok(self.version());
        }

        let mut next = current.as_ref().clone();
        match new {
            Some(r) => {
                next.insert(dataset.to_string(), r);
            }
            None => {
                next.remove(dataset);
            }
        }
        self.store.persist_heads(&next)?;
        *self.heads.write() = Arc::new(next);

        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            target: "vault::commit",
            dataset,
            head = %head_label(new),
            version,
            "Head swapped"
        );
        Ok(version)
    }
}

fn head_label(head: Option<Reference>) -> String {
    head.map(|r| r.short()).unwrap_or_else(|| "none".to_string())
}
