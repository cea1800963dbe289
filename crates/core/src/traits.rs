//! Core traits for value and head storage
//!
//! These traits let the engine swap the in-memory store for the on-disk one
//! without touching the commit protocol.
//!
//! Thread safety: all methods must be safe to call concurrently from
//! multiple threads (requires Send + Sync).

use crate::error::VaultResult;
use crate::reference::Reference;
use crate::value::Value;
use std::collections::BTreeMap;

/// Counters describing a store's contents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of distinct values stored
    pub values: usize,
    /// Encoded bytes across all stored values
    pub bytes: u64,
    /// Encoded bytes buffered but not yet durable
    pub pending_bytes: u64,
}

/// Durable storage of immutable values
pub trait ValueStore: Send + Sync {
    /// Store a value and return its reference
    ///
    /// Idempotent: storing a structurally identical value again returns the
    /// same reference and stores nothing new.
    ///
    /// # Errors
    ///
    /// Returns `Storage` or `Io` if the value cannot be written.
    fn put(&self, value: &Value) -> VaultResult<Reference>;

    /// Retrieve a previously stored value
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the reference is unknown.
    fn get(&self, reference: &Reference) -> VaultResult<Value>;

    /// Check whether a reference is known
    fn has(&self, reference: &Reference) -> bool;

    /// Make every buffered put durable
    fn flush(&self) -> VaultResult<()>;

    /// Current counters
    fn stats(&self) -> StoreStats;
}

/// Persisted table of dataset heads
///
/// The table is replaced as a whole. Callers serialize access; the head
/// manager in the concurrency crate is the only writer.
pub trait HeadStore: Send + Sync {
    /// Load all dataset heads
    fn load_heads(&self) -> VaultResult<BTreeMap<String, Reference>>;

    /// Atomically replace the head table
    fn persist_heads(&self, heads: &BTreeMap<String, Reference>) -> VaultResult<()>;
}

/// A store that holds both values and heads
pub trait Store: ValueStore + HeadStore {}

impl<T: ValueStore + HeadStore> Store for T {}
