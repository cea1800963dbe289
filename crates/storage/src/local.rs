//! Directory-backed value store
//!
//! Values and heads survive process restarts.
//!
//! # Write Path
//!
//! ```text
//! put(value)
//!   ├─ already indexed or buffered? → return reference
//!   ├─ Always mode  → append to log, fsync, index
//!   └─ Standard mode → buffer in memtable
//!                       (memtable full → append buffered records to log)
//! flush()
//!   └─ append memtable to log, fsync, index, clear memtable
//! ```
//!
//! # Read Path
//!
//! Buffered values first, then the index. Neither takes the memtable
//! lock. A flush indexes records before dropping them from the buffered
//! map, so a reader never misses a value in between.
//!
//! # Locking
//!
//! Lock order is memtable → writer. Only writers take the memtable lock.
//! The reader handle has its own lock so reads of flushed values never
//! wait on log appends.

use crate::config::StoreConfig;
use dashmap::DashMap;
use fs2::FileExt;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};
use vault_core::{HeadStore, Reference, StoreStats, Value, ValueStore, VaultError, VaultResult};
use vault_durability::format::{read_heads, write_heads_atomic, ValueRecord};
use vault_durability::{open_log, LogEntry, LogReader, LogWriter, Manifest, StorePaths};

/// Records accepted but not yet written to the log
#[derive(Default)]
struct MemTable {
    records: Vec<ValueRecord>,
    bytes: usize,
}

/// Value and head storage in a local directory
pub struct LocalStore {
    paths: StorePaths,
    manifest: Manifest,
    config: StoreConfig,
    index: DashMap<Reference, LogEntry>,
    memtable: Mutex<MemTable>,
    /// Decoded values of the memtable's records, readable without its lock
    buffered: DashMap<Reference, Value>,
    writer: Mutex<LogWriter>,
    reader: Mutex<LogReader>,
    heads_lock: Mutex<()>,
    bytes: AtomicU64,
    /// Exclusive lock held for the lifetime of the store
    lock_file: File,
}

impl LocalStore {
    /// Open or create a store rooted at `path`
    ///
    /// # Errors
    ///
    /// - `Storage` if another handle holds the store's lock
    /// - `Corruption` if the MANIFEST or value log fail validation
    /// - `InvalidInput` if the configuration is invalid
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> VaultResult<Self> {
        config.validate()?;
        let paths = StorePaths::from_root(path);
        paths.create_directories()?;

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(paths.lock())?;
        lock_file.try_lock_exclusive().map_err(|e| {
            VaultError::storage(format!(
                "store at {} is locked by another handle: {}",
                paths.root().display(),
                e
            ))
        })?;

        let manifest = if paths.exists() {
            paths.validate()?;
            Manifest::load(&paths.manifest())?
        } else {
            let manifest = Manifest::new();
            manifest.create(&paths.manifest())?;
            manifest
        };

        let recovered = open_log(&paths.value_log())?;
        let index = DashMap::with_capacity(recovered.entries.len().max(config.initial_capacity));
        let mut bytes = 0u64;
        for entry in recovered.entries {
            bytes += entry.len as u64;
            index.insert(entry.reference, entry);
        }

        info!(
            target: "vault::store",
            path = %paths.root().display(),
            store_uuid = %manifest.store_uuid,
            values = index.len(),
            truncated_bytes = recovered.truncated_bytes,
            durability = config.durability.description(),
            "Local store opened"
        );

        Ok(LocalStore {
            paths,
            manifest,
            config,
            index,
            memtable: Mutex::new(MemTable::default()),
            buffered: DashMap::new(),
            writer: Mutex::new(recovered.writer),
            reader: Mutex::new(recovered.reader),
            heads_lock: Mutex::new(()),
            bytes: AtomicU64::new(bytes),
            lock_file,
        })
    }

    /// Root directory of the store
    pub fn path(&self) -> &Path {
        self.paths.root()
    }

    /// Store identity from the MANIFEST
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Configuration the store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn append_locked(&self, records: &[ValueRecord], sync: bool) -> VaultResult<()> {
        let mut writer = self.writer.lock();
        let entries = writer.append(records)?;
        if sync {
            writer.sync()?;
        }
        for entry in entries {
            self.index.insert(entry.reference, entry);
        }
        Ok(())
    }

    fn flush_memtable(&self, memtable: &mut MemTable, sync: bool) -> VaultResult<()> {
        if memtable.records.is_empty() {
            if sync {
                self.writer.lock().sync()?;
            }
            return Ok(());
        }
        let count = memtable.records.len();
        let bytes = memtable.bytes;
        self.append_locked(&memtable.records, sync)?;
        for record in memtable.records.drain(..) {
            self.buffered.remove(&record.reference);
        }
        memtable.bytes = 0;
        debug!(target: "vault::store", records = count, bytes, sync, "Memtable flushed");
        Ok(())
    }
}

impl ValueStore for LocalStore {
    fn put(&self, value: &Value) -> VaultResult<Reference> {
        let record = ValueRecord::encode(value)?;
        let reference = record.reference;
        if self.index.contains_key(&reference) {
            return Ok(reference);
        }

        let mut memtable = self.memtable.lock();
        if self.buffered.contains_key(&reference) || self.index.contains_key(&reference) {
            return Ok(reference);
        }

        let payload_len = record.payload.len();
        if self.config.durability.requires_immediate_fsync() {
            self.append_locked(std::slice::from_ref(&record), true)?;
        } else {
            if !memtable.records.is_empty()
                && memtable.bytes + record.encoded_len() > self.config.mem_table_size
            {
                self.flush_memtable(&mut memtable, false)?;
            }
            memtable.bytes += record.encoded_len();
            self.buffered.insert(reference, value.clone());
            memtable.records.push(record);
        }
        self.bytes.fetch_add(payload_len as u64, Ordering::Relaxed);

        debug!(target: "vault::store", reference = %reference.short(), bytes = payload_len, "Value stored");
        Ok(reference)
    }

    fn get(&self, reference: &Reference) -> VaultResult<Value> {
        if let Some(value) = self.buffered.get(reference) {
            return Ok(value.value().clone());
        }
        let entry = match self.index.get(reference) {
            Some(entry) => *entry,
            None => return Err(VaultError::not_found(*reference)),
        };
        self.reader.lock().read(&entry)
    }

    fn has(&self, reference: &Reference) -> bool {
        self.buffered.contains_key(reference) || self.index.contains_key(reference)
    }

    fn flush(&self) -> VaultResult<()> {
        let mut memtable = self.memtable.lock();
        self.flush_memtable(&mut memtable, true)
    }

    fn stats(&self) -> StoreStats {
        let memtable = self.memtable.lock();
        StoreStats {
            values: self.index.len() + memtable.records.len(),
            bytes: self.bytes.load(Ordering::Relaxed),
            pending_bytes: memtable.bytes as u64,
        }
    }
}

impl HeadStore for LocalStore {
    fn load_heads(&self) -> VaultResult<BTreeMap<String, Reference>> {
        let _guard = self.heads_lock.lock();
        read_heads(&self.paths.heads())
    }

    fn persist_heads(&self, heads: &BTreeMap<String, Reference>) -> VaultResult<()> {
        let _guard = self.heads_lock.lock();
        write_heads_atomic(&self.paths.heads(), &self.paths.heads_tmp(), heads)
    }
}

impl Drop for LocalStore {
    fn drop(&mut self) {
        let memtable = self.memtable.get_mut();
        if !memtable.records.is_empty() {
            let records = std::mem::take(&mut memtable.records);
            let writer = self.writer.get_mut();
            let result = writer.append(&records).and_then(|_| writer.sync());
            if let Err(e) = result {
                warn!(
                    target: "vault::store",
                    path = %self.paths.root().display(),
                    error = %e,
                    "Failed to flush memtable on close"
                );
            }
        }
        if let Err(e) = FileExt::unlock(&self.lock_file) {
            warn!(target: "vault::store", error = %e, "Failed to release store lock");
        }
        info!(target: "vault::store", path = %self.paths.root().display(), "Local store closed");
    }
}
