//! Database struct and open/close logic
//!
//! This module provides the main Database struct that orchestrates:
//! - Store initialization (LocalStore on disk, MemoryStore when ephemeral)
//! - Head table loading
//! - Dataset handles
//!
//! ## Dataset API
//!
//! ```text
//! use vault_engine::Database;
//!
//! let db = Database::open("/path/to/data")?;
//! let ds = db.dataset("identities")?;
//! let head = ds.head()?;
//! ds.commit(head, value)?;
//! ```

pub mod config;
mod registry;

pub use config::{VaultConfig, CONFIG_FILE_NAME};

use crate::dataset::Dataset;
use registry::OPEN_DATABASES;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use vault_concurrency::HeadManager;
use vault_core::{DatasetName, Reference, Store, StoreStats, VaultResult};
use vault_storage::{LocalStore, MemoryStore};

/// Where a database keeps its values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceMode {
    /// Memory only, lost on drop
    Ephemeral,
    /// Directory-backed, survives restarts
    Disk,
}

/// Main database struct
///
/// Owns one store and the head table of every dataset in it.
/// Shared as `Arc<Database>`; dataset handles keep the database alive.
pub struct Database {
    /// Data directory path (empty for ephemeral databases)
    data_dir: PathBuf,

    /// Values and the persisted head table
    store: Arc<dyn Store>,

    /// Serialized head swaps for every dataset
    heads: HeadManager,

    /// Configuration (mirrors vault.toml)
    config: VaultConfig,

    /// Persistence mode (ephemeral vs disk-backed)
    persistence_mode: PersistenceMode,
}

impl Database {
    /// Open database at given path
    ///
    /// Reads `vault.toml` from the data directory. If no config file exists,
    /// creates one with defaults.
    ///
    /// # Thread Safety
    ///
    /// Opening the same path from multiple threads returns the same `Arc<Database>`.
    ///
    /// ```text
    /// let db1 = Database::open("/data")?;
    /// let db2 = Database::open("/data")?;  // Same Arc as db1
    /// assert!(Arc::ptr_eq(&db1, &db2));
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> VaultResult<Arc<Self>> {
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        VaultConfig::write_default_if_missing(&config_path)?;
        let cfg = VaultConfig::from_file(&config_path)?;

        Self::open_with_config(path, cfg)
    }

    /// Open database at the given path with an explicit configuration.
    ///
    /// The supplied config is written to `vault.toml` so that subsequent
    /// `Database::open()` calls pick up the same settings.
    pub fn open_with_config<P: AsRef<Path>>(path: P, cfg: VaultConfig) -> VaultResult<Arc<Self>> {
        let store_config = cfg.to_store_config()?;

        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        // Canonicalize path for consistent registry keys
        let canonical_path = data_dir.canonicalize()?;

        // Hold the registry lock for the entire open so only one thread
        // creates a database for a given path.
        let mut registry = OPEN_DATABASES.lock();
        if let Some(db) = registry.get(&canonical_path).and_then(|weak| weak.upgrade()) {
            if db.config != cfg {
                warn!(
                    target: "vault::db",
                    path = ?canonical_path,
                    "Database already open; new configuration applies after reopen"
                );
            }
            info!(target: "vault::db", path = ?canonical_path, "Returning existing database instance");
            return Ok(db);
        }

        cfg.write_to_file(&canonical_path.join(CONFIG_FILE_NAME))?;
        let store: Arc<dyn Store> = Arc::new(LocalStore::open(&canonical_path, store_config)?);
        let heads = HeadManager::open(Arc::clone(&store))?;

        info!(
            target: "vault::db",
            path = ?canonical_path,
            datasets = heads.list().len(),
            durability = %cfg.durability,
            "Database opened"
        );

        let db = Arc::new(Database {
            data_dir: canonical_path.clone(),
            store,
            heads,
            config: cfg,
            persistence_mode: PersistenceMode::Disk,
        });
        registry.insert(canonical_path, Arc::downgrade(&db));
        Ok(db)
    }

    /// Create an ephemeral in-memory database
    ///
    /// Each call returns an independent instance; ephemeral databases are
    /// never registered.
    pub fn ephemeral() -> VaultResult<Arc<Self>> {
        Self::ephemeral_with_config(VaultConfig::default())
    }

    /// Create an ephemeral database with an explicit configuration
    pub fn ephemeral_with_config(cfg: VaultConfig) -> VaultResult<Arc<Self>> {
        let store_config = cfg.to_store_config()?;
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new(&store_config));
        let heads = HeadManager::open(Arc::clone(&store))?;
        Ok(Arc::new(Database {
            data_dir: PathBuf::new(),
            store,
            heads,
            config: cfg,
            persistence_mode: PersistenceMode::Ephemeral,
        }))
    }

    // ========================================================================
    // Datasets
    // ========================================================================

    /// Handle to the dataset called `name`
    ///
    /// The dataset need not exist; it is created by its first commit.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `name` is not a valid dataset name.
    pub fn dataset(self: &Arc<Self>, name: &str) -> VaultResult<Dataset> {
        let name = DatasetName::new(name)?;
        Ok(Dataset::new(Arc::clone(self), name))
    }

    /// Names of every dataset with a head, in order
    pub fn datasets(&self) -> Vec<String> {
        self.heads.list()
    }

    /// Remove a dataset's head if it is still `expected`
    ///
    /// Stored values are left in place.
    ///
    /// # Errors
    ///
    /// `ConcurrentModification` if the head moved.
    pub fn delete_dataset(&self, name: &str, expected: Option<Reference>) -> VaultResult<()> {
        let name = DatasetName::new(name)?;
        self.heads.delete(name.as_str(), expected)?;
        info!(target: "vault::db", dataset = %name, "Dataset deleted");
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub(crate) fn heads(&self) -> &HeadManager {
        &self.heads
    }

    /// Return the configuration this database was opened with.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Check if this is an ephemeral (no-disk) database
    pub fn is_ephemeral(&self) -> bool {
        self.persistence_mode == PersistenceMode::Ephemeral
    }

    /// Get the data directory path.
    ///
    /// Returns an empty path for ephemeral databases.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Value count and byte totals of the store
    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// Make every stored value durable
    pub fn flush(&self) -> VaultResult<()> {
        self.store.flush()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.store.flush() {
            warn!(target: "vault::db", error = %e, "Final flush failed");
        }

        if self.persistence_mode == PersistenceMode::Disk {
            registry::unregister(&self.data_dir);
            info!(target: "vault::db", path = ?self.data_dir, "Database closed");
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("data_dir", &self.data_dir)
            .field("persistence_mode", &self.persistence_mode)
            .field("datasets", &self.heads.list().len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
