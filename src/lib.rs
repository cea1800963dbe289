//! VaultDB - Embedded versioned map store
//!
//! VaultDB stores immutable values by content reference and keeps named
//! datasets whose heads move only through optimistic commits.
//!
//! # Quick Start
//!
//! ```ignore
//! use vaultdb::{Database, save_record, load_record};
//!
//! // Create an in-memory database
//! let db = Database::ephemeral()?;
//! let ds = db.dataset("identities")?;
//!
//! // Store a record in the dataset's head map
//! save_record(&ds, "alice", &alice)?;
//!
//! // Retrieve it
//! let alice: Option<Identity> = load_record(&ds, "alice")?;
//! ```
//!
//! # Architecture
//!
//! - `vault-core`: Value, Reference, Commit, errors, store traits
//! - `vault-durability`: on-disk formats (manifest, value log, head table)
//! - `vault-storage`: MemoryStore and LocalStore
//! - `vault-concurrency`: compare-and-swap head manager
//! - `vault-engine`: Database, Dataset, record maps

pub mod identity;

pub use vault_core::{
    marshal, unmarshal, Commit, DatasetName, HeadStore, Reference, Store, StoreStats, Value,
    ValueStore, VaultError, VaultResult,
};
pub use vault_durability::DurabilityMode;
pub use vault_engine::{
    load_map, load_record, save_record, Database, Dataset, RecordMap, VaultConfig,
    CONFIG_FILE_NAME,
};
pub use vault_storage::{LocalStore, MemoryStore, StoreConfig};

pub use identity::{Certificate, Device, Identity, IdentityRepository, IDENTITIES_DATASET};
