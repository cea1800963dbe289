//! Database engine for VaultDB
//!
//! This crate orchestrates all lower layers:
//! - Database: open/close, configuration, dataset registry
//! - Dataset: optimistic commits of versioned values
//! - RecordMap: read-modify-commit of identifier → record maps
//! - Instrumentation: commit-phase timing behind `perf-trace`
//!
//! The engine is the only component that knows about:
//! - Commit objects and their parent chain
//! - Cross-layer coordination (value store + head manager)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod dataset;
pub mod instrumentation;
pub mod record_map;

pub use database::{Database, PersistenceMode, VaultConfig, CONFIG_FILE_NAME};
pub use dataset::Dataset;
pub use instrumentation::CommitTrace;
pub use record_map::{load_map, load_record, save_record, RecordMap};
