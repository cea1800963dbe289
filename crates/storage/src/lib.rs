//! Storage layer for VaultDB
//!
//! This crate implements the value stores:
//! - MemoryStore: DashMap-based, nothing durable (tests, caches)
//! - LocalStore: directory-backed, memtable + append-only value log
//! - StoreConfig: explicit construction parameters
//!
//! Both implement `ValueStore` and `HeadStore` from `vault-core`, so the
//! engine treats them interchangeably.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod local;
pub mod memory;

pub use config::{StoreConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_MEM_TABLE_SIZE};
pub use local::LocalStore;
pub use memory::MemoryStore;
