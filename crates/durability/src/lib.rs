//! Durability layer for VaultDB
//!
//! This crate handles everything that touches disk:
//!
//! - Store directory layout (MANIFEST, HEADS, LOCK, value log)
//! - Binary on-disk formats with CRC32 validation
//! - Append-only value log with torn-tail recovery
//! - Crash-safe head table replacement
//! - Durability modes: Standard (default), Always

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod format;
pub mod mode;
pub mod value_log;

pub use database::{StorePathError, StorePaths};
pub use format::{Manifest, ValueRecord};
pub use mode::DurabilityMode;
pub use value_log::{open_log, LogEntry, LogReader, LogWriter, RecoveredLog};
