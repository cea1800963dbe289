//! Global database registry for singleton management
//!
//! Ensures only one Database instance exists per filesystem path.
//! Uses weak references to allow cleanup when all references are dropped.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Weak;

use super::Database;

// =============================================================================
// Global Database Registry
// =============================================================================
//
// Opening the same database path twice returns the same Database instance.
// A second instance could not open the store anyway: the store's lock file
// is held by the first.

/// Global registry of open databases (path -> weak reference)
pub(super) static OPEN_DATABASES: Lazy<Mutex<HashMap<PathBuf, Weak<Database>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Drop the registry entry for `path` if its database is gone
pub(super) fn unregister(path: &Path) {
    let mut registry = OPEN_DATABASES.lock();
    let expired = registry
        .get(path)
        .map_or(false, |weak| weak.upgrade().is_none());
    if expired {
        registry.remove(path);
    }
}
