//! Shared test utilities for the integration test suites.
//!
//! Import via `mod common;` from any test file.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Once};
use tempfile::TempDir;
pub use vaultdb::{
    Database, Dataset, Identity, IdentityRepository, Value, VaultConfig, VaultError,
    IDENTITIES_DATASET,
};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness (`RUST_LOG` filters it)
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Create a VaultConfig with always durability mode.
pub fn always_config() -> VaultConfig {
    VaultConfig {
        durability: "always".to_string(),
        ..VaultConfig::default()
    }
}

/// Seeded random source for reproducible fixtures
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

// ============================================================================
// TestDb - Disk-backed test database wrapper
// ============================================================================

/// Test database in a temporary directory
pub struct TestDb {
    pub db: Arc<Database>,
    pub dir: TempDir,
}

impl TestDb {
    /// Create a new test database with standard durability (default for tests).
    pub fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db = Database::open(dir.path()).expect("Failed to create test database");
        TestDb { db, dir }
    }

    /// Create a test database with always durability.
    pub fn new_strict() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db = Database::open_with_config(dir.path(), always_config())
            .expect("Failed to create test database");
        TestDb { db, dir }
    }

    /// Close and reopen the database from the same directory.
    ///
    /// Handles obtained before the reopen keep the old instance alive and
    /// must be dropped first.
    pub fn reopen(&mut self) {
        let path = self.dir.path().to_path_buf();
        drop(std::mem::replace(
            &mut self.db,
            Database::ephemeral().expect("temporary ephemeral db for swap"),
        ));
        self.db = Database::open(&path).expect("Failed to reopen database");
    }

    /// Handle to the identities dataset
    pub fn identities(&self) -> Dataset {
        self.db
            .dataset(IDENTITIES_DATASET)
            .expect("valid dataset name")
    }

    /// Repository over the identities dataset
    pub fn repository(&self) -> IdentityRepository {
        IdentityRepository::open(&self.db).expect("valid dataset name")
    }
}
