//! Store construction parameters

use vault_core::{VaultError, VaultResult};
use vault_durability::DurabilityMode;

/// Default memtable size: 8 MiB
pub const DEFAULT_MEM_TABLE_SIZE: usize = 8 * (1 << 20);

/// Default expected value count for memory stores
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Configuration passed to store construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Bytes of encoded values a local store buffers before writing them
    /// to the value log
    pub mem_table_size: usize,
    /// When buffered values reach disk
    pub durability: DurabilityMode,
    /// Expected number of values (pre-sizes in-memory maps)
    pub initial_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            mem_table_size: DEFAULT_MEM_TABLE_SIZE,
            durability: DurabilityMode::Standard,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl StoreConfig {
    /// Reject configurations no store can honor
    pub fn validate(&self) -> VaultResult<()> {
        if self.mem_table_size == 0 {
            return Err(VaultError::invalid_input("mem_table_size must be > 0"));
        }
        Ok(())
    }

    /// Set the memtable size
    pub fn with_mem_table_size(mut self, bytes: usize) -> Self {
        self.mem_table_size = bytes;
        self
    }

    /// Set the durability mode
    pub fn with_durability(mut self, durability: DurabilityMode) -> Self {
        self.durability = durability;
        self
    }
}
