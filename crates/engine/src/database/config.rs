//! Database configuration via `vault.toml`
//!
//! On first open, a default `vault.toml` is created in the data directory.
//! To change settings, edit the file and reopen the database.

use serde::{Deserialize, Serialize};
use std::path::Path;
use vault_core::{VaultError, VaultResult};
use vault_durability::DurabilityMode;
use vault_storage::{StoreConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_MEM_TABLE_SIZE};

/// Config file name placed in the database data directory.
pub const CONFIG_FILE_NAME: &str = "vault.toml";

/// Database configuration loaded from `vault.toml`.
///
/// # Example
///
/// ```toml
/// # Durability mode: "standard" (default) or "always"
/// durability = "standard"
/// mem_table_size = 8388608
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultConfig {
    /// Durability mode: `"standard"` or `"always"`.
    #[serde(default = "default_durability_str")]
    pub durability: String,
    /// Bytes of values buffered before they are written to the value log.
    #[serde(default = "default_mem_table_size")]
    pub mem_table_size: usize,
    /// Expected number of values, used to pre-size in-memory maps.
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
}

fn default_durability_str() -> String {
    "standard".to_string()
}

fn default_mem_table_size() -> usize {
    DEFAULT_MEM_TABLE_SIZE
}

fn default_initial_capacity() -> usize {
    DEFAULT_INITIAL_CAPACITY
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            durability: default_durability_str(),
            mem_table_size: default_mem_table_size(),
            initial_capacity: default_initial_capacity(),
        }
    }
}

impl VaultConfig {
    /// Parse the durability string into a `DurabilityMode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"standard"` or `"always"`.
    pub fn durability_mode(&self) -> VaultResult<DurabilityMode> {
        match self.durability.as_str() {
            "standard" => Ok(DurabilityMode::Standard),
            "always" => Ok(DurabilityMode::Always),
            other => Err(VaultError::invalid_input(format!(
                "Invalid durability mode '{}' in vault.toml. Expected \"standard\" or \"always\".",
                other
            ))),
        }
    }

    /// Build the store configuration this config describes.
    pub fn to_store_config(&self) -> VaultResult<StoreConfig> {
        let config = StoreConfig {
            mem_table_size: self.mem_table_size,
            durability: self.durability_mode()?,
            initial_capacity: self.initial_capacity,
        };
        config.validate()?;
        Ok(config)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# VaultDB configuration
#
# Durability mode: "standard" (default) or "always"
#   "standard" = values buffered in memory, fsynced at every commit
#   "always"   = every stored value written through and fsynced
durability = "standard"

# Bytes of values buffered before they are written to the value log (8 MiB)
mem_table_size = 8388608

# Expected number of values, used to pre-size in-memory maps
initial_capacity = 1024
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> VaultResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VaultError::storage(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: VaultConfig = toml::from_str(&content).map_err(|e| {
            VaultError::invalid_input(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.to_store_config()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> VaultResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                VaultError::storage(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> VaultResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VaultError::storage(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            VaultError::storage(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
