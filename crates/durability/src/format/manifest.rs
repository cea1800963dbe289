//! MANIFEST file format
//!
//! ```text
//! ┌────────────┬──────────────────┬────────────────┬──────────┐
//! │ Magic (4)  │ Format Ver (4)   │ Store UUID (16)│ CRC32 (4)│
//! └────────────┴──────────────────┴────────────────┴──────────┘
//! ```
//!
//! Written once when the store is created and validated on every open.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use uuid::Uuid;
use vault_core::{VaultError, VaultResult};

/// Magic bytes identifying a MANIFEST: "VLTM"
pub const MANIFEST_MAGIC: [u8; 4] = *b"VLTM";

/// Current store format version
pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Size of the MANIFEST in bytes
pub const MANIFEST_SIZE: usize = 4 + 4 + 16 + 4;

/// Physical metadata of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Manifest {
    /// Format version the store was written with
    pub format_version: u32,
    /// Unique identity of the store
    pub store_uuid: Uuid,
}

impl Manifest {
    /// Create a manifest for a fresh store
    pub fn new() -> Self {
        Manifest {
            format_version: MANIFEST_FORMAT_VERSION,
            store_uuid: Uuid::new_v4(),
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> [u8; MANIFEST_SIZE] {
        let mut bytes = [0u8; MANIFEST_SIZE];
        bytes[0..4].copy_from_slice(&MANIFEST_MAGIC);
        bytes[4..8].copy_from_slice(&self.format_version.to_le_bytes());
        bytes[8..24].copy_from_slice(self.store_uuid.as_bytes());
        let crc = crc32fast::hash(&bytes[0..24]);
        bytes[24..28].copy_from_slice(&crc.to_le_bytes());
        bytes
    }

    /// Deserialize and validate
    pub fn from_bytes(bytes: &[u8]) -> VaultResult<Self> {
        if bytes.len() != MANIFEST_SIZE {
            return Err(VaultError::corruption(format!(
                "MANIFEST is {} bytes, expected {}",
                bytes.len(),
                MANIFEST_SIZE
            )));
        }
        if bytes[0..4] != MANIFEST_MAGIC {
            return Err(VaultError::corruption("MANIFEST has bad magic"));
        }
        let stored_crc = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);
        if crc32fast::hash(&bytes[0..24]) != stored_crc {
            return Err(VaultError::corruption("MANIFEST checksum mismatch"));
        }
        let format_version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if format_version != MANIFEST_FORMAT_VERSION {
            return Err(VaultError::corruption(format!(
                "unsupported store format version {} (expected {})",
                format_version, MANIFEST_FORMAT_VERSION
            )));
        }
        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&bytes[8..24]);
        Ok(Manifest {
            format_version,
            store_uuid: Uuid::from_bytes(uuid),
        })
    }

    /// Write a new MANIFEST; fails if one already exists
    pub fn create(&self, path: &Path) -> VaultResult<()> {
        let mut file = OpenOptions::new().create_new(true).write(true).open(path)?;
        file.write_all(&self.to_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    /// Read and validate an existing MANIFEST
    pub fn load(path: &Path) -> VaultResult<Self> {
        let mut bytes = Vec::with_capacity(MANIFEST_SIZE);
        File::open(path)?.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}
