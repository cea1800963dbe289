//! HEADS file format and crash-safe replacement
//!
//! ```text
//! ┌────────────┬──────────────────┬──────────────────────────┬──────────┐
//! │ Magic (4)  │ Format Ver (4)   │ bincode(BTreeMap) (var)  │ CRC32 (4)│
//! └────────────┴──────────────────┴──────────────────────────┴──────────┘
//! ```
//!
//! The table is replaced with the write-fsync-rename pattern:
//! 1. Write to `.HEADS.tmp`
//! 2. fsync the temporary file
//! 3. Atomic rename over `HEADS`
//! 4. fsync the parent directory
//!
//! Either the complete old table or the complete new table is visible after
//! a crash, never a mix.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use vault_core::{Reference, VaultError, VaultResult};

/// Magic bytes identifying a HEADS file: "VLTH"
pub const HEADS_MAGIC: [u8; 4] = *b"VLTH";

/// Current HEADS format version
pub const HEADS_FORMAT_VERSION: u32 = 1;

/// Encode a head table
pub fn encode_heads(heads: &BTreeMap<String, Reference>) -> VaultResult<Vec<u8>> {
    let body = bincode::serialize(heads)
        .map_err(|e| VaultError::storage(format!("failed to encode heads: {}", e)))?;
    let mut bytes = Vec::with_capacity(8 + body.len() + 4);
    bytes.extend_from_slice(&HEADS_MAGIC);
    bytes.extend_from_slice(&HEADS_FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&body);
    let crc = crc32fast::hash(&bytes);
    bytes.extend_from_slice(&crc.to_le_bytes());
    Ok(bytes)
}

/// Decode and validate a head table
pub fn decode_heads(bytes: &[u8]) -> VaultResult<BTreeMap<String, Reference>> {
    if bytes.len() < 12 {
        return Err(VaultError::corruption("HEADS file truncated"));
    }
    let (content, crc_bytes) = bytes.split_at(bytes.len() - 4);
    let stored_crc = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    if crc32fast::hash(content) != stored_crc {
        return Err(VaultError::corruption("HEADS checksum mismatch"));
    }
    if content[0..4] != HEADS_MAGIC {
        return Err(VaultError::corruption("HEADS has bad magic"));
    }
    let version = u32::from_le_bytes([content[4], content[5], content[6], content[7]]);
    if version != HEADS_FORMAT_VERSION {
        return Err(VaultError::corruption(format!(
            "unsupported HEADS format version {}",
            version
        )));
    }
    bincode::deserialize(&content[8..])
        .map_err(|e| VaultError::corruption(format!("undecodable HEADS body: {}", e)))
}

/// Read the head table, treating a missing file as empty
pub fn read_heads(path: &Path) -> VaultResult<BTreeMap<String, Reference>> {
    match std::fs::read(path) {
        Ok(bytes) => decode_heads(&bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

/// Replace the head table crash-safely
pub fn write_heads_atomic(
    path: &Path,
    tmp_path: &Path,
    heads: &BTreeMap<String, Reference>,
) -> VaultResult<()> {
    let bytes = encode_heads(heads)?;

    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(tmp_path)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(tmp_path, path)?;

    if let Some(parent) = path.parent() {
        sync_dir(parent)?;
    }
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    // Directories cannot be opened for sync on this platform
    Ok(())
}
