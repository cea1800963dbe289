//! Store directory structure
//!
//! A local store is a portable directory containing all state:
//!
//! ```text
//! store/
//! ├── MANIFEST         # Store identity and format version
//! ├── HEADS            # Dataset head table (replaced atomically)
//! ├── LOCK             # Exclusive process lock
//! └── VALUES/
//!     └── values.log   # Append-only value log
//! ```

use std::path::{Path, PathBuf};

/// Store directory paths
#[derive(Debug, Clone)]
pub struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    /// Create paths from root directory
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        StorePaths {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root store directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// MANIFEST file path
    pub fn manifest(&self) -> PathBuf {
        self.root.join("MANIFEST")
    }

    /// HEADS file path
    pub fn heads(&self) -> PathBuf {
        self.root.join("HEADS")
    }

    /// Temporary HEADS file used during atomic replacement
    pub fn heads_tmp(&self) -> PathBuf {
        self.root.join(".HEADS.tmp")
    }

    /// LOCK file path
    pub fn lock(&self) -> PathBuf {
        self.root.join("LOCK")
    }

    /// Value directory
    pub fn values_dir(&self) -> PathBuf {
        self.root.join("VALUES")
    }

    /// Value log path
    pub fn value_log(&self) -> PathBuf {
        self.values_dir().join("values.log")
    }

    /// A store exists if the MANIFEST file is present
    pub fn exists(&self) -> bool {
        self.manifest().exists()
    }

    /// Create the full directory structure
    pub fn create_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.values_dir())?;
        Ok(())
    }

    /// Validate that an existing store is complete
    pub fn validate(&self) -> Result<(), StorePathError> {
        if !self.root.exists() {
            return Err(StorePathError::NotFound {
                path: self.root.clone(),
            });
        }
        if !self.manifest().exists() {
            return Err(StorePathError::MissingManifest {
                path: self.manifest(),
            });
        }
        if !self.values_dir().exists() {
            return Err(StorePathError::MissingValuesDir {
                path: self.values_dir(),
            });
        }
        Ok(())
    }
}

/// Store path validation errors
#[derive(Debug, thiserror::Error)]
pub enum StorePathError {
    /// Store not found at path
    #[error("Store not found at {path}")]
    NotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// Missing MANIFEST file
    #[error("Missing MANIFEST at {path}")]
    MissingManifest {
        /// Expected MANIFEST path
        path: PathBuf,
    },

    /// Missing VALUES directory
    #[error("Missing VALUES directory at {path}")]
    MissingValuesDir {
        /// Expected VALUES directory path
        path: PathBuf,
    },
}

impl From<StorePathError> for vault_core::VaultError {
    fn from(e: StorePathError) -> Self {
        vault_core::VaultError::corruption(e.to_string())
    }
}
