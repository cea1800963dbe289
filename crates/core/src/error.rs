//! Error types for VaultDB
//!
//! This module defines every error the store can surface. We use `thiserror`
//! for automatic `Display` and `Error` trait implementations.
//!
//! Each variant is a distinct, recoverable condition. Callers match on the
//! variant (or use the `is_*` helpers) to decide whether to retry, re-read,
//! or report.

use crate::reference::Reference;
use std::io;
use thiserror::Error;

/// Result type alias for VaultDB operations
pub type VaultResult<T> = std::result::Result<T, VaultError>;

/// Error types for VaultDB
#[derive(Debug, Error)]
pub enum VaultError {
    /// Storage layer failure (resource exhaustion, lock held, write failed)
    #[error("Storage error: {message}")]
    Storage {
        /// What went wrong
        message: String,
    },

    /// I/O error from the filesystem
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Reference is unknown to the value store
    #[error("Value not found: {reference}")]
    NotFound {
        /// The dangling reference
        reference: Reference,
    },

    /// Optimistic commit lost the race: the dataset head moved
    #[error(
        "Concurrent modification of dataset '{dataset}': expected head {}, found {}",
        display_head(.expected),
        display_head(.actual)
    )]
    ConcurrentModification {
        /// Dataset name
        dataset: String,
        /// Head the caller observed
        expected: Option<Reference>,
        /// Head actually current at commit time
        actual: Option<Reference>,
    },

    /// Value/record conversion failure
    #[error("Marshal error: {message}")]
    Marshal {
        /// What could not be converted
        message: String,
    },

    /// On-disk data failed validation
    #[error("Data corruption: {message}")]
    Corruption {
        /// Description of the corruption
        message: String,
    },

    /// Caller supplied an invalid argument or configuration
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the problem
        message: String,
    },
}

fn display_head(head: &Option<Reference>) -> String {
    match head {
        Some(r) => r.to_string(),
        None => "<none>".to_string(),
    }
}

impl VaultError {
    /// Build a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        VaultError::Storage {
            message: message.into(),
        }
    }

    /// Build a not-found error for a reference
    pub fn not_found(reference: Reference) -> Self {
        VaultError::NotFound { reference }
    }

    /// Build a marshal error
    pub fn marshal(message: impl Into<String>) -> Self {
        VaultError::Marshal {
            message: message.into(),
        }
    }

    /// Build a corruption error
    pub fn corruption(message: impl Into<String>) -> Self {
        VaultError::Corruption {
            message: message.into(),
        }
    }

    /// Build an invalid-input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        VaultError::InvalidInput {
            message: message.into(),
        }
    }

    /// Build a concurrent-modification error
    pub fn concurrent_modification(
        dataset: impl Into<String>,
        expected: Option<Reference>,
        actual: Option<Reference>,
    ) -> Self {
        VaultError::ConcurrentModification {
            dataset: dataset.into(),
            expected,
            actual,
        }
    }

    /// True if an optimistic commit lost the race
    pub fn is_conflict(&self) -> bool {
        matches!(self, VaultError::ConcurrentModification { .. })
    }

    /// True if a reference could not be resolved
    pub fn is_not_found(&self) -> bool {
        matches!(self, VaultError::NotFound { .. })
    }

    /// True if re-reading and repeating the operation may succeed
    ///
    /// Only commit conflicts qualify. Storage, corruption, and marshal
    /// failures will fail again on retry.
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }
}

impl From<bincode::Error> for VaultError {
    fn from(e: bincode::Error) -> Self {
        VaultError::marshal(e.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        VaultError::marshal(e.to_string())
    }
}
