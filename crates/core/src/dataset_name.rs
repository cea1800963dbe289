//! Dataset name type
//!
//! A dataset is a named mutable pointer to a head commit. The name is the
//! only identity a dataset has; it is created implicitly by its first commit.
//!
//! ## Validation
//!
//! Dataset names must:
//! - Be 1-256 bytes
//! - Contain only alphanumeric, dash, underscore, dot, slash, colon
//!
//! Any of those characters may come first, so `-x`, `.x` and `/x` are valid.

use crate::error::VaultError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a dataset name
pub const MAX_DATASET_NAME_LENGTH: usize = 256;

/// Validated dataset name
///
/// Valid names:
/// - "identities"
/// - "users/archive"
/// - "audit:2024.q1"
/// - ".hidden"
///
/// Invalid names:
/// - "" (empty)
/// - "has spaces"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetName(String);

/// Error when validating a dataset name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetNameError {
    /// Name is empty
    Empty,
    /// Name exceeds maximum length
    TooLong {
        /// Actual length of the name
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
    /// Name contains invalid character
    InvalidChar {
        /// The invalid character
        char: char,
        /// Position of the invalid character
        position: usize,
    },
}

impl fmt::Display for DatasetNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetNameError::Empty => write!(f, "dataset name cannot be empty"),
            DatasetNameError::TooLong { length, max } => {
                write!(f, "dataset name too long: {} bytes (max {})", length, max)
            }
            DatasetNameError::InvalidChar { char, position } => write!(
                f,
                "invalid character '{}' at position {} in dataset name",
                char, position
            ),
        }
    }
}

impl std::error::Error for DatasetNameError {}

impl From<DatasetNameError> for VaultError {
    fn from(e: DatasetNameError) -> Self {
        VaultError::invalid_input(e.to_string())
    }
}

impl DatasetName {
    /// Create a new DatasetName, validating the input
    pub fn new(name: impl Into<String>) -> Result<Self, DatasetNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(DatasetName(name))
    }

    /// Validate a dataset name
    pub fn validate(name: &str) -> Result<(), DatasetNameError> {
        if name.is_empty() {
            return Err(DatasetNameError::Empty);
        }

        if name.len() > MAX_DATASET_NAME_LENGTH {
            return Err(DatasetNameError::TooLong {
                length: name.len(),
                max: MAX_DATASET_NAME_LENGTH,
            });
        }

        for (pos, ch) in name.chars().enumerate() {
            if !Self::is_valid_char(ch) {
                return Err(DatasetNameError::InvalidChar {
                    char: ch,
                    position: pos,
                });
            }
        }

        Ok(())
    }

    #[inline]
    fn is_valid_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':')
    }

    /// Get the name as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for DatasetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for DatasetName {
    type Error = DatasetNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        DatasetName::new(value)
    }
}

impl TryFrom<String> for DatasetName {
    type Error = DatasetNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DatasetName::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_name_valid() {
        assert!(DatasetName::new("identities").is_ok());
        assert!(DatasetName::new("users/archive").is_ok());
        assert!(DatasetName::new("audit:2024.q1").is_ok());
        assert!(DatasetName::new("_private").is_ok());
    }

    #[test]
    fn test_dataset_name_empty() {
        assert_eq!(DatasetName::new("").unwrap_err(), DatasetNameError::Empty);
    }

    #[test]
    fn test_dataset_name_too_long() {
        let err = DatasetName::new("a".repeat(MAX_DATASET_NAME_LENGTH + 1)).unwrap_err();
        assert!(matches!(err, DatasetNameError::TooLong { .. }));
    }

    #[test]
    fn test_dataset_name_any_allowed_leading_char() {
        for name in ["-x", ".x", "/x", ":x", "_x", "9x", "-", "..", "/"] {
            assert!(DatasetName::new(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_dataset_name_max_length_accepted() {
        assert!(DatasetName::new("a".repeat(MAX_DATASET_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_dataset_name_invalid_leading_char() {
        let err = DatasetName::new(" x").unwrap_err();
        assert_eq!(
            err,
            DatasetNameError::InvalidChar {
                char: ' ',
                position: 0
            }
        );
        assert!(DatasetName::new("éx").is_err());
    }

    #[test]
    fn test_dataset_name_invalid_char() {
        let err = DatasetName::new("has space").unwrap_err();
        assert_eq!(
            err,
            DatasetNameError::InvalidChar {
                char: ' ',
                position: 3
            }
        );
    }

    #[test]
    fn test_into_vault_error() {
        let err: VaultError = DatasetName::new("").unwrap_err().into();
        assert!(matches!(err, VaultError::InvalidInput { .. }));
    }
}
