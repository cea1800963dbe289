//! Content-derived references to stored values
//!
//! A [`Reference`] is the SHA-256 digest of a value's canonical encoding.
//! Two structurally identical values always produce the same reference,
//! which makes `put` idempotent.

use crate::error::{VaultError, VaultResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of a reference digest in bytes
pub const REFERENCE_LEN: usize = 32;

/// Opaque handle to a stored [`Value`]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference([u8; REFERENCE_LEN]);

impl Reference {
    /// Compute the reference for a value
    pub fn of(value: &Value) -> Self {
        Self::of_encoded(&value.canonical_bytes())
    }

    /// Compute the reference for an already-encoded value
    pub fn of_encoded(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut out = [0u8; REFERENCE_LEN];
        out.copy_from_slice(&digest);
        Reference(out)
    }

    /// Wrap raw digest bytes
    pub fn from_bytes(bytes: [u8; REFERENCE_LEN]) -> Self {
        Reference(bytes)
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; REFERENCE_LEN] {
        &self.0
    }

    /// First 8 hex characters, for log lines
    pub fn short(&self) -> String {
        self.to_string()[..8].to_string()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({})", self.short())
    }
}

impl FromStr for Reference {
    type Err = VaultError;

    fn from_str(s: &str) -> VaultResult<Self> {
        if s.len() != REFERENCE_LEN * 2 || !s.is_ascii() {
            return Err(VaultError::invalid_input(format!(
                "reference must be {} hex characters, got '{}'",
                REFERENCE_LEN * 2,
                s
            )));
        }
        let mut out = [0u8; REFERENCE_LEN];
        for (i, byte) in out.iter_mut().enumerate() {
            let pair = &s[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|_| {
                VaultError::invalid_input(format!("invalid hex in reference '{}'", s))
            })?;
        }
        Ok(Reference(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_equal_values_share_reference() {
        let mut a = BTreeMap::new();
        a.insert("x".to_string(), Value::Int(1));
        a.insert("y".to_string(), Value::from("two"));
        let mut b = BTreeMap::new();
        b.insert("y".to_string(), Value::from("two"));
        b.insert("x".to_string(), Value::Int(1));

        assert_eq!(Reference::of(&Value::Map(a)), Reference::of(&Value::Map(b)));
    }

    #[test]
    fn test_different_values_differ() {
        assert_ne!(
            Reference::of(&Value::Int(1)),
            Reference::of(&Value::Float(1.0))
        );
        assert_ne!(
            Reference::of(&Value::from("a")),
            Reference::of(&Value::Bytes(b"a".to_vec()))
        );
    }

    #[test]
    fn test_hex_roundtrip() {
        let r = Reference::of(&Value::from("hello"));
        let text = r.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text.parse::<Reference>().unwrap(), r);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("abc".parse::<Reference>().is_err());
        assert!("zz".repeat(32).parse::<Reference>().is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_value() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(Value::Int),
                (-1.0e12f64..1.0e12).prop_map(Value::Float),
                "[a-z]{0,12}".prop_map(Value::from),
                prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
            ];
            leaf.prop_recursive(3, 32, 4, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                    prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Map),
                ]
            })
        }

        proptest! {
            #[test]
            fn prop_reference_is_deterministic(value in arb_value()) {
                let copy = value.clone();
                prop_assert_eq!(Reference::of(&value), Reference::of(&copy));
                prop_assert_eq!(Reference::of(&value), Reference::of_encoded(&value.canonical_bytes()));
            }

            #[test]
            fn prop_distinct_strings_distinct_references(a in "[a-z]{0,16}", b in "[a-z]{0,16}") {
                prop_assume!(a != b);
                prop_assert_ne!(Reference::of(&Value::from(a)), Reference::of(&Value::from(b)));
            }

            #[test]
            fn prop_display_parses_back(value in arb_value()) {
                let r = Reference::of(&value);
                prop_assert_eq!(r.to_string().parse::<Reference>().unwrap(), r);
            }
        }
    }
}
