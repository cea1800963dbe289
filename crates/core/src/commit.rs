//! Commit objects
//!
//! A dataset head points at a commit, not directly at the committed value.
//! The commit is itself a [`Value`] stored in the value store:
//!
//! ```text
//! Map {
//!     "value":   Ref(<committed value>),
//!     "parents": List[Ref(<previous head>)],   // empty for a root commit
//!     "height":  Int(1 + parent height),
//!     "meta":    Map { "timestamp": Int(<µs since epoch>) },
//! }
//! ```
//!
//! Height grows by one per commit, so sequential commits strictly advance
//! the head.

use crate::error::{VaultError, VaultResult};
use crate::reference::Reference;
use crate::value::Value;
use chrono::Utc;
use std::collections::BTreeMap;

const FIELD_VALUE: &str = "value";
const FIELD_PARENTS: &str = "parents";
const FIELD_HEIGHT: &str = "height";
const FIELD_META: &str = "meta";
const META_TIMESTAMP: &str = "timestamp";

/// A node in a dataset's commit graph
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// Reference to the committed value
    pub value: Reference,
    /// Previous head, if any
    pub parents: Vec<Reference>,
    /// Distance from the root commit (root = 1)
    pub height: u64,
    /// Commit time in microseconds since the Unix epoch
    pub timestamp: i64,
}

impl Commit {
    /// Build a commit on top of an optional parent
    ///
    /// `parent_height` is ignored when `parent` is `None`.
    pub fn new(value: Reference, parent: Option<Reference>, parent_height: u64) -> Self {
        let (parents, height) = match parent {
            Some(p) => (vec![p], parent_height + 1),
            None => (Vec::new(), 1),
        };
        Commit {
            value,
            parents,
            height,
            timestamp: Utc::now().timestamp_micros(),
        }
    }

    /// The single parent of a linear history, if any
    pub fn parent(&self) -> Option<Reference> {
        self.parents.first().copied()
    }

    /// Encode as a storable value
    pub fn to_value(&self) -> Value {
        let mut meta = BTreeMap::new();
        meta.insert(META_TIMESTAMP.to_string(), Value::Int(self.timestamp));

        let mut fields = BTreeMap::new();
        fields.insert(FIELD_VALUE.to_string(), Value::Ref(self.value));
        fields.insert(
            FIELD_PARENTS.to_string(),
            Value::List(self.parents.iter().copied().map(Value::Ref).collect()),
        );
        fields.insert(FIELD_HEIGHT.to_string(), Value::Int(self.height as i64));
        fields.insert(FIELD_META.to_string(), Value::Map(meta));
        Value::Map(fields)
    }

    /// Decode from a stored value
    pub fn from_value(value: &Value) -> VaultResult<Self> {
        let fields = value
            .as_map()
            .ok_or_else(|| not_a_commit(format!("expected Map, found {}", value.type_name())))?;

        let committed = field(fields, FIELD_VALUE)?
            .as_ref_value()
            .ok_or_else(|| not_a_commit("'value' is not a Ref"))?;

        let parents = field(fields, FIELD_PARENTS)?
            .as_list()
            .ok_or_else(|| not_a_commit("'parents' is not a List"))?
            .iter()
            .map(|p| {
                p.as_ref_value()
                    .ok_or_else(|| not_a_commit("parent entry is not a Ref"))
            })
            .collect::<VaultResult<Vec<_>>>()?;

        let height = field(fields, FIELD_HEIGHT)?
            .as_int()
            .filter(|h| *h > 0)
            .ok_or_else(|| not_a_commit("'height' is not a positive Int"))? as u64;

        let timestamp = field(fields, FIELD_META)?
            .as_map()
            .and_then(|m| m.get(META_TIMESTAMP))
            .and_then(Value::as_int)
            .ok_or_else(|| not_a_commit("'meta.timestamp' missing"))?;

        Ok(Commit {
            value: committed,
            parents,
            height,
            timestamp,
        })
    }
}

fn field<'a>(fields: &'a BTreeMap<String, Value>, name: &str) -> VaultResult<&'a Value> {
    fields
        .get(name)
        .ok_or_else(|| not_a_commit(format!("missing field '{}'", name)))
}

fn not_a_commit(detail: impl std::fmt::Display) -> VaultError {
    VaultError::marshal(format!("not a commit: {}", detail))
}
