//! Record maps: datasets whose head value maps identifiers to records
//!
//! The workflow is read-modify-commit:
//!
//! ```text
//! let mut map = load_map(&ds)?;          // remembers the head it read
//! map.set_record("alice", &identity)?;   // edit the in-memory copy
//! map.commit(&ds)?;                      // fails if the head moved
//! ```
//!
//! Nothing here retries. A `ConcurrentModification` from `commit` means the
//! caller must reload and reapply its edit.

use crate::dataset::Dataset;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use vault_core::{marshal, unmarshal, Commit, Reference, Value, VaultResult};

/// In-memory copy of a record map and the head it was read from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMap {
    base: Option<Reference>,
    entries: BTreeMap<String, Value>,
}

impl RecordMap {
    /// Empty map with no base head
    pub fn new() -> Self {
        Self::default()
    }

    /// Head commit this map was read from
    pub fn base(&self) -> Option<Reference> {
        self.base
    }

    /// Raw entry for `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Decode the entry for `key` into a record
    ///
    /// # Errors
    ///
    /// `Marshal` if the entry does not have the shape of `T`.
    pub fn get_record<T: DeserializeOwned>(&self, key: &str) -> VaultResult<Option<T>> {
        self.entries.get(key).map(unmarshal).transpose()
    }

    /// Insert or overwrite a raw entry
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Marshal `record` and insert or overwrite it under `key`
    pub fn set_record<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        record: &T,
    ) -> VaultResult<()> {
        let value = marshal(record)?;
        self.entries.insert(key.into(), value);
        Ok(())
    }

    /// Remove the entry for `key`
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// True if `key` has an entry
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The map as a storable value
    pub fn to_value(&self) -> Value {
        Value::Map(self.entries.clone())
    }

    /// Commit the edited map with [`base`](Self::base) as the expected head
    ///
    /// On success the map's base becomes the new head, so further edits
    /// can be committed on top of it.
    pub fn commit(&mut self, dataset: &Dataset) -> VaultResult<Reference> {
        let head = dataset.commit(self.base, self.to_value())?;
        self.base = Some(head);
        Ok(head)
    }
}

/// Read the head value of `dataset` as a record map
///
/// A dataset without a head yields an empty map with no base.
///
/// # Errors
///
/// `Marshal` if the head value is not a map.
pub fn load_map(dataset: &Dataset) -> VaultResult<RecordMap> {
    let base = match dataset.head()? {
        Some(r) => r,
        None => return Ok(RecordMap::new()),
    };

    let store = dataset.database().store();
    let commit = Commit::from_value(&store.get(&base)?)?;
    let entries = store.get(&commit.value)?.into_map()?;
    Ok(RecordMap {
        base: Some(base),
        entries,
    })
}

/// Store `record` under `key` in one read-modify-commit cycle
///
/// Returns the new head. Conflicts are returned to the caller.
pub fn save_record<T: Serialize + ?Sized>(
    dataset: &Dataset,
    key: &str,
    record: &T,
) -> VaultResult<Reference> {
    let mut map = load_map(dataset)?;
    map.set_record(key, record)?;
    let head = map.commit(dataset)?;
    debug!(
        target: "vault::commit",
        dataset = dataset.name(),
        key,
        entries = map.len(),
        "Record saved"
    );
    Ok(head)
}

/// Load the record stored under `key`, if any
pub fn load_record<T: DeserializeOwned>(dataset: &Dataset, key: &str) -> VaultResult<Option<T>> {
    load_map(dataset)?.get_record(key)
}
