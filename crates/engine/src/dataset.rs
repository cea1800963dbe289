//! Named, versioned datasets
//!
//! A dataset is a named slot holding the reference of its head commit. The
//! head only moves through [`Dataset::commit`], which is optimistic: the
//! caller states which head it built on, and the commit fails with
//! `ConcurrentModification` if another writer got there first.
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. Early head check (cheap rejection of stale expectations)
//! 2. put(value)                     → value reference
//! 3. put(Commit { value, parent })  → commit reference
//! 4. flush()                        (values durable before the head moves)
//! 5. compare_and_swap(head)         (DURABILITY POINT)
//! ```
//!
//! A commit that loses the race leaves its value and commit object in the
//! store, unreachable from any head.

use crate::database::Database;
use crate::instrumentation::CommitTrace;
use crate::perf_time;
use std::sync::Arc;
use tracing::debug;
use vault_core::{Commit, DatasetName, Reference, Value, VaultError, VaultResult};

/// Handle to one dataset of a database
#[derive(Clone)]
pub struct Dataset {
    db: Arc<Database>,
    name: DatasetName,
}

impl Dataset {
    pub(crate) fn new(db: Arc<Database>, name: DatasetName) -> Self {
        Dataset { db, name }
    }

    /// Dataset name
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Database this dataset belongs to
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Reference of the current head commit, or `None` before the first commit
    pub fn head(&self) -> VaultResult<Option<Reference>> {
        Ok(self.db.heads().head(self.name.as_str()))
    }

    /// The current head commit
    pub fn head_commit(&self) -> VaultResult<Option<Commit>> {
        match self.head()? {
            Some(r) => self.load_commit(&r).map(Some),
            None => Ok(None),
        }
    }

    /// The value of the current head commit
    pub fn head_value(&self) -> VaultResult<Option<Value>> {
        match self.head_commit()? {
            Some(commit) => self.db.store().get(&commit.value).map(Some),
            None => Ok(None),
        }
    }

    /// Commit `value` on top of `expected`
    ///
    /// Returns the reference of the new head commit.
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` if the head is not `expected`; the head
    ///   is left unchanged
    /// - `Storage` if the value, commit, or head table cannot be written
    pub fn commit(&self, expected: Option<Reference>, value: Value) -> VaultResult<Reference> {
        #[allow(unused_mut)]
        let mut trace = CommitTrace::new();
        let name = self.name.as_str();
        let heads = self.db.heads();

        let actual = heads.head(name);
        if actual != expected {
            return Err(VaultError::concurrent_modification(name, expected, actual));
        }

        let parent_height = match expected {
            Some(r) => self.load_commit(&r)?.height,
            None => 0,
        };

        let store = self.db.store();
        let value_ref = perf_time!(trace, store_value_ns, store.put(&value)?);
        let commit = Commit::new(value_ref, expected, parent_height);
        let commit_ref = perf_time!(trace, store_commit_ns, store.put(&commit.to_value())?);
        perf_time!(trace, flush_ns, store.flush()?);
        perf_time!(
            trace,
            swap_ns,
            heads.compare_and_swap(name, expected, commit_ref)?
        );

        debug!(
            target: "vault::commit",
            dataset = name,
            head = %commit_ref.short(),
            height = commit.height,
            trace = %trace.summary(),
            "Commit applied"
        );
        Ok(commit_ref)
    }

    /// Commit `value` on top of the head observed right now
    ///
    /// Still fails with `ConcurrentModification` if another writer moves
    /// the head between the read and the swap.
    pub fn commit_value(&self, value: Value) -> VaultResult<Reference> {
        let head = self.head()?;
        self.commit(head, value)
    }

    /// Every commit reachable from the head, newest first
    pub fn history(&self) -> VaultResult<Vec<Commit>> {
        let mut commits = Vec::new();
        let mut next = self.head()?;
        while let Some(r) = next {
            let commit = self.load_commit(&r)?;
            next = commit.parent();
            commits.push(commit);
        }
        Ok(commits)
    }

    fn load_commit(&self, reference: &Reference) -> VaultResult<Commit> {
        Commit::from_value(&self.db.store().get(reference)?)
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset").field("name", &self.name).finish()
    }
}
