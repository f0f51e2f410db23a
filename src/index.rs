//! Reconciliation of remote project entries with local organization.
//!
//! Remote fields are authoritative and replaced on every pass. Local fields
//! belong to this crate and are only changed by folder/flag operations. The
//! index is driven by the remote list: a project that disappeared remotely
//! drops out of the index, but its local fields stay on disk and reattach if
//! the same id comes back.

use crate::error::Result;
use crate::models::{DirectoryStructure, Index, LocalFields, Record};
use crate::remote::{parse_remote_entries, RawEntry, RemoteRecordSource};
use crate::store::DirectoryStructureStore;

/// Combines parsed remote entries with local fields into an index.
pub fn merge(remote_entries: &[RawEntry], structure: &DirectoryStructure) -> Index {
    parse_remote_entries(remote_entries)
        .into_iter()
        .map(|remote| {
            let local = structure.local_for(&remote.id);
            (remote.id.clone(), Record { remote, local })
        })
        .collect()
}

/// Ids that have local fields but no entry in `index`.
pub fn orphaned_ids(index: &Index, structure: &DirectoryStructure) -> Vec<String> {
    structure
        .projects
        .keys()
        .filter(|id| !index.contains_key(*id))
        .cloned()
        .collect()
}

/// Builds the merged project index for one profile.
#[derive(Debug)]
pub struct ReconciliationEngine<S> {
    store: DirectoryStructureStore,
    source: S,
}

impl<S: RemoteRecordSource> ReconciliationEngine<S> {
    pub fn new(store: DirectoryStructureStore, source: S) -> Self {
        Self { store, source }
    }

    pub fn store(&self) -> &DirectoryStructureStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches remote entries, treating a failed fetch as "no remote data
    /// this cycle".
    fn fetch_or_empty(&self) -> Vec<RawEntry> {
        match self.source.fetch_records() {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Remote projects unavailable this cycle: {}", e);
                Vec::new()
            }
        }
    }

    /// Loads the merged index.
    ///
    /// Malformed remote entries are skipped individually; projects known only
    /// locally are left out.
    pub fn load_index(&self) -> Index {
        let structure = self.store.load();
        let index = merge(&self.fetch_or_empty(), &structure);
        log::debug!(
            "Loaded index with {} project(s) against {} local entries",
            index.len(),
            structure.projects.len()
        );
        index
    }

    /// Ids with local fields on disk that the current remote list lacks,
    /// e.g. projects deleted remotely.
    pub fn orphaned_local_ids(&self) -> Vec<String> {
        let structure = self.store.load();
        orphaned_ids(&merge(&self.fetch_or_empty(), &structure), &structure)
    }

    /// Persists the local half of every record in `index`.
    ///
    /// The folder list and the local fields of projects absent from `index`
    /// are re-read from disk first, so folders created by another session and
    /// local entries of remotely deleted projects are not erased.
    pub fn save_index(&self, index: &Index) -> Result<()> {
        let mut structure = self.store.load();
        let locals = index
            .iter()
            .map(|(id, record)| (id.clone(), record.local.clone()));
        structure.projects.extend(locals);
        self.store.save(&structure)
    }

    /// Local fields for one id as currently stored, or defaults.
    pub fn local_fields(&self, id: &str) -> LocalFields {
        self.store.load().local_for(id)
    }
}
