//! One open profile: the store, the reconciliation engine, the cached index
//! and the change detector watching the profile's files.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::change::{ChangeDetector, FileStamp, Snapshot};
use crate::error::Result;
use crate::filesystem::ProfileFiles;
use crate::index::ReconciliationEngine;
use crate::models::{DirectoryStructure, FolderInfo, FolderNode, Index, Record};
use crate::remote::RemoteRecordSource;
use crate::store::DirectoryStructureStore;
use crate::view::{self, FolderFilter};

/// Single owner of a profile's state for the lifetime of a UI session.
///
/// Mutations go through the store, which saves atomically; afterwards the
/// cached index picks up the new local fields and the stamp of the
/// directory-structure file is retaken so the session's own writes are not
/// reported as external changes. The remote cache is never written here, so
/// a pending change to it stays flagged until [`Self::reload_index`].
#[derive(Debug)]
pub struct ProfileSession<S> {
    files: ProfileFiles,
    engine: ReconciliationEngine<S>,
    detector: ChangeDetector,
    snapshot: Snapshot,
    index: Index,
}

impl<S: RemoteRecordSource> ProfileSession<S> {
    /// Opens a profile, creating its state directory if needed, and loads the
    /// index.
    pub fn open(files: ProfileFiles, source: S) -> Result<Self> {
        files.ensure_directories()?;
        let engine = ReconciliationEngine::new(DirectoryStructureStore::new(&files), source);
        let detector = ChangeDetector::new(files.tracked_files());
        let snapshot = detector.snapshot();
        let index = engine.load_index();
        log::info!(
            "Opened profile at {} with {} project(s)",
            files.state_dir.display(),
            index.len()
        );

        Ok(Self {
            files,
            engine,
            detector,
            snapshot,
            index,
        })
    }

    pub fn files(&self) -> &ProfileFiles {
        &self.files
    }

    pub fn engine(&self) -> &ReconciliationEngine<S> {
        &self.engine
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn record(&self, id: &str) -> Option<&Record> {
        self.index.get(id)
    }

    /// Current directory structure as stored on disk.
    pub fn structure(&self) -> DirectoryStructure {
        self.engine.store().load()
    }

    pub fn known_folders(&self) -> BTreeSet<String> {
        view::known_folders(&self.structure(), &self.index)
    }

    pub fn list_folders(&self) -> Vec<FolderInfo> {
        view::list_folders(&self.known_folders())
    }

    pub fn folder_tree(&self) -> Vec<FolderNode> {
        view::folder_tree(&self.known_folders())
    }

    /// Records shown for a folder selection and search text.
    pub fn records(&self, filter: &FolderFilter, text: &str) -> Vec<&Record> {
        view::filter_records(&self.index, filter, text)
    }

    /// Records the stamp left by the session's own save of the
    /// directory-structure file. Other tracked files keep their old stamps.
    fn acknowledge_own_write(&mut self) {
        let path = self.files.directory_structure_file.clone();
        let stamp = FileStamp::of(&path);
        self.snapshot.insert(path, stamp);
    }

    /// Copies local fields from a freshly saved structure into the cached
    /// index and acknowledges the write.
    fn apply(&mut self, structure: DirectoryStructure) -> DirectoryStructure {
        for (id, record) in self.index.iter_mut() {
            record.local = structure.local_for(id);
        }
        self.acknowledge_own_write();
        structure
    }

    pub fn create_folder(&mut self, path: &str) -> Result<DirectoryStructure> {
        let structure = self.engine.store().create_folder(path)?;
        Ok(self.apply(structure))
    }

    pub fn rename_folder(&mut self, old_path: &str, new_path: &str) -> Result<DirectoryStructure> {
        let structure = self.engine.store().rename_folder(old_path, new_path)?;
        Ok(self.apply(structure))
    }

    pub fn delete_folder(&mut self, path: &str) -> Result<DirectoryStructure> {
        let structure = self.engine.store().delete_folder(path)?;
        Ok(self.apply(structure))
    }

    pub fn move_records<I, T>(&mut self, ids: I, target: Option<&str>) -> Result<DirectoryStructure>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let structure = self.engine.store().move_records_to_folder(ids, target)?;
        Ok(self.apply(structure))
    }

    pub fn set_pinned<I, T>(&mut self, ids: I, pinned: bool) -> Result<DirectoryStructure>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let structure = self.engine.store().set_pinned(ids, pinned)?;
        Ok(self.apply(structure))
    }

    pub fn set_hidden<I, T>(&mut self, ids: I, hidden: bool) -> Result<DirectoryStructure>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let structure = self.engine.store().set_hidden(ids, hidden)?;
        Ok(self.apply(structure))
    }

    pub fn set_notes(&mut self, id: &str, notes: Option<String>) -> Result<DirectoryStructure> {
        let structure = self.engine.store().set_notes(id, notes)?;
        Ok(self.apply(structure))
    }

    /// Persists the local half of the cached index.
    pub fn save_index(&mut self) -> Result<()> {
        self.engine.save_index(&self.index)?;
        self.acknowledge_own_write();
        Ok(())
    }

    /// True if a tracked file changed since the session last read or wrote it.
    pub fn external_change_detected(&self) -> bool {
        ChangeDetector::has_changed_since(&self.snapshot, &self.detector.snapshot())
    }

    /// Tracked files changed since the last read or write.
    pub fn changed_files(&self) -> Vec<PathBuf> {
        ChangeDetector::changed_paths(&self.snapshot, &self.detector.snapshot())
    }

    /// Re-reads both files, rebuilds the index and acknowledges any pending
    /// external change.
    pub fn reload_index(&mut self) -> &Index {
        self.snapshot = self.detector.snapshot();
        self.index = self.engine.load_index();
        &self.index
    }

    /// Ids with stored local fields that the remote list no longer has.
    pub fn orphaned_local_ids(&self) -> Vec<String> {
        self.engine.orphaned_local_ids()
    }
}
