//! Detection of out-of-band changes to a profile's backing files.
//!
//! Another process (or another machine syncing the same folder) may rewrite
//! the files while a session is open. Comparing modification-time snapshots
//! lets the caller offer a reload instead of silently overwriting.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Observed state of one tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStamp {
    Absent,
    Present(SystemTime),
}

impl FileStamp {
    /// Reads the stamp of `path`; anything that prevents reading the
    /// modification time counts as absent.
    pub fn of(path: &Path) -> Self {
        match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => FileStamp::Present(modified),
            Err(_) => FileStamp::Absent,
        }
    }
}

/// Stamps of every tracked file at one point in time.
pub type Snapshot = BTreeMap<PathBuf, FileStamp>;

/// Tracks a fixed set of files.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    tracked: Vec<PathBuf>,
}

impl ChangeDetector {
    pub fn new(tracked: Vec<PathBuf>) -> Self {
        Self { tracked }
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.tracked
    }

    /// Takes a snapshot of all tracked files.
    pub fn snapshot(&self) -> Snapshot {
        self.tracked
            .iter()
            .map(|path| (path.clone(), FileStamp::of(path)))
            .collect()
    }

    /// True if any tracked file appeared, disappeared or got a new
    /// modification time between the two snapshots.
    pub fn has_changed_since(previous: &Snapshot, current: &Snapshot) -> bool {
        !Self::changed_paths(previous, current).is_empty()
    }

    /// Paths whose stamps differ between the two snapshots. A path missing
    /// from one snapshot is compared as absent.
    pub fn changed_paths(previous: &Snapshot, current: &Snapshot) -> Vec<PathBuf> {
        let stamp = |snapshot: &Snapshot, path: &PathBuf| {
            snapshot.get(path).copied().unwrap_or(FileStamp::Absent)
        };

        let mut changed: Vec<PathBuf> = previous
            .keys()
            .chain(current.keys())
            .filter(|&path| stamp(previous, path) != stamp(current, path))
            .cloned()
            .collect();
        changed.sort();
        changed.dedup();
        changed
    }
}
