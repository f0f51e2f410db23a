//! Persistence of the local directory structure.
//!
//! The on-disk document looks like:
//!
//! ```json
//! {
//!   "folders": ["CT", "Teaching", "Teaching/2025"],
//!   "projects": {
//!     "abcdef123456": {"folder": "CT", "notes": null, "pinned": true, "hidden": false}
//!   },
//!   "version": 1
//! }
//! ```
//!
//! Every operation loads the whole document, mutates it in memory and writes
//! it back through [`write_atomic`], so a crash never leaves a half-written
//! file behind.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::filesystem::{write_atomic, ProfileFiles};
use crate::models::{DirectoryStructure, LocalFields};
use crate::paths;

/// Schema version written to the directory-structure file.
pub const FILE_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct StructureDocument<'a> {
    folders: &'a BTreeSet<String>,
    projects: &'a BTreeMap<String, LocalFields>,
    version: u32,
}

/// Decodes one per-project entry, defaulting anything missing or mistyped.
fn decode_local_fields(obj: &serde_json::Map<String, Value>) -> LocalFields {
    let mut local = LocalFields::default();
    if let Some(v) = obj.get("folder").and_then(|v| v.as_str()) {
        local.folder = v.to_string();
    }
    if let Some(v) = obj.get("notes").and_then(|v| v.as_str()) {
        local.notes = Some(v.to_string());
    }
    if let Some(v) = obj.get("pinned").and_then(|v| v.as_bool()) {
        local.pinned = v;
    }
    if let Some(v) = obj.get("hidden").and_then(|v| v.as_bool()) {
        local.hidden = v;
    }
    local
}

/// Decodes a parsed directory-structure document.
///
/// Tolerant of missing keys and unexpected shapes so that older or partially
/// written files still load: unknown keys are ignored, folder entries that are
/// not well-formed non-empty paths are dropped, and project entries that are
/// not objects are skipped.
///
/// # Returns
/// * `Some(DirectoryStructure)` - If the top level is a JSON object
/// * `None` - If the document has the wrong shape entirely
pub fn decode_directory_structure(raw: &Value) -> Option<DirectoryStructure> {
    let obj = raw.as_object()?;
    let mut structure = DirectoryStructure::default();

    if let Some(folders) = obj.get("folders").and_then(|v| v.as_array()) {
        for entry in folders {
            match entry.as_str() {
                Some(path) if paths::is_valid_folder_path(path) => {
                    structure.folders.insert(path.to_string());
                }
                // Home is implicit and never listed
                Some("") => {}
                _ => log::warn!("Ignoring malformed folder entry {}", entry),
            }
        }
    }

    if let Some(projects) = obj.get("projects").and_then(|v| v.as_object()) {
        for (id, data) in projects {
            match data.as_object() {
                Some(fields) => {
                    structure.projects.insert(id.clone(), decode_local_fields(fields));
                }
                None => log::warn!("Ignoring malformed local entry for project '{}'", id),
            }
        }
    }

    Some(structure)
}

/// Sole reader and writer of one profile's directory-structure file.
#[derive(Debug, Clone)]
pub struct DirectoryStructureStore {
    path: PathBuf,
}

impl DirectoryStructureStore {
    /// Creates a store bound to the profile's directory-structure file.
    pub fn new(files: &ProfileFiles) -> Self {
        Self::with_path(files.directory_structure_file.clone())
    }

    /// Creates a store bound to an explicit file.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the directory structure.
    ///
    /// Never fails: a missing, unreadable or unparseable file yields an empty
    /// structure so the application can still start. See [`Self::try_load`]
    /// for the strict variant.
    pub fn load(&self) -> DirectoryStructure {
        match self.try_load() {
            Ok(Some(structure)) => structure,
            Ok(None) => {
                log::debug!(
                    "No directory structure at {}; starting empty",
                    self.path.display()
                );
                DirectoryStructure::default()
            }
            Err(e) => self.empty_fallback(&e),
        }
    }

    /// Fallback used when the local file cannot be decoded. Losing local
    /// organization is recoverable; refusing to start is not.
    fn empty_fallback(&self, error: &Error) -> DirectoryStructure {
        log::warn!(
            "Could not load directory structure from {} ({}); using an empty structure",
            self.path.display(),
            error
        );
        DirectoryStructure::default()
    }

    /// Loads the directory structure, reporting why it could not be read.
    ///
    /// # Returns
    /// * `Ok(Some(_))` - The decoded structure
    /// * `Ok(None)` - The file does not exist
    /// * `Err(_)` - The file exists but could not be read or decoded
    pub fn try_load(&self) -> Result<Option<DirectoryStructure>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let raw: Value = serde_json::from_str(&content)?;

        decode_directory_structure(&raw)
            .map(Some)
            .ok_or_else(|| Error::Serialization("top-level value is not an object".to_string()))
    }

    /// Serializes the full structure and atomically replaces the file.
    pub fn save(&self, structure: &DirectoryStructure) -> Result<()> {
        let document = StructureDocument {
            folders: &structure.folders,
            projects: &structure.projects,
            version: FILE_FORMAT_VERSION,
        };
        let mut content = serde_json::to_string_pretty(&document)?;
        content.push('\n');

        write_atomic(&self.path, content.as_bytes())?;
        log::debug!(
            "Saved directory structure ({} folders, {} projects) to {}",
            structure.folders.len(),
            structure.projects.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Creates a folder if it does not already exist.
    ///
    /// Does not touch any project assignments.
    ///
    /// # Arguments
    /// * `folder_path` - Folder path to create, e.g. `"CT"` or `"Teaching/2025"`
    pub fn create_folder(&self, folder_path: &str) -> Result<DirectoryStructure> {
        paths::validate_folder_path(folder_path)?;

        let mut structure = self.load();
        if structure.folders.insert(folder_path.to_string()) {
            self.save(&structure)?;
            log::info!("Created folder '{}'", folder_path);
        }
        Ok(structure)
    }

    /// Renames a folder and its whole subtree.
    ///
    /// Renaming `"Teaching"` to `"Teaching2025"` rewrites the folder entries
    /// `"Teaching"` and `"Teaching/2025"` as well as every project assigned
    /// inside that subtree. If the new path collides with an existing folder
    /// the two merge. Nothing is written when no folder or project lies in
    /// the old subtree.
    pub fn rename_folder(&self, old_path: &str, new_path: &str) -> Result<DirectoryStructure> {
        if paths::is_root(old_path) || old_path == new_path {
            return Ok(self.load());
        }
        paths::validate_folder_path(old_path)?;
        paths::validate_folder_path(new_path)?;

        let mut structure = self.load();

        let in_subtree = |folder: &str| paths::is_descendant_or_equal(folder, old_path);
        let touched = structure.folders.iter().any(|folder| in_subtree(folder.as_str()))
            || structure.projects.values().any(|local| in_subtree(&local.folder));
        if !touched {
            log::debug!("Rename of unknown folder '{}' left nothing to change", old_path);
            return Ok(structure);
        }

        structure.folders = structure
            .folders
            .iter()
            .map(|folder| paths::rewrite_prefix(folder, old_path, new_path))
            .collect();

        for local in structure.projects.values_mut() {
            if paths::is_descendant_or_equal(&local.folder, old_path) {
                local.folder = paths::rewrite_prefix(&local.folder, old_path, new_path);
            }
        }

        self.save(&structure)?;
        log::info!("Renamed folder '{}' to '{}'", old_path, new_path);
        Ok(structure)
    }

    /// Deletes a folder and its subtree, provided no project lives inside it.
    ///
    /// # Returns
    /// * `Ok(DirectoryStructure)` - The structure after removing the subtree
    /// * `Err(Error::FolderNotEmpty)` - Naming the first project found in the
    ///   subtree; nothing is written
    pub fn delete_folder(&self, folder_path: &str) -> Result<DirectoryStructure> {
        if paths::is_root(folder_path) {
            return Ok(self.load());
        }
        paths::validate_folder_path(folder_path)?;

        let mut structure = self.load();

        if let Some((id, local)) = structure
            .projects
            .iter()
            .find(|(_, local)| paths::is_descendant_or_equal(&local.folder, folder_path))
        {
            return Err(Error::FolderNotEmpty {
                folder: folder_path.to_string(),
                record_id: id.clone(),
                record_folder: local.folder.clone(),
            });
        }

        structure
            .folders
            .retain(|folder| !paths::is_descendant_or_equal(folder, folder_path));

        self.save(&structure)?;
        log::info!("Deleted folder '{}'", folder_path);
        Ok(structure)
    }

    /// Assigns projects to a folder, creating the folder entry if needed.
    ///
    /// `None` or `""` moves the projects to Home. Projects without local
    /// fields get a default entry; for the rest only the folder changes.
    /// The structure is saved once after all ids are processed.
    pub fn move_records_to_folder<I, S>(&self, ids: I, target: Option<&str>) -> Result<DirectoryStructure>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let target = paths::normalize_target(target);
        paths::validate_target_path(&target)?;

        let mut structure = self.load();

        if !paths::is_root(&target) {
            structure.folders.insert(target.clone());
        }

        let mut moved = 0usize;
        for id in ids {
            let id = id.as_ref();
            if id.is_empty() {
                continue;
            }
            structure
                .projects
                .entry(id.to_string())
                .and_modify(|local| local.folder = target.clone())
                .or_insert_with(|| LocalFields::in_folder(target.clone()));
            moved += 1;
        }

        self.save(&structure)?;
        log::info!("Moved {} project(s) to '{}'", moved, target);
        Ok(structure)
    }

    /// Applies `f` to the local fields of each id (creating defaults for
    /// unknown ids) and saves once.
    fn update_locals<I, S, F>(&self, ids: I, mut f: F) -> Result<DirectoryStructure>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&mut LocalFields),
    {
        let mut structure = self.load();
        for id in ids {
            let id = id.as_ref();
            if id.is_empty() {
                continue;
            }
            f(structure.projects.entry(id.to_string()).or_default());
        }
        self.save(&structure)?;
        Ok(structure)
    }

    /// Sets the pinned flag on the given projects.
    pub fn set_pinned<I, S>(&self, ids: I, pinned: bool) -> Result<DirectoryStructure>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.update_locals(ids, |local| local.pinned = pinned)
    }

    /// Sets the hidden flag on the given projects.
    pub fn set_hidden<I, S>(&self, ids: I, hidden: bool) -> Result<DirectoryStructure>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.update_locals(ids, |local| local.hidden = hidden)
    }

    /// Replaces the notes of one project. Blank notes are stored as `None`.
    pub fn set_notes(&self, id: &str, notes: Option<String>) -> Result<DirectoryStructure> {
        if id.is_empty() {
            return Err(Error::InvalidInput("project id is empty".to_string()));
        }
        let notes = notes.filter(|n| !n.trim().is_empty());
        self.update_locals([id], |local| local.notes = notes.clone())
    }
}
