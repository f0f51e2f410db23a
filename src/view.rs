//! Read-side helpers for presenting the folder hierarchy and filtering
//! projects. Everything here is a pure function of the stored strings; no
//! tree is ever persisted.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{DirectoryStructure, FolderInfo, FolderNode, Index, Record};
use crate::paths;

/// Every folder that should be displayed: explicit folders, folders that
/// projects are assigned to, and all of their ancestors. The root is implied
/// and never included.
pub fn known_folders(structure: &DirectoryStructure, index: &Index) -> BTreeSet<String> {
    let assigned = structure
        .projects
        .values()
        .map(|local| local.folder.as_str())
        .chain(index.values().map(|record| record.local.folder.as_str()));

    let mut folders = BTreeSet::new();
    for folder in structure.folders.iter().map(String::as_str).chain(assigned) {
        if paths::is_root(folder) {
            continue;
        }
        folders.extend(paths::ancestors(folder));
        folders.insert(folder.to_string());
    }
    folders
}

/// Flat listing in display order, parents before children.
pub fn list_folders(folders: &BTreeSet<String>) -> Vec<FolderInfo> {
    let mut listing: Vec<FolderInfo> = folders
        .iter()
        .map(|path| FolderInfo {
            name: paths::leaf_name(path).to_string(),
            path: path.clone(),
            depth: paths::depth(path),
        })
        .collect();
    // Segment-wise order so "a/b" sorts right after "a", before "a b"
    listing.sort_by(|a, b| a.path.split('/').cmp(b.path.split('/')));
    listing
}

fn insert_path(nodes: &mut Vec<FolderNode>, path: &str) {
    let mut level = nodes;
    let mut prefix = String::new();
    for segment in path.split(paths::SEPARATOR) {
        if !prefix.is_empty() {
            prefix.push(paths::SEPARATOR);
        }
        prefix.push_str(segment);

        let pos = match level.iter().position(|node| node.name == segment) {
            Some(pos) => pos,
            None => {
                level.push(FolderNode {
                    name: segment.to_string(),
                    path: prefix.clone(),
                    children: Vec::new(),
                });
                level.len() - 1
            }
        };
        level = &mut level[pos].children;
    }
}

/// Builds the nested folder tree under the implicit Home root.
///
/// Missing intermediate folders are synthesized so every node has a parent.
pub fn folder_tree(folders: &BTreeSet<String>) -> Vec<FolderNode> {
    let mut roots = Vec::new();
    for info in list_folders(folders) {
        insert_path(&mut roots, &info.path);
    }
    roots
}

/// Which projects a folder selection shows.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum FolderFilter {
    /// Every visible project
    All,
    /// Visible pinned projects
    Pinned,
    /// Visible projects directly in Home
    Home,
    /// Visible projects in this folder or below
    Folder(String),
}

impl FolderFilter {
    /// Maps a folder selection to a filter; `None` and `""` select Home.
    pub fn for_folder(path: Option<&str>) -> Self {
        match path {
            Some(p) if !p.is_empty() => FolderFilter::Folder(p.to_string()),
            _ => FolderFilter::Home,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        let local = &record.local;
        if local.hidden {
            return false;
        }
        match self {
            FolderFilter::All => true,
            FolderFilter::Pinned => local.pinned,
            FolderFilter::Home => paths::is_root(&local.folder),
            FolderFilter::Folder(path) => paths::is_descendant_or_equal(&local.folder, path),
        }
    }
}

fn matches_text(record: &Record, needle: &str) -> bool {
    let fields = [
        Some(record.remote.name.as_str()),
        record.remote.owner_label.as_deref(),
        Some(record.local.folder.as_str()),
    ];
    fields
        .iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(needle))
}

/// Projects selected by `filter` whose name, owner or folder contains
/// `text` (case-insensitive). Blank text matches everything.
pub fn filter_records<'a>(index: &'a Index, filter: &FolderFilter, text: &str) -> Vec<&'a Record> {
    let needle = text.trim().to_lowercase();
    index
        .values()
        .filter(|record| filter.matches(record))
        .filter(|record| needle.is_empty() || matches_text(record, &needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocalFields, RemoteFields};

    fn record(id: &str, name: &str, local: LocalFields) -> Record {
        Record {
            remote: RemoteFields {
                id: id.to_string(),
                name: name.to_string(),
                url: format!("https://example.org/project/{}", id),
                owner_label: Some("Shared".to_string()),
                last_modified_raw: None,
                last_modified: None,
                archived: false,
            },
            local,
        }
    }

    fn sample_index() -> Index {
        let mut pinned = LocalFields::in_folder("Teaching/2025");
        pinned.pinned = true;
        let mut hidden = LocalFields::in_folder("Teaching");
        hidden.hidden = true;

        [
            record("p1", "Lecture Notes", pinned),
            record("p2", "Grant Proposal", LocalFields::default()),
            record("p3", "Old Syllabus", hidden),
            record("p4", "CT Paper", LocalFields::in_folder("CT")),
        ]
        .into_iter()
        .map(|r| (r.remote.id.clone(), r))
        .collect()
    }

    fn ids(records: &[&Record]) -> Vec<String> {
        records.iter().map(|r| r.remote.id.clone()).collect()
    }

    #[test]
    fn test_known_folders_adds_ancestors_and_assignments() {
        let mut structure = DirectoryStructure::default();
        structure.folders.insert("Funding".to_string());
        structure
            .projects
            .insert("x".to_string(), LocalFields::in_folder("Archive/2019/Q1"));

        let folders = known_folders(&structure, &sample_index());
        let listed: Vec<&str> = folders.iter().map(String::as_str).collect();
        assert_eq!(
            listed,
            vec![
                "Archive",
                "Archive/2019",
                "Archive/2019/Q1",
                "CT",
                "Funding",
                "Teaching",
                "Teaching/2025"
            ]
        );
    }

    #[test]
    fn test_list_folders_parent_before_child() {
        let folders: BTreeSet<String> = ["a b", "a", "a/b"].iter().map(|s| s.to_string()).collect();
        let listing = list_folders(&folders);
        let paths: Vec<&str> = listing.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "a/b", "a b"]);
        assert_eq!(listing[1].name, "b");
        assert_eq!(listing[1].depth, 2);
    }

    #[test]
    fn test_folder_tree_synthesizes_parents() {
        let folders: BTreeSet<String> = ["CT", "Teaching/2025"].iter().map(|s| s.to_string()).collect();
        let tree = folder_tree(&folders);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "CT");
        assert!(tree[0].children.is_empty());
        assert_eq!(tree[1].path, "Teaching");
        assert_eq!(tree[1].children.len(), 1);
        assert_eq!(tree[1].children[0].path, "Teaching/2025");
    }

    #[test]
    fn test_folder_filters() {
        let index = sample_index();

        assert_eq!(ids(&filter_records(&index, &FolderFilter::All, "")), vec!["p1", "p2", "p4"]);
        assert_eq!(ids(&filter_records(&index, &FolderFilter::Pinned, "")), vec!["p1"]);
        assert_eq!(ids(&filter_records(&index, &FolderFilter::Home, "")), vec!["p2"]);
        assert_eq!(
            ids(&filter_records(&index, &FolderFilter::Folder("Teaching".to_string()), "")),
            vec!["p1"]
        );
    }

    #[test]
    fn test_text_filter_case_insensitive() {
        let index = sample_index();
        assert_eq!(ids(&filter_records(&index, &FolderFilter::All, "  GRANT ")), vec!["p2"]);
        // Matches the folder column too
        assert_eq!(ids(&filter_records(&index, &FolderFilter::All, "teaching")), vec!["p1"]);
        // Owner label
        assert_eq!(filter_records(&index, &FolderFilter::All, "shared").len(), 3);
    }

    #[test]
    fn test_for_folder() {
        assert_eq!(FolderFilter::for_folder(None), FolderFilter::Home);
        assert_eq!(FolderFilter::for_folder(Some("")), FolderFilter::Home);
        assert_eq!(
            FolderFilter::for_folder(Some("CT")),
            FolderFilter::Folder("CT".to_string())
        );
    }
}
