use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields that mirror what the remote service reports for a project.
///
/// Replaced wholesale on every refresh and never written back.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RemoteFields {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_label: Option<String>,
    /// Modification time exactly as displayed by the remote service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: bool,
}

/// Local-only organization of a project. Never sent to the remote service.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalFields {
    /// Folder path; `""` is the Home folder.
    pub folder: String,
    pub notes: Option<String>,
    pub pinned: bool,
    pub hidden: bool,
}

impl LocalFields {
    /// Default local fields placed in `folder`.
    pub fn in_folder(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            ..Default::default()
        }
    }
}

/// A project with its remote and local halves merged.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Record {
    pub remote: RemoteFields,
    pub local: LocalFields,
}

impl Record {
    pub fn id(&self) -> &str {
        &self.remote.id
    }

    pub fn name(&self) -> &str {
        &self.remote.name
    }

    pub fn url(&self) -> &str {
        &self.remote.url
    }
}

/// Merged records keyed by project id.
pub type Index = BTreeMap<String, Record>;

/// Everything persisted in the local directory-structure file.
///
/// `folders` holds only explicitly created folders; the Home folder is
/// implicit and never listed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectoryStructure {
    pub folders: BTreeSet<String>,
    pub projects: BTreeMap<String, LocalFields>,
}

impl DirectoryStructure {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.projects.is_empty()
    }

    /// Local fields for `id`, or defaults (Home, unpinned, visible).
    pub fn local_for(&self, id: &str) -> LocalFields {
        self.projects.get(id).cloned().unwrap_or_default()
    }
}

/// Information about a folder for flat listings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FolderInfo {
    pub name: String,
    pub path: String,
    pub depth: usize,
}

/// A folder and its subfolders, built from the flat path set.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FolderNode {
    pub name: String,
    pub path: String,
    pub children: Vec<FolderNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(id: &str) -> RemoteFields {
        RemoteFields {
            id: id.to_string(),
            name: "Sample Paper".to_string(),
            url: format!("https://example.org/project/{}", id),
            owner_label: Some("Owned by you".to_string()),
            last_modified_raw: Some("2 days ago".to_string()),
            last_modified: None,
            archived: false,
        }
    }

    #[test]
    fn test_local_fields_default_is_home() {
        let local = LocalFields::default();
        assert_eq!(local.folder, "");
        assert!(local.notes.is_none());
        assert!(!local.pinned);
        assert!(!local.hidden);
    }

    #[test]
    fn test_local_fields_in_folder() {
        let local = LocalFields::in_folder("CT");
        assert_eq!(local.folder, "CT");
        assert!(!local.pinned);
    }

    #[test]
    fn test_record_accessors() {
        let record = Record {
            remote: remote("abc"),
            local: LocalFields::default(),
        };
        assert_eq!(record.id(), "abc");
        assert_eq!(record.name(), "Sample Paper");
        assert!(record.url().ends_with("/abc"));
    }

    #[test]
    fn test_structure_local_for_missing_id() {
        let structure = DirectoryStructure::default();
        assert!(structure.is_empty());
        assert_eq!(structure.local_for("nope"), LocalFields::default());
    }

    #[test]
    fn test_remote_fields_optional_keys_default() {
        let json = r#"{"id": "x", "name": "N", "url": "u"}"#;
        let parsed: RemoteFields = serde_json::from_str(json).unwrap();
        assert!(parsed.owner_label.is_none());
        assert!(parsed.last_modified.is_none());
        assert!(!parsed.archived);
    }
}
