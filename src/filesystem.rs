use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name of the cached remote project list.
pub const PROJECTS_INFO_FILENAME: &str = "projects_info.json";

/// File name of the local directory structure.
pub const DIRECTORY_STRUCTURE_FILENAME: &str = "local_directory_structure.json";

/// Writes `content` to `path` atomically using the temp-file-then-rename pattern.
///
/// The temporary file is created next to `path` so the final rename stays on
/// one filesystem. If any step fails the temporary file is removed when the
/// `NamedTempFile` guard drops, and whatever was previously at `path` is left
/// in place. The parent directory is created if it does not exist.
///
/// # Arguments
/// * `path` - Final location of the file
/// * `content` - Complete new contents
///
/// # Returns
/// * `Ok(())` - If the new contents replaced the file
/// * `Err(Error::Io)` - If creating, writing, syncing or renaming failed
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| Error::io(&parent, e))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(&parent).map_err(|e| Error::io(&parent, e))?;
    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_file.path().to_path_buf(), e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| Error::io(temp_file.path().to_path_buf(), e))?;
    temp_file.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

/// ProfileFiles names the backing files of one profile.
///
/// The structure is:
/// - `{state_dir}/projects_info.json` - Cached remote project list
/// - `{state_dir}/local_directory_structure.json` - Folders and per-project local fields
///
/// It is passed explicitly to every store so that several profiles can be
/// open in one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFiles {
    /// Directory holding this profile's data files
    pub state_dir: PathBuf,
    /// Path to the remote project cache
    pub projects_info_file: PathBuf,
    /// Path to the local directory structure
    pub directory_structure_file: PathBuf,
}

impl ProfileFiles {
    /// Creates a ProfileFiles rooted at `state_dir` with the default file names.
    /// Nothing is created on disk.
    pub fn new_with_base(state_dir: &Path) -> Self {
        let state_dir = state_dir.to_path_buf();
        let projects_info_file = state_dir.join(PROJECTS_INFO_FILENAME);
        let directory_structure_file = state_dir.join(DIRECTORY_STRUCTURE_FILENAME);

        Self {
            state_dir,
            projects_info_file,
            directory_structure_file,
        }
    }

    /// Creates a ProfileFiles with explicit file locations.
    pub fn with_files(projects_info_file: PathBuf, directory_structure_file: PathBuf) -> Self {
        let state_dir = directory_structure_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            state_dir,
            projects_info_file,
            directory_structure_file,
        }
    }

    /// Ensures the state directory exists.
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.state_dir).map_err(|e| Error::io(&self.state_dir, e))
    }

    /// The files whose modification times are tracked for out-of-band changes.
    pub fn tracked_files(&self) -> Vec<PathBuf> {
        vec![
            self.projects_info_file.clone(),
            self.directory_structure_file.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_profile_files_new_with_base() {
        let temp_dir = tempdir().unwrap();
        let files = ProfileFiles::new_with_base(temp_dir.path());

        assert_eq!(files.state_dir, temp_dir.path());
        assert_eq!(
            files.projects_info_file,
            temp_dir.path().join("projects_info.json")
        );
        assert_eq!(
            files.directory_structure_file,
            temp_dir.path().join("local_directory_structure.json")
        );
    }

    #[test]
    fn test_profile_files_with_files_uses_structure_parent() {
        let temp_dir = tempdir().unwrap();
        let files = ProfileFiles::with_files(
            temp_dir.path().join("cache/remote.json"),
            temp_dir.path().join("state/local.json"),
        );
        assert_eq!(files.state_dir, temp_dir.path().join("state"));
    }

    #[test]
    fn test_ensure_directories_idempotent() {
        let temp_dir = tempdir().unwrap();
        let files = ProfileFiles::new_with_base(&temp_dir.path().join("profiles/primary"));

        assert!(!files.state_dir.exists());
        files.ensure_directories().unwrap();
        files.ensure_directories().unwrap();
        assert!(files.state_dir.is_dir());
    }

    #[test]
    fn test_write_atomic_creates_parent_and_replaces() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested/dir/file.json");

        write_atomic(&path, b"first").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");

        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");

        // Only the target remains; no temp files left behind
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_atomic_failure_keeps_previous_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("data.json");
        write_atomic(&path, b"good").unwrap();

        // A directory in place of the target makes the rename fail
        let blocked = temp_dir.path().join("blocked");
        fs::create_dir_all(blocked.join("child")).unwrap();
        assert!(write_atomic(&blocked, b"bad").is_err());

        assert_eq!(fs::read_to_string(&path).unwrap(), "good");
        // The failed temp file was cleaned up
        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 2);
    }
}
