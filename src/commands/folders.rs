use crate::models::{FolderInfo, FolderNode};
use crate::paths;
use crate::remote::RemoteRecordSource;
use crate::session::ProfileSession;

use super::ApiResult;

/// Lists every known folder, parents before children. Home is implied and
/// not listed.
pub fn list_folders<S: RemoteRecordSource>(session: &ProfileSession<S>) -> Vec<FolderInfo> {
    session.list_folders()
}

/// Returns the nested folder tree under Home.
pub fn folder_tree<S: RemoteRecordSource>(session: &ProfileSession<S>) -> Vec<FolderNode> {
    session.folder_tree()
}

/// Creates a subfolder.
///
/// # Arguments
/// * `parent` - Parent folder path; `None` or `""` creates a top-level folder
/// * `name` - Name of the new folder, a single path segment
///
/// On success `folder` holds the full path of the new folder.
pub fn create_folder<S: RemoteRecordSource>(
    session: &mut ProfileSession<S>,
    parent: Option<&str>,
    name: &str,
) -> ApiResult {
    let path = match paths::child_path(parent.unwrap_or(paths::ROOT), name) {
        Ok(path) => path,
        Err(e) => return ApiResult::from_error(&e),
    };
    match session.create_folder(&path) {
        Ok(_) => ApiResult::with_folder(path),
        Err(e) => ApiResult::from_error(&e),
    }
}

/// Renames the last segment of a folder, carrying its subfolders and
/// projects along.
///
/// # Arguments
/// * `path` - The folder to rename
/// * `new_name` - Its new name; the parent stays the same
pub fn rename_folder<S: RemoteRecordSource>(
    session: &mut ProfileSession<S>,
    path: &str,
    new_name: &str,
) -> ApiResult {
    let new_path = match paths::renamed_leaf(path, new_name) {
        Ok(new_path) => new_path,
        Err(e) => return ApiResult::from_error(&e),
    };
    match session.rename_folder(path, &new_path) {
        Ok(_) => ApiResult::with_folder(new_path),
        Err(e) => ApiResult::from_error(&e),
    }
}

/// Deletes an empty folder and its empty subfolders.
///
/// Fails with `errorKind: "folder_not_empty"`, the blocking `recordId` and
/// its `folder` when any project is still inside.
pub fn delete_folder<S: RemoteRecordSource>(session: &mut ProfileSession<S>, path: &str) -> ApiResult {
    session.delete_folder(path).into()
}
