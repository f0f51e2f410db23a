//! Folder path algebra over plain `/`-separated strings.
//!
//! The hierarchy is never stored as linked nodes: a folder is a string such
//! as `"Teaching/2025"` and the root ("Home") is the empty string. Subtree
//! membership, renames and tree construction are all computed from strings.

use crate::error::{Error, Result};

/// Segment separator for folder paths.
pub const SEPARATOR: char = '/';

/// The implicit root folder ("Home").
pub const ROOT: &str = "";

/// Returns true if `path` is the root sentinel.
pub fn is_root(path: &str) -> bool {
    path.is_empty()
}

/// Validates a concrete (non-root) folder path.
///
/// Rejects:
/// - the empty string (the root cannot be created, renamed or targeted here)
/// - a leading or trailing `/`
/// - empty segments such as `"a//b"`
///
/// # Arguments
/// * `path` - The folder path to validate
///
/// # Returns
/// * `Ok(())` - If the path is well formed
/// * `Err(Error::InvalidPath)` - Describing the first problem found
pub fn validate_folder_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::invalid_path(path, "folder path is empty"));
    }
    if path.starts_with(SEPARATOR) {
        return Err(Error::invalid_path(path, "leading '/'"));
    }
    if path.ends_with(SEPARATOR) {
        return Err(Error::invalid_path(path, "trailing '/'"));
    }
    if path.split(SEPARATOR).any(|segment| segment.is_empty()) {
        return Err(Error::invalid_path(path, "empty segment"));
    }
    Ok(())
}

/// Validates a path that may also be the root sentinel.
pub fn validate_target_path(path: &str) -> Result<()> {
    if is_root(path) {
        Ok(())
    } else {
        validate_folder_path(path)
    }
}

/// Returns true if `path` is a well-formed, non-root folder path.
pub fn is_valid_folder_path(path: &str) -> bool {
    validate_folder_path(path).is_ok()
}

/// Maps a missing or empty move target to the root sentinel.
pub fn normalize_target(target: Option<&str>) -> String {
    match target {
        Some(path) if !path.is_empty() => path.to_string(),
        _ => ROOT.to_string(),
    }
}

/// True if `candidate` equals `ancestor` or lies below it.
///
/// `"Teaching/2025"` is a descendant of `"Teaching"`, `"Teaching2025"` is not.
pub fn is_descendant_or_equal(candidate: &str, ancestor: &str) -> bool {
    if candidate == ancestor {
        return true;
    }
    candidate.len() > ancestor.len()
        && candidate.starts_with(ancestor)
        && candidate[ancestor.len()..].starts_with(SEPARATOR)
}

/// Replaces the `old_prefix` subtree root of `path` with `new_prefix`.
///
/// Paths outside the `old_prefix` subtree are returned unchanged.
pub fn rewrite_prefix(path: &str, old_prefix: &str, new_prefix: &str) -> String {
    if path == old_prefix {
        new_prefix.to_string()
    } else if is_descendant_or_equal(path, old_prefix) {
        format!("{}{}", new_prefix, &path[old_prefix.len()..])
    } else {
        path.to_string()
    }
}

/// Returns the parent folder of `path`, or the root for top-level folders.
pub fn parent_of(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[..idx],
        None => ROOT,
    }
}

/// Returns the last segment of `path`.
pub fn leaf_name(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Number of segments in `path`; the root has depth 0.
pub fn depth(path: &str) -> usize {
    if is_root(path) {
        0
    } else {
        path.split(SEPARATOR).count()
    }
}

/// Validates a single folder name as typed by a user.
fn validate_segment(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_path(name, "folder name is empty"));
    }
    if name.contains(SEPARATOR) {
        return Err(Error::invalid_path(
            name,
            "folder names cannot contain '/'; create nested folders one level at a time",
        ));
    }
    Ok(())
}

/// Builds the path of a new subfolder `name` under `parent`.
///
/// # Arguments
/// * `parent` - Parent folder path, or `""` for a top-level folder
/// * `name` - A single segment; surrounding whitespace is trimmed
pub fn child_path(parent: &str, name: &str) -> Result<String> {
    let name = name.trim();
    validate_segment(name)?;
    validate_target_path(parent)?;
    if is_root(parent) {
        Ok(name.to_string())
    } else {
        Ok(format!("{}{}{}", parent, SEPARATOR, name))
    }
}

/// Computes the target of renaming the last segment of `path` to `new_name`,
/// keeping the parent unchanged.
pub fn renamed_leaf(path: &str, new_name: &str) -> Result<String> {
    validate_folder_path(path)?;
    child_path(parent_of(path), new_name)
}

/// Returns every proper ancestor of `path`, shallowest first, excluding the root.
pub fn ancestors(path: &str) -> Vec<String> {
    path.match_indices(SEPARATOR)
        .map(|(idx, _)| path[..idx].to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
