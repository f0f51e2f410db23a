use crate::models::Record;
use crate::remote::RemoteRecordSource;
use crate::session::ProfileSession;
use crate::view::FolderFilter;

use super::ApiResult;

/// Lists the visible projects for a folder selection, filtered by search text.
pub fn list_records<S: RemoteRecordSource>(
    session: &ProfileSession<S>,
    filter: &FolderFilter,
    text: &str,
) -> Vec<Record> {
    session.records(filter, text).into_iter().cloned().collect()
}

/// Moves projects into a folder, creating the folder if needed.
///
/// # Arguments
/// * `ids` - Projects to move
/// * `target` - Destination folder; `None` or `""` moves them to Home
pub fn move_records<S: RemoteRecordSource>(
    session: &mut ProfileSession<S>,
    ids: &[String],
    target: Option<&str>,
) -> ApiResult {
    match session.move_records(ids, target) {
        Ok(_) => ApiResult::with_folder(target.unwrap_or_default()),
        Err(e) => ApiResult::from_error(&e),
    }
}

/// Pins or unpins projects.
pub fn set_pinned<S: RemoteRecordSource>(
    session: &mut ProfileSession<S>,
    ids: &[String],
    pinned: bool,
) -> ApiResult {
    session.set_pinned(ids, pinned).into()
}

/// Hides or reveals projects.
pub fn set_hidden<S: RemoteRecordSource>(
    session: &mut ProfileSession<S>,
    ids: &[String],
    hidden: bool,
) -> ApiResult {
    session.set_hidden(ids, hidden).into()
}

/// Replaces a project's notes; empty text clears them.
pub fn set_notes<S: RemoteRecordSource>(
    session: &mut ProfileSession<S>,
    id: &str,
    notes: Option<String>,
) -> ApiResult {
    session.set_notes(id, notes).into()
}

/// Re-reads the profile's files if another process changed them.
///
/// Returns `true` when a reload happened.
pub fn reload_if_changed<S: RemoteRecordSource>(session: &mut ProfileSession<S>) -> bool {
    if !session.external_change_detected() {
        return false;
    }
    log::info!(
        "Profile files changed on disk: {:?}; reloading",
        session.changed_files()
    );
    session.reload_index();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::filesystem::ProfileFiles;
    use crate::remote::StaticSource;
    use serde_json::json;
    use tempfile::tempdir;

    fn session_in(base: &std::path::Path) -> ProfileSession<StaticSource> {
        let source = StaticSource::new(vec![
            json!({"id": "p1", "name": "Lecture Notes", "url": "u1"}),
            json!({"id": "p2", "name": "Grant Proposal", "url": "u2", "owner_label": "Ada"}),
        ]);
        ProfileSession::open(ProfileFiles::new_with_base(base), source).unwrap()
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(Record::id).collect()
    }

    #[test]
    fn test_move_then_list() {
        let temp_dir = tempdir().unwrap();
        let mut session = session_in(temp_dir.path());

        let result = move_records(&mut session, &["p1".to_string()], Some("CT"));
        assert!(result.success);
        assert_eq!(result.folder.as_deref(), Some("CT"));

        let in_ct = list_records(&session, &FolderFilter::for_folder(Some("CT")), "");
        assert_eq!(ids(&in_ct), vec!["p1"]);
        let home = list_records(&session, &FolderFilter::Home, "");
        assert_eq!(ids(&home), vec!["p2"]);

        let result = move_records(&mut session, &["p1".to_string()], None);
        assert_eq!(result.folder.as_deref(), Some(""));
        assert_eq!(list_records(&session, &FolderFilter::Home, "").len(), 2);
    }

    #[test]
    fn test_move_to_malformed_folder_fails() {
        let temp_dir = tempdir().unwrap();
        let mut session = session_in(temp_dir.path());
        let result = move_records(&mut session, &["p1".to_string()], Some("a//b"));
        assert_eq!(result.error_kind, Some(ErrorKind::InvalidPath));
    }

    #[test]
    fn test_flags_filter_listing() {
        let temp_dir = tempdir().unwrap();
        let mut session = session_in(temp_dir.path());
        let both = vec!["p1".to_string(), "p2".to_string()];

        assert!(set_pinned(&mut session, &both[..1], true).success);
        assert!(set_hidden(&mut session, &both[1..], true).success);

        assert_eq!(ids(&list_records(&session, &FolderFilter::Pinned, "")), vec!["p1"]);
        assert_eq!(ids(&list_records(&session, &FolderFilter::All, "")), vec!["p1"]);
        assert!(list_records(&session, &FolderFilter::All, "ada").is_empty());

        assert!(set_hidden(&mut session, &both, false).success);
        assert_eq!(ids(&list_records(&session, &FolderFilter::All, "ada")), vec!["p2"]);
    }

    #[test]
    fn test_set_notes() {
        let temp_dir = tempdir().unwrap();
        let mut session = session_in(temp_dir.path());

        assert!(set_notes(&mut session, "p1", Some("camera ready".to_string())).success);
        assert_eq!(
            session.record("p1").unwrap().local.notes.as_deref(),
            Some("camera ready")
        );
        assert_eq!(set_notes(&mut session, "", None).error_kind, Some(ErrorKind::InvalidInput));
    }

    #[test]
    fn test_reload_if_changed() {
        let temp_dir = tempdir().unwrap();
        let mut session = session_in(temp_dir.path());
        assert!(!reload_if_changed(&mut session));

        // Written by a second session on the same files
        let mut other = session_in(temp_dir.path());
        other.move_records(["p2"], Some("Elsewhere")).unwrap();
        let path = session.files().directory_structure_file.clone();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(std::time::SystemTime::now() + std::time::Duration::from_secs(60))
            .unwrap();

        assert!(reload_if_changed(&mut session));
        assert_eq!(session.record("p2").unwrap().local.folder, "Elsewhere");
        assert!(!reload_if_changed(&mut session));
    }
}
