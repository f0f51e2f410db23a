//! Remote project entries and the sources that supply them.
//!
//! Fetching from the remote service itself happens elsewhere; this module
//! only defines the seam ([`RemoteRecordSource`]) and the cache file the
//! fetcher leaves behind.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::filesystem::{write_atomic, ProfileFiles};
use crate::models::RemoteFields;

/// One unparsed remote entry as found in the cache.
pub type RawEntry = Value;

/// Supplies the flat list of remote entries for one refresh cycle.
pub trait RemoteRecordSource {
    fn fetch_records(&self) -> Result<Vec<RawEntry>>;
}

/// Parses an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (with offset) and naive date-times, which are taken to
/// be UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn required_str<'a>(
    obj: &'a serde_json::Map<String, Value>,
    key: &str,
    index: usize,
) -> Result<&'a str> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::MalformedEntry {
            index,
            reason: format!("missing or non-string '{}'", key),
        })
}

fn optional_str(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Parses one raw entry into remote fields.
///
/// # Arguments
/// * `index` - Position of the entry in the source list, used in errors
/// * `entry` - The raw JSON object
///
/// # Returns
/// * `Ok(RemoteFields)` - If `id`, `name` and `url` are present strings and `id` is non-empty
/// * `Err(Error::MalformedEntry)` - Otherwise
pub fn parse_remote_entry(index: usize, entry: &RawEntry) -> Result<RemoteFields> {
    let obj = entry.as_object().ok_or_else(|| Error::MalformedEntry {
        index,
        reason: "entry is not an object".to_string(),
    })?;

    let id = required_str(obj, "id", index)?;
    if id.is_empty() {
        return Err(Error::MalformedEntry {
            index,
            reason: "empty 'id'".to_string(),
        });
    }
    let name = required_str(obj, "name", index)?;
    let url = required_str(obj, "url", index)?;

    let last_modified = obj.get("last_modified").and_then(|v| v.as_str()).and_then(|raw| {
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            log::debug!("Unparseable last_modified '{}' for project '{}'", raw, id);
        }
        parsed
    });

    Ok(RemoteFields {
        id: id.to_string(),
        name: name.to_string(),
        url: url.to_string(),
        owner_label: optional_str(obj, "owner_label"),
        last_modified_raw: optional_str(obj, "last_modified_raw"),
        last_modified,
        archived: obj.get("archived").and_then(|v| v.as_bool()).unwrap_or(false),
    })
}

/// Parses every entry, logging and skipping the malformed ones.
///
/// One bad entry never blanks the whole list.
pub fn parse_remote_entries(entries: &[RawEntry]) -> Vec<RemoteFields> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match parse_remote_entry(index, entry) {
            Ok(remote) => Some(remote),
            Err(e) => {
                log::warn!("Skipping remote entry: {}", e);
                None
            }
        })
        .collect()
}

/// Reads remote entries from the cached JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonCacheSource {
    path: PathBuf,
}

impl JsonCacheSource {
    pub fn new(files: &ProfileFiles) -> Self {
        Self::with_path(files.projects_info_file.clone())
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RemoteRecordSource for JsonCacheSource {
    /// A missing cache is an empty list (nothing fetched yet); a cache that is
    /// not a JSON array is an error.
    fn fetch_records(&self) -> Result<Vec<RawEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        match serde_json::from_str(&content)? {
            Value::Array(entries) => Ok(entries),
            _ => Err(Error::Serialization(format!(
                "remote cache {} is not a JSON array",
                self.path.display()
            ))),
        }
    }
}

/// In-memory source holding a fixed list of entries.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: Vec<RawEntry>,
}

impl StaticSource {
    pub fn new(entries: Vec<RawEntry>) -> Self {
        Self { entries }
    }

    /// Builds a source from already-parsed remote fields.
    pub fn from_remote(records: &[RemoteFields]) -> Result<Self> {
        let entries = records
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }
}

impl RemoteRecordSource for StaticSource {
    fn fetch_records(&self) -> Result<Vec<RawEntry>> {
        Ok(self.entries.clone())
    }
}

/// Writes a freshly fetched project list to the profile's remote cache.
pub fn write_remote_cache(files: &ProfileFiles, records: &[RemoteFields]) -> Result<()> {
    let mut content = serde_json::to_string_pretty(records)?;
    content.push('\n');
    write_atomic(&files.projects_info_file, content.as_bytes())?;
    log::debug!(
        "Wrote {} remote project(s) to {}",
        records.len(),
        files.projects_info_file.display()
    );
    Ok(())
}
