//! Error types for vfolders.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for directory-structure and reconciliation operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed folder argument, rejected before any I/O
    #[error("Invalid folder path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Delete blocked because a record is still assigned inside the subtree
    #[error("Cannot delete folder '{folder}': project '{record_id}' is assigned to folder '{record_folder}'")]
    FolderNotEmpty {
        folder: String,
        record_id: String,
        record_folder: String,
    },

    /// File I/O operation failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// One remote entry could not be parsed
    #[error("Malformed remote entry #{index}: {reason}")]
    MalformedEntry { index: usize, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Profile id not present in the configuration
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Coarse category suitable for rendering a user-facing message.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidPath { .. } => ErrorKind::InvalidPath,
            Error::FolderNotEmpty { .. } => ErrorKind::FolderNotEmpty,
            Error::Io { .. } => ErrorKind::Io,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::MalformedEntry { .. } => ErrorKind::MalformedEntry,
            Error::Config(_) | Error::ProfileNotFound(_) => ErrorKind::Config,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Serializable error category carried by [`crate::commands::ApiResult`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidPath,
    FolderNotEmpty,
    Io,
    Serialization,
    MalformedEntry,
    Config,
    InvalidInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_not_empty_message_names_record() {
        let err = Error::FolderNotEmpty {
            folder: "Teaching".to_string(),
            record_id: "p1".to_string(),
            record_folder: "Teaching/2025".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Teaching"));
        assert!(msg.contains("p1"));
        assert!(msg.contains("Teaching/2025"));
        assert_eq!(err.kind(), ErrorKind::FolderNotEmpty);
    }

    #[test]
    fn test_serde_json_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse_err.into();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::FolderNotEmpty).unwrap();
        assert_eq!(json, "\"folder_not_empty\"");
    }
}
