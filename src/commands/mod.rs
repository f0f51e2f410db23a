//! Entry points for a UI bridge.
//!
//! Each command runs one session operation and reports the outcome as an
//! [`ApiResult`] instead of an error, so the caller can render the message
//! and keep going.

pub mod folders;
pub mod records;

pub use folders::*;
pub use records::*;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

/// Outcome of a command as sent to the UI.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Offending project of a refused delete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

impl ApiResult {
    /// Create a successful result
    pub fn success() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Create a success result naming the folder that was affected
    pub fn with_folder(folder: impl Into<String>) -> Self {
        Self {
            success: true,
            folder: Some(folder.into()),
            ..Default::default()
        }
    }

    /// Create an error result carrying the error's kind and, for a refused
    /// delete, the blocking project and its folder
    pub fn from_error(err: &Error) -> Self {
        let mut result = Self::error(err.to_string());
        result.error_kind = Some(err.kind());
        if let Error::FolderNotEmpty {
            record_id,
            record_folder,
            ..
        } = err
        {
            result.record_id = Some(record_id.clone());
            result.folder = Some(record_folder.clone());
        }
        result
    }
}

impl<T> From<crate::error::Result<T>> for ApiResult {
    fn from(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(_) => ApiResult::success(),
            Err(e) => ApiResult::from_error(&e),
        }
    }
}
