//! Virtual folder organization for remotely hosted projects.
//!
//! Projects come from a remote service as a flat list. This crate keeps a
//! local, purely virtual folder hierarchy plus per-project notes, pinned and
//! hidden flags in a JSON file next to the cached remote list, and merges the
//! two into one index.

pub mod change;
pub mod commands;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod index;
pub mod models;
pub mod paths;
pub mod remote;
pub mod session;
pub mod store;
pub mod view;

pub use change::{ChangeDetector, FileStamp, Snapshot};
pub use config::{AppConfig, ConfigManager, ProfileConfig};
pub use error::{Error, ErrorKind, Result};
pub use filesystem::ProfileFiles;
pub use index::ReconciliationEngine;
pub use models::{DirectoryStructure, FolderInfo, FolderNode, Index, LocalFields, Record, RemoteFields};
pub use remote::{JsonCacheSource, RawEntry, RemoteRecordSource, StaticSource};
pub use session::ProfileSession;
pub use store::DirectoryStructureStore;
pub use view::FolderFilter;
