use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filesystem::{write_atomic, ProfileFiles};

/// Name of the per-user bootstrap directory under the home directory.
pub const APP_DIR_NAME: &str = ".vfolders";

/// Name of the bootstrap configuration file.
pub const CONFIG_FILENAME: &str = "config.json";

/// Id and display name of the profile created on first run.
pub const DEFAULT_PROFILE_ID: &str = "primary";
pub const DEFAULT_PROFILE_DISPLAY_NAME: &str = "Primary";

/// Base URL of the remote service used when a profile does not set one.
pub const DEFAULT_BASE_URL: &str = "https://www.overleaf.com";

/// Settings of one profile.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProfileConfig {
    pub display_name: String,
    /// Subdirectory of the profile root holding this profile's files
    pub relative_path: String,
    pub base_url: String,
}

impl ProfileConfig {
    fn named(id: &str, display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            relative_path: id.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Bootstrap configuration: where profiles live and which one is active.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Root directory of all profile directories, often a synced folder.
    /// Unset until the user picks one.
    pub profile_root_dir: Option<PathBuf>,
    pub profiles: BTreeMap<String, ProfileConfig>,
    pub active_profile: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            DEFAULT_PROFILE_ID.to_string(),
            ProfileConfig::named(DEFAULT_PROFILE_ID, DEFAULT_PROFILE_DISPLAY_NAME),
        );
        Self {
            profile_root_dir: None,
            profiles,
            active_profile: DEFAULT_PROFILE_ID.to_string(),
        }
    }
}

impl AppConfig {
    /// Re-establishes the invariants: the default profile exists, every
    /// profile has a base URL and relative path, and the active profile is
    /// a known one.
    fn normalize(&mut self) {
        self.profiles
            .entry(DEFAULT_PROFILE_ID.to_string())
            .or_insert_with(|| ProfileConfig::named(DEFAULT_PROFILE_ID, DEFAULT_PROFILE_DISPLAY_NAME));

        for (id, profile) in self.profiles.iter_mut() {
            if profile.base_url.trim().is_empty() {
                profile.base_url = DEFAULT_BASE_URL.to_string();
            }
            if let Err(e) = validate_relative_path(&profile.relative_path) {
                if !profile.relative_path.is_empty() {
                    log::warn!("Profile '{}': {}; using '{}' instead", id, e, id);
                }
                profile.relative_path = id.clone();
            }
            if profile.display_name.trim().is_empty() {
                profile.display_name = id.clone();
            }
        }

        if !self.profiles.contains_key(&self.active_profile) {
            self.active_profile = DEFAULT_PROFILE_ID.to_string();
        }
    }
}

fn merge_profile(id: &str, value: &serde_json::Value) -> ProfileConfig {
    let mut profile = ProfileConfig::named(id, id);
    if let Some(obj) = value.as_object() {
        if let Some(v) = obj.get("display_name").and_then(|v| v.as_str()) {
            profile.display_name = v.to_string();
        }
        if let Some(v) = obj.get("relative_path").and_then(|v| v.as_str()) {
            profile.relative_path = v.to_string();
        }
        if let Some(v) = obj.get("base_url").and_then(|v| v.as_str()) {
            profile.base_url = v.to_string();
        }
    }
    profile
}

/// Merges a partial config JSON with defaults.
///
/// Missing or mistyped fields take their default values; unknown fields are
/// ignored.
///
/// # Arguments
/// * `partial_json` - JSON string with partial configuration
///
/// # Returns
/// * `Ok(AppConfig)` - The merged configuration
/// * `Err(Error)` - If the text is not JSON
pub fn merge_config_with_defaults(partial_json: &str) -> Result<AppConfig> {
    if partial_json.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    let json_value: serde_json::Value = serde_json::from_str(partial_json)?;

    let mut config = AppConfig::default();

    if let Some(obj) = json_value.as_object() {
        if let Some(v) = obj.get("profile_root_dir").and_then(|v| v.as_str()) {
            if !v.trim().is_empty() {
                config.profile_root_dir = Some(PathBuf::from(v));
            }
        }
        if let Some(v) = obj.get("profiles").and_then(|v| v.as_object()) {
            for (id, profile) in v {
                if let Err(e) = validate_profile_id(id) {
                    log::warn!("Ignoring profile: {}", e);
                    continue;
                }
                config.profiles.insert(id.clone(), merge_profile(id, profile));
            }
        }
        if let Some(v) = obj.get("active_profile").and_then(|v| v.as_str()) {
            config.active_profile = v.to_string();
        }
    }

    config.normalize();
    Ok(config)
}

/// Default location of the bootstrap config, `~/.vfolders/config.json`.
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;
    Ok(home.join(APP_DIR_NAME).join(CONFIG_FILENAME))
}

/// Checks that a profile directory stays directly inside the profile root.
///
/// # Returns
/// * `Ok(())` - If the path is a single non-empty directory name
/// * `Err(Error::Config)` - If it is empty, absolute, contains `..` or a separator
fn validate_relative_path(relative_path: &str) -> Result<()> {
    if relative_path.trim().is_empty() {
        return Err(Error::Config("profile directory is empty".to_string()));
    }
    if relative_path.contains("..") {
        return Err(Error::Config(format!(
            "profile directory '{}' contains invalid traversal pattern '..'",
            relative_path
        )));
    }
    if relative_path.contains('/') || relative_path.contains('\\') {
        return Err(Error::Config(format!(
            "profile directory '{}' contains a path separator",
            relative_path
        )));
    }
    Ok(())
}

fn validate_profile_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "profile id '{}' must be non-empty and use only letters, digits, '-' or '_'",
            id
        )))
    }
}

/// ConfigManager handles loading, saving, and updating the bootstrap
/// configuration.
///
/// Features:
/// - Thread-safe access via RwLock
/// - Merges saved config with defaults for missing fields
/// - Atomic saves
/// - Resolves the active profile's [`ProfileFiles`]
pub struct ConfigManager {
    /// The current configuration
    config: RwLock<AppConfig>,
    /// Path to the configuration file
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new ConfigManager with the given config file path.
    ///
    /// Loads existing configuration from disk, merging with defaults for any
    /// missing fields. A missing file yields the defaults.
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let config = Self::load_from_file(&config_path)?;
        Ok(Self {
            config: RwLock::new(config),
            config_path,
        })
    }

    /// Creates a ConfigManager at [`default_config_path`].
    pub fn open_default() -> Result<Self> {
        Self::new(default_config_path()?)
    }

    fn load_from_file(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        merge_config_with_defaults(&content)
    }

    fn lock_error() -> Error {
        Error::Config("configuration lock poisoned".to_string())
    }

    /// Gets a clone of the current configuration.
    pub fn get(&self) -> Result<AppConfig> {
        self.config
            .read()
            .map(|config| config.clone())
            .map_err(|_| Self::lock_error())
    }

    /// Updates the configuration using a closure, then restores invariants.
    /// Call [`Self::save_sync`] to persist.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().map_err(|_| Self::lock_error())?;
        f(&mut config);
        config.normalize();
        Ok(())
    }

    /// Saves the configuration to disk immediately.
    pub fn save_sync(&self) -> Result<()> {
        let config = self.get()?;
        let mut content = serde_json::to_string_pretty(&config)?;
        content.push('\n');
        write_atomic(&self.config_path, content.as_bytes())
    }

    /// Returns the config file path.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Directory under which all profile directories live.
    ///
    /// # Returns
    /// * `Err(Error::Config)` - If no root has been chosen yet
    pub fn profile_root_dir(&self) -> Result<PathBuf> {
        self.get()?.profile_root_dir.ok_or_else(|| {
            Error::Config("No profile root directory is configured".to_string())
        })
    }

    /// Sets and persists the profile root directory.
    pub fn set_profile_root_dir(&self, root: PathBuf) -> Result<()> {
        self.update(|config| config.profile_root_dir = Some(root))?;
        self.save_sync()
    }

    /// Id of the active profile.
    pub fn active_profile_id(&self) -> Result<String> {
        Ok(self.get()?.active_profile)
    }

    /// Switches the active profile and persists the choice.
    pub fn set_active_profile(&self, id: &str) -> Result<()> {
        if !self.get()?.profiles.contains_key(id) {
            return Err(Error::ProfileNotFound(id.to_string()));
        }
        self.update(|config| config.active_profile = id.to_string())?;
        self.save_sync()
    }

    /// Adds a profile whose files live in `<root>/<id>`.
    pub fn add_profile(&self, id: &str, display_name: Option<&str>) -> Result<()> {
        validate_profile_id(id)?;
        if self.get()?.profiles.contains_key(id) {
            return Err(Error::InvalidInput(format!("profile '{}' already exists", id)));
        }
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(id);
        let profile = ProfileConfig::named(id, display_name);
        self.update(|config| {
            config.profiles.insert(id.to_string(), profile);
        })?;
        self.save_sync()
    }

    /// Changes a profile's display name.
    pub fn rename_profile(&self, id: &str, display_name: &str) -> Result<()> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(Error::InvalidInput("display name cannot be empty".to_string()));
        }
        if !self.get()?.profiles.contains_key(id) {
            return Err(Error::ProfileNotFound(id.to_string()));
        }
        self.update(|config| {
            if let Some(profile) = config.profiles.get_mut(id) {
                profile.display_name = display_name.to_string();
            }
        })?;
        self.save_sync()
    }

    /// Removes a profile from the configuration. Its directory and data
    /// files are left on disk. The default profile cannot be removed; if the
    /// active profile is removed the default becomes active.
    pub fn remove_profile(&self, id: &str) -> Result<()> {
        if id == DEFAULT_PROFILE_ID {
            return Err(Error::InvalidInput(
                "the default profile cannot be removed".to_string(),
            ));
        }
        if !self.get()?.profiles.contains_key(id) {
            return Err(Error::ProfileNotFound(id.to_string()));
        }
        self.update(|config| {
            config.profiles.remove(id);
        })?;
        self.save_sync()
    }

    /// Sets the base URL of the remote service for the active profile.
    pub fn set_base_url(&self, url: &str) -> Result<()> {
        self.update(|config| {
            let active = config.active_profile.clone();
            if let Some(profile) = config.profiles.get_mut(&active) {
                profile.base_url = url.trim().to_string();
            }
        })?;
        self.save_sync()
    }

    /// Configuration of the active profile.
    pub fn active_profile(&self) -> Result<ProfileConfig> {
        let config = self.get()?;
        config
            .profiles
            .get(&config.active_profile)
            .cloned()
            .ok_or(Error::ProfileNotFound(config.active_profile))
    }

    /// Files of profile `id`, rooted at the profile root directory.
    pub fn profile_files(&self, id: &str) -> Result<ProfileFiles> {
        let root = self.profile_root_dir()?;
        let config = self.get()?;
        let profile = config
            .profiles
            .get(id)
            .ok_or_else(|| Error::ProfileNotFound(id.to_string()))?;
        validate_relative_path(&profile.relative_path)?;
        Ok(ProfileFiles::new_with_base(&root.join(&profile.relative_path)))
    }

    /// Files of the active profile.
    pub fn active_profile_files(&self) -> Result<ProfileFiles> {
        self.profile_files(&self.active_profile_id()?)
    }
}
