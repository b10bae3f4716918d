//! Runtime settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths;

/// Settings for a patchwatch run.
///
/// Every field has a default, so a partial (or empty) file is valid.
///
/// # TOML Format
///
/// ```toml
/// host = "127.0.0.1"
/// port = 3000
/// patch_dir = "patches"
/// channels = 2
/// pd_bin = "pd"
/// gui = false
/// spawn_engine = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PatchwatchConfig {
    /// Host the engine's `netreceive` listens on.
    pub host: String,

    /// TCP port of the engine's `netreceive`.
    pub port: u16,

    /// Directory holding the effect patch library.
    pub patch_dir: PathBuf,

    /// Number of audio channels in the rack.
    pub channels: usize,

    /// Path or name of the Pd binary.
    pub pd_bin: PathBuf,

    /// Start the engine with its GUI.
    pub gui: bool,

    /// Spawn the engine; when false, connect to one already running.
    pub spawn_engine: bool,
}

impl Default for PatchwatchConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            patch_dir: PathBuf::from("patches"),
            channels: 2,
            pd_bin: PathBuf::from("pd"),
            gui: false,
            spawn_engine: true,
        }
    }
}

impl PatchwatchConfig {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load settings from `path`, or defaults if the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load the user configuration file, or defaults.
    pub fn load_user() -> Result<Self, ConfigError> {
        Self::load_or_default(paths::config_file())
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            paths::ensure_dir_exists(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Serialize settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects settings no run can start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::invalid("port", "must be non-zero"));
        }
        if self.channels == 0 {
            return Err(ConfigError::invalid("channels", "need at least one channel"));
        }
        if self.pd_bin.as_os_str().is_empty() {
            return Err(ConfigError::invalid("pd_bin", "binary path is empty"));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid("host", "host is empty"));
        }
        Ok(())
    }

    /// Patch library directory, resolved against `base` when relative.
    pub fn patch_dir_in(&self, base: &Path) -> PathBuf {
        paths::resolve(base, &self.patch_dir)
    }
}
