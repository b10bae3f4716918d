//! Platform-specific paths for configuration.
//!
//! - **User config**: `~/.config/patchwatch/` (Linux), `~/Library/Application Support/patchwatch/` (macOS), `%APPDATA%\patchwatch\` (Windows)
//!
//! # Example
//!
//! ```rust,no_run
//! use patchwatch_config::paths;
//!
//! println!("Config file: {:?}", paths::config_file());
//! ```

use std::path::{Path, PathBuf};

/// Application name used for directory paths.
const APP_NAME: &str = "patchwatch";

/// File name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";

/// Returns the user-specific configuration directory.
///
/// # Platform Paths
///
/// - Linux: `~/.config/patchwatch/`
/// - macOS: `~/Library/Application Support/patchwatch/`
/// - Windows: `%APPDATA%\patchwatch\`
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the path of the user configuration file.
pub fn config_file() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

/// Resolves `path` against `base` unless it is already absolute.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir_exists(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
