//! Helpers shared by several commands.

use std::path::{Path, PathBuf};

use patchwatch_config::{PatchwatchConfig, config_file};

/// Loads `path`, or the user configuration file when no path is given.
///
/// An explicitly named file must exist; the default one may be absent.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PatchwatchConfig> {
    let config = match path {
        Some(path) => PatchwatchConfig::load(path)?,
        None => PatchwatchConfig::load_or_default(config_file())?,
    };
    Ok(config)
}

/// Patch library directory: the override if given, else the configured one,
/// resolved against the working directory.
pub fn patch_dir(config: &PatchwatchConfig, dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match dir {
        Some(dir) => patchwatch_config::paths::resolve(&cwd, &dir),
        None => config.patch_dir_in(&cwd),
    })
}
