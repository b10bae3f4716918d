//! Configuration for patchwatch.
//!
//! Loads `config.toml` from the user config directory, fills any missing
//! setting with its default, and checks the result before a run starts.
//!
//! # Example
//!
//! ```rust,no_run
//! use patchwatch_config::{PatchwatchConfig, paths};
//!
//! let mut config = PatchwatchConfig::load_user().unwrap();
//! config.channels = 4;
//! config.validate().unwrap();
//! config.save(paths::config_file()).unwrap();
//! ```

mod config;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

pub use config::PatchwatchConfig;
pub use error::ConfigError;
pub use paths::{config_file, user_config_dir};
