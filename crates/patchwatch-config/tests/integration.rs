//! Integration tests for patchwatch-config.

use std::path::PathBuf;

use patchwatch_config::{ConfigError, PatchwatchConfig};
use tempfile::TempDir;

#[test]
fn save_then_load_through_nested_dirs() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("dir").join("config.toml");

    let config = PatchwatchConfig {
        port: 3100,
        channels: 4,
        pd_bin: PathBuf::from("/usr/local/bin/pd"),
        spawn_engine: false,
        ..Default::default()
    };
    config.save(&path).unwrap();
    assert!(path.exists());

    let loaded = PatchwatchConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let temp = TempDir::new().unwrap();
    let config = PatchwatchConfig::load_or_default(temp.path().join("absent.toml")).unwrap();
    assert_eq!(config, PatchwatchConfig::default());
}

#[test]
fn load_reports_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.toml");
    let err = PatchwatchConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { path: ref p, .. } if *p == path));
}

#[test]
fn hand_written_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
host = "10.0.0.2"
patch_dir = "/srv/effects"
channels = 1
"#,
    )
    .unwrap();

    let config = PatchwatchConfig::load(&path).unwrap();
    assert_eq!(config.host, "10.0.0.2");
    assert_eq!(config.channels, 1);
    assert_eq!(config.port, 3000);
    assert_eq!(
        config.patch_dir_in(temp.path()),
        PathBuf::from("/srv/effects")
    );
    config.validate().unwrap();
}

#[test]
fn zero_channels_loads_but_fails_validation() {
    let config = PatchwatchConfig::from_toml("channels = 0").unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue { key: "channels", .. })
    ));
}
