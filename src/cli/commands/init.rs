//! Write a starter configuration file.
//!
//! The file lands at the resolved config path (`--config`, `RAGE_CONFIG`,
//! or `~/.rage/config.json`). Edit `secretKey` and `dbs` before pulling.

use std::path::Path;

use serde::Serialize;

use crate::config::{
    DatabaseKind, DatabaseSettings, MethodSettings, RageConfiguration, SyncMethod,
    resolve_config_path, save_config,
};
use crate::error::{Error, Result};

/// Default pull interval for `rage watch`, in milliseconds.
const DEFAULT_INTERVAL_MS: u64 = 60_000;

#[derive(Serialize)]
struct InitOutput<'a> {
    path: &'a Path,
    config: &'a RageConfiguration,
}

/// Starter configuration written by `rage init`.
#[must_use]
pub fn default_configuration() -> RageConfiguration {
    RageConfiguration {
        method: SyncMethod::Pai,
        method_specific_settings: MethodSettings {
            interval: Some(DEFAULT_INTERVAL_MS),
        },
        database_type: DatabaseKind::MongoDb,
        database_specific_settings: DatabaseSettings {
            secret_key: Some("mongodb://localhost:27017".to_string()),
            dbs: Some(Vec::new()),
            exclude_collections: Some(Vec::new()),
        },
        loop_start_delay: 0,
        out_dir: "./mirror".to_string(),
    }
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `Error::ConfigExists` if the file exists and `force` is false, or
/// an error if it cannot be written.
pub fn execute(config_path: Option<&Path>, force: bool, json: bool) -> Result<()> {
    let path = resolve_config_path(config_path)?;
    if path.exists() && !force {
        return Err(Error::ConfigExists { path });
    }

    let config = default_configuration();
    save_config(&path, &config)?;

    if json {
        let output = InitOutput {
            path: &path,
            config: &config,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Wrote configuration to {}", path.display());
        println!("  Set databaseSpecificSettings.secretKey and dbs, then run `rage pull`.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rage").join("config.json");

        execute(Some(&path), false, true).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, default_configuration());
    }

    #[test]
    fn test_init_refuses_overwrite_without_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();

        let err = execute(Some(&path), false, true).unwrap_err();
        assert!(matches!(err, Error::ConfigExists { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");

        execute(Some(&path), true, true).unwrap();
        assert!(load_config(&path).is_ok());
    }
}
