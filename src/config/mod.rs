//! Configuration management.
//!
//! This module loads the persisted rage configuration and resolves the
//! paths a run needs (configuration file, mirror root).
//!
//! # File Format
//!
//! ```json
//! {
//!   "method": "PAI",
//!   "methodSpecificSettings": { "interval": 60000 },
//!   "databaseType": "MongoDB",
//!   "databaseSpecificSettings": {
//!     "secretKey": "mongodb://localhost:27017",
//!     "dbs": ["shop"],
//!     "excludeCollections": ["sessions"]
//!   },
//!   "loopStartDelay": 0,
//!   "outDir": "./mirror"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mirror::atomic_write;
use crate::selection::DatabaseSelection;

/// Environment variable consulted when `--config` is not given.
pub const CONFIG_ENV: &str = "RAGE_CONFIG";

/// Synchronization method tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMethod {
    /// Pull at a fixed interval.
    #[default]
    #[serde(rename = "PAI")]
    Pai,
    /// No interval: one pass per invocation.
    #[serde(rename = "NI")]
    Ni,
    /// Pull on user request.
    #[serde(rename = "POU")]
    Pou,
}

impl std::fmt::Display for SyncMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pai => write!(f, "PAI"),
            Self::Ni => write!(f, "NI"),
            Self::Pou => write!(f, "POU"),
        }
    }
}

/// Kind of remote database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseKind {
    #[default]
    #[serde(rename = "MongoDB")]
    MongoDb,
}

/// Settings that only apply to some sync methods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSettings {
    /// Delay between loop iterations, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
}

/// Database-specific settings as they appear on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_collections: Option<Vec<String>>,
}

/// Persisted rage settings.
///
/// Immutable for the duration of a run. Only the selection derived from it
/// may be overridden from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RageConfiguration {
    pub method: SyncMethod,
    #[serde(default)]
    pub method_specific_settings: MethodSettings,
    pub database_type: DatabaseKind,
    #[serde(default)]
    pub database_specific_settings: DatabaseSettings,
    #[serde(default)]
    pub loop_start_delay: u64,
    #[serde(default)]
    pub out_dir: String,
}

impl RageConfiguration {
    /// Build the normalized selection stored in this configuration.
    #[must_use]
    pub fn selection(&self) -> DatabaseSelection {
        let settings = &self.database_specific_settings;
        DatabaseSelection::new(
            settings.secret_key.clone().unwrap_or_default(),
            settings.dbs.clone().unwrap_or_default(),
            settings.exclude_collections.clone().unwrap_or_default(),
        )
    }
}

/// Get the default config file location: `~/.rage/config.json`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".rage").join("config.json"))
}

/// Resolve the configuration file path.
///
/// Priority:
/// 1. Explicit `--config` path
/// 2. `RAGE_CONFIG` environment variable
/// 3. `~/.rage/config.json`
///
/// # Errors
///
/// Returns `Error::Config` if no location can be determined.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    default_config_path().ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Load a configuration file.
///
/// # Errors
///
/// Returns `Error::ConfigNotFound` if the file does not exist and
/// `Error::Config` if it cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<RageConfiguration> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Save a configuration file as pretty-printed JSON.
///
/// # Errors
///
/// Returns `Error::Config` if the file cannot be serialized or written.
pub fn save_config(path: &Path, config: &RageConfiguration) -> Result<()> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

    atomic_write(path, &content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))
}

/// Resolve the mirror root directory.
///
/// An explicit `--mirror` path wins over the configured `outDir`.
///
/// # Errors
///
/// Returns `Error::Config` if neither is set.
pub fn resolve_mirror_root(explicit_path: Option<&Path>, config: &RageConfiguration) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(path.to_path_buf());
    }

    let out_dir = config.out_dir.trim();
    if out_dir.is_empty() {
        return Err(Error::Config(
            "No mirror directory: set outDir in the config or pass --mirror".into(),
        ));
    }

    Ok(PathBuf::from(out_dir))
}
