//! Status command implementation.
//!
//! Reads the mirror tree only; the remote store is never contacted.

use std::path::{Path, PathBuf};

use crate::config;
use crate::error::Result;
use crate::mirror::{get_mirror_status, print_status};

/// Resolve the mirror root: `--mirror` if given, otherwise the config's `outDir`.
fn resolve_root(config_path: Option<&Path>, mirror: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = mirror {
        return Ok(path.to_path_buf());
    }
    let path = config::resolve_config_path(config_path)?;
    let config = config::load_config(&path)?;
    config::resolve_mirror_root(None, &config)
}

/// Execute the status command.
///
/// # Errors
///
/// Returns an error if the mirror root cannot be resolved or does not exist.
pub fn execute(config_path: Option<&Path>, mirror: Option<&Path>, json: bool) -> Result<()> {
    let root = resolve_root(config_path, mirror)?;
    let status = get_mirror_status(&root)?;

    if json {
        println!("{}", serde_json::to_string(&status)?);
    } else {
        print_status(&status);
    }

    Ok(())
}
