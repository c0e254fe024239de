//! Platform path resolution.

use std::path::PathBuf;

use ragline_core::error::{RaglineError, Result};

const APP_DIR: &str = "ragline";

/// Returns the ragline config directory (e.g. `~/.config/ragline`).
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| RaglineError::config("could not determine the platform config directory"))
}

/// Path of the shared application state file.
pub fn state_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("state.toml"))
}

/// Path of the client configuration file.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}
