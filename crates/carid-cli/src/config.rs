//! Configuration file handling for carid

use anyhow::{Context, Result};
use carid_uds::CaridConfig;
use std::path::{Path, PathBuf};

/// Load the configuration
///
/// An explicit path must exist. Without one, the default location is used
/// when present and built-in defaults otherwise.
pub fn load(explicit: Option<&Path>) -> Result<CaridConfig> {
    if let Some(path) = explicit {
        return load_from(path);
    }

    let path = config_path()?;
    if path.exists() {
        load_from(&path)
    } else {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        Ok(CaridConfig::default())
    }
}

/// Load configuration from a specific path
pub fn load_from(path: &Path) -> Result<CaridConfig> {
    CaridConfig::load(path)
        .with_context(|| format!("Failed to load config file: {}", path.display()))
}

/// Get the default config file path
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("carid");

    Ok(config_dir.join("config.toml"))
}
