//! Configuration loading.
//!
//! Resolves the config path, creates a default file on first run, parses the
//! TOML, merges `geo.toml` coordinates and validates the result.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::validation::validate_config;
use super::{Config, GeoConfig};
use crate::common::constants::*;
use crate::common::utils::private_path;

/// Path of `salahtime.toml`, inside `custom_dir` when given or the XDG
/// config directory otherwise.
pub fn get_config_path(custom_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = custom_dir {
        return Ok(dir.join(CONFIG_FILE_NAME));
    }
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(APP_NAME).join(CONFIG_FILE_NAME))
}

/// Load the configuration, creating a default file if none exists.
///
/// Returns the configuration together with the path it was read from.
pub fn load(custom_dir: Option<&Path>) -> Result<(Config, PathBuf)> {
    let config_path = get_config_path(custom_dir)?;

    if !config_path.exists() {
        log_block_start!("No configuration found");
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
    }

    let config = load_from_path(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            private_path(&config_path)
        )
    })?;
    Ok((config, config_path))
}

/// Load configuration from a specific path. Does not create anything.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    // geo.toml values are validated along with everything else
    load_geo_override_from_path(&mut config, path);

    validate_config(&config)?;

    Ok(config)
}

/// Merge coordinates from a `geo.toml` next to `config_path`.
///
/// A missing file is normal. An unreadable or malformed one is reported and
/// ignored so the main config still loads.
pub(crate) fn load_geo_override_from_path(config: &mut Config, config_path: &Path) {
    let Some(geo_path) = config_path.parent().map(|dir| dir.join("geo.toml")) else {
        return;
    };
    if !geo_path.exists() {
        return;
    }

    match fs::read_to_string(&geo_path) {
        Ok(content) => match toml::from_str::<GeoConfig>(&content) {
            Ok(geo_config) => {
                if let Some(lat) = geo_config.latitude {
                    config.latitude = Some(lat);
                }
                if let Some(lon) = geo_config.longitude {
                    config.longitude = Some(lon);
                }
            }
            Err(e) => {
                log_warning!("Failed to parse geo.toml: {e}. Using coordinates from main config.");
            }
        },
        Err(e) => {
            log_warning!("Failed to read geo.toml: {e}. Using coordinates from main config.");
        }
    }
}
