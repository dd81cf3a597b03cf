//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod parse;
pub mod stats;

use std::path::Path;

use ridelog_core::models::config::RidelogConfig;

/// Load the config from an explicit `--config` path, else the default
/// location if it exists, else defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<RidelogConfig> {
    if let Some(path) = path {
        return Ok(RidelogConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        Ok(RidelogConfig::from_file(&default_path)?)
    } else {
        Ok(RidelogConfig::default())
    }
}
