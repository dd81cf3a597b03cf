//! Configuration structures for the ride pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that overrides `routing.api_key`.
pub const ROUTING_KEY_ENV: &str = "RIDELOG_ROUTING_KEY";

/// Main configuration for the ridelog pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RidelogConfig {
    /// Receipt extraction configuration.
    pub extraction: ExtractionConfig,

    /// Routing service configuration.
    pub routing: RoutingConfig,

    /// Database configuration.
    pub storage: StorageConfig,

    /// Export configuration.
    pub export: ExportConfig,
}

/// Receipt extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// JSON file mapping receipt ids to override timestamps.
    /// When unset, the built-in table is used.
    pub overrides_path: Option<PathBuf>,

    /// Only messages whose subject contains this text (case-insensitive)
    /// are treated as receipts.
    pub subject_filter: Option<String>,
}

/// Routing service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Query the routing service during batch runs.
    pub enabled: bool,

    /// Directions endpoint returning JSON.
    pub base_url: String,

    /// API key sent with every request.
    pub api_key: Option<String>,

    /// Deadline for a single request, in seconds.
    pub timeout_secs: u64,

    /// Extra attempts after the first failure.
    pub max_retries: u32,

    /// Pause between attempts, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://maps.googleapis.com/maps/api/directions/json".to_string(),
            api_key: None,
            timeout_secs: 10,
            max_retries: 2,
            retry_delay_ms: 500,
        }
    }
}

impl RoutingConfig {
    /// API key from the environment, falling back to the config file.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(ROUTING_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("rides.db"),
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory for aggregate CSVs and the coordinates file.
    pub output_dir: PathBuf,

    /// File name of the coordinates JSON.
    pub coordinates_file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            coordinates_file: "coordinates.json".to_string(),
        }
    }
}

impl RidelogConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Full path of the coordinates export.
    pub fn coordinates_path(&self) -> PathBuf {
        self.export.output_dir.join(&self.export.coordinates_file)
    }
}
