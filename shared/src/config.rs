//! Configuration persistence utilities
//!
//! Loads and saves the clock configuration (fallback zone, hand calibration, idle spin and
//! the mesh-name table) as TOML in the platform config directory.

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::binder::MeshNames;
use crate::hands::HandOffsets;
use crate::timezone::DEFAULT_ZONE;

/// Idle spin speed of the Putnik clock, radians per second
pub const DEFAULT_SPIN_SPEED: f64 = 0.025;

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Persisted clock settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Location token used when no query parameter names a zone
    pub zone: String,
    /// Spin the clock while nobody has touched it
    pub auto_spin: bool,
    /// Idle spin speed in radians per second
    pub spin_speed: f64,
    /// Show the loading overlay while the scene builds
    pub show_loading_overlay: bool,
    /// Per-hand calibration in radians
    pub offsets: HandOffsets,
    /// Scene node names for each driven part
    pub mesh_names: MeshNames,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            zone: DEFAULT_ZONE.to_string(),
            auto_spin: true,
            spin_speed: DEFAULT_SPIN_SPEED,
            show_loading_overlay: true,
            offsets: HandOffsets::putnik(),
            mesh_names: MeshNames::default(),
        }
    }
}

/// Get the base configuration directory for all clocks
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "putnik", "clock").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the configuration file path for a specific clock
pub fn config_path(clock_name: &str) -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(format!("{}.toml", clock_name)))
}

/// Load configuration for a specific clock
///
/// Returns `None` if the config file doesn't exist yet.
/// Returns an error if the file exists but can't be parsed.
pub fn load_config<T: DeserializeOwned>(clock_name: &str) -> Result<Option<T>, ConfigError> {
    let path = config_path(clock_name).ok_or(ConfigError::NoConfigDir)?;

    if !path.exists() {
        debug!(path = %path.display(), "no config file yet");
        return Ok(None);
    }

    let contents = fs::read_to_string(&path)?;
    let config: T = toml::from_str(&contents)?;
    info!(path = %path.display(), "config loaded");
    Ok(Some(config))
}

/// Save configuration for a specific clock
pub fn save_config<T: Serialize>(clock_name: &str, config: &T) -> Result<(), ConfigError> {
    let path = config_path(clock_name).ok_or(ConfigError::NoConfigDir)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    fs::write(&path, contents)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

/// Delete configuration for a specific clock
pub fn delete_config(clock_name: &str) -> Result<(), ConfigError> {
    let path = config_path(clock_name).ok_or(ConfigError::NoConfigDir)?;

    if path.exists() {
        fs::remove_file(&path)?;
    }
    Ok(())
}
