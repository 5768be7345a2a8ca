//! Configuration file handling for `~/.vfrtraffic/config.ini`.
//!
//! Settings structs live in [`settings`], parsing in `parser` and
//! serialization in `writer`. Missing files and missing keys fall back to
//! defaults; malformed values are errors.
//!
//! # Example
//!
//! ```
//! use vfrtraffic::config::Config;
//!
//! let config = Config::default().with_seed(7).with_time_step(0.25);
//! assert_eq!(config.simulation.seed, 7);
//! ```

mod parser;
mod settings;
mod writer;

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

pub use settings::{
    AirportSettings, Config, LoggingSettings, RunwaySettings, SimulationSettings, TrafficConfig,
    WindSettings, DEFAULT_DURATION_S, DEFAULT_LOG_LEVEL, DEFAULT_STATUS_INTERVAL_S,
    DEFAULT_TIME_STEP_S, LOG_LEVELS,
};

/// Directory name under the home directory.
const CONFIG_DIR: &str = ".vfrtraffic";

/// Configuration file name.
const CONFIG_FILE: &str = "config.ini";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the file
    #[error("Config file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid INI
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] ini::ParseError),

    /// A value could not be interpreted
    #[error("Invalid configuration: {section}.{key} = '{value}'")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    /// No home directory to hold the default config
    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// Get the path to the config file (`~/.vfrtraffic/config.ini`).
pub fn default_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
        .ok_or(ConfigError::NoHomeDir)
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_path()?)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        let ini = Ini::load_from_str(&text)?;
        parser::parse_ini(&ini)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, writer::to_config_string(self))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("missing.ini")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.ini");

        let config = Config::default().with_seed(3).with_duration(600.0);
        config.save_to(&path).unwrap();
        assert!(path.exists());

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.simulation.seed, 3);
        assert_eq!(loaded.simulation.duration_s, 600.0);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[wind]\nspeed_kt = 15\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.wind.speed_kt, 15.0);
        assert_eq!(config.wind.from_deg, 300.0);
        assert_eq!(config.airport, AirportSettings::default());
    }

    #[test]
    fn test_invalid_value_error_message() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[traffic]\nparked = lots\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: traffic.parked = 'lots'"
        );
    }

    #[test]
    fn test_default_path_location() {
        if let Ok(path) = default_path() {
            assert!(path.ends_with(".vfrtraffic/config.ini"));
        }
    }
}
