//! Configuration file support for GetUp.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/getup/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest rest the controller accepts between sets
pub const MAX_REST_SECONDS: u32 = 600;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub workout: WorkoutConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Workout defaults and pipeline timing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutConfig {
    #[serde(default = "default_sets")]
    pub default_sets: u32,

    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: u32,

    #[serde(default = "default_countdown_seconds")]
    pub countdown_seconds: u32,

    /// Period of the countdown/rest tick
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    /// Frames buffered ahead of the pipeline worker before new ones are dropped
    #[serde(default = "default_frame_queue_capacity")]
    pub frame_queue_capacity: usize,
}

impl Default for WorkoutConfig {
    fn default() -> Self {
        Self {
            default_sets: default_sets(),
            default_rest_seconds: default_rest_seconds(),
            countdown_seconds: default_countdown_seconds(),
            tick_millis: default_tick_millis(),
            frame_queue_capacity: default_frame_queue_capacity(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("getup")
}

fn default_sets() -> u32 {
    3
}

fn default_rest_seconds() -> u32 {
    60
}

fn default_countdown_seconds() -> u32 {
    3
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_frame_queue_capacity() -> usize {
    64
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("getup").join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        let workout = &self.workout;
        if workout.default_sets == 0 {
            return Err(Error::Config("default_sets must be at least 1".into()));
        }
        if workout.default_rest_seconds > MAX_REST_SECONDS {
            return Err(Error::Config(format!(
                "default_rest_seconds must be at most {}, got {}",
                MAX_REST_SECONDS, workout.default_rest_seconds
            )));
        }
        if workout.countdown_seconds == 0 {
            return Err(Error::Config("countdown_seconds must be at least 1".into()));
        }
        if workout.tick_millis == 0 {
            return Err(Error::Config("tick_millis must be positive".into()));
        }
        if workout.frame_queue_capacity == 0 {
            return Err(Error::Config("frame_queue_capacity must be positive".into()));
        }
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
