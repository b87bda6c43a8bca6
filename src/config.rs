/// Game configuration.
///
/// Every section is `#[serde(default)]`, so a config file only has to name
/// the values it changes.  Lookup order: built-in defaults, then
/// `<config dir>/keyblaster/config.toml`, then an explicit `--config` file;
/// command-line flags are applied on top by the binary.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

const APP_DIR: &str = "keyblaster";

/// Highest level a game may start on.
pub const MAX_START_LEVEL: u32 = 99;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timing: TimingConfig,
    pub scoring: ScoringConfig,
    pub spawning: SpawningConfig,
    pub world: WorldConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub fps: u32,
    /// Tick-rate multiplier while turbo or fast-forward is active.
    pub turbo_multiplier: u32,
    /// Frames of turbo after a dead key.
    pub turbo_frames: u32,
    pub aim_frames: u32,
    pub laser_frames: u32,
    /// Pause between levels.
    pub level_pause_ms: u64,
    /// Frames between state snapshots sent to the observer.
    pub snapshot_interval: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            turbo_multiplier: 10,
            turbo_frames: 150,
            aim_frames: 15,
            laser_frames: 10,
            level_pause_ms: 3000,
            snapshot_interval: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub powerup_multiplier: f32,
    /// Frames the power-up multiplier lasts.
    pub multiplier_frames: u32,
    pub missile_points: u32,
    pub powerup_points: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            powerup_multiplier: 2.0,
            multiplier_frames: 300,
            missile_points: 10,
            powerup_points: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawningConfig {
    pub powerup_interval_min: u32,
    pub powerup_interval_max: u32,
    pub max_powerups: usize,
    /// Random draws before the label allocator accepts a prefix conflict.
    pub label_attempts: usize,
    pub start_level: u32,
}

impl SpawningConfig {
    /// `start_level` clamped to `1..=MAX_START_LEVEL`.
    pub fn first_level(&self) -> u32 {
        self.start_level.clamp(1, MAX_START_LEVEL)
    }
}

impl Default for SpawningConfig {
    fn default() -> Self {
        Self {
            powerup_interval_min: 450,
            powerup_interval_max: 900,
            max_powerups: 1,
            label_attempts: 50,
            start_level: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Height of the ground strip at the bottom.
    pub ground_level: f32,
    /// Altitude missiles enter at.
    pub sky_level: f32,
    pub cities: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            ground_level: 60.0,
            sky_level: 40.0,
            cities: 6,
        }
    }
}

impl WorldConfig {
    pub fn ground_y(&self) -> f32 {
        self.height - self.ground_level
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub scores_path: Option<PathBuf>,
    pub replay_dir: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub record_replays: bool,
    pub sound: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scores_path: None,
            replay_dir: None,
            log_path: None,
            record_replays: true,
            sound: true,
        }
    }
}

impl StorageConfig {
    pub fn scores_path(&self) -> PathBuf {
        self.scores_path
            .clone()
            .unwrap_or_else(|| data_dir().join("scores.json"))
    }

    pub fn replay_dir(&self) -> PathBuf {
        self.replay_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("replays"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| data_dir().join("keyblaster.log"))
    }
}

/// Per-user data directory, falling back to the working directory.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

impl Config {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load an explicitly named file (errors are fatal), or the default file
    /// (missing means defaults, broken is logged and ignored).
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let Some(path) = default_config_path().filter(|p| p.exists()) else {
            debug!("no config file, using defaults");
            return Ok(Self::default());
        };
        match Self::from_file(&path) {
            Ok(config) => Ok(config),
            Err(err) => {
                warn!(%err, "ignoring config file");
                Ok(Self::default())
            }
        }
    }
}
