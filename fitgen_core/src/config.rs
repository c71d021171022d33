//! Configuration file support for fitgen.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitgen/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub stats: StatsConfig,
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

impl DataConfig {
    pub fn progress_log_path(&self) -> PathBuf {
        self.data_dir.join("wal").join("progress.wal")
    }

    pub fn progress_csv_path(&self) -> PathBuf {
        self.data_dir.join("progress.csv")
    }

    pub fn workouts_path(&self) -> PathBuf {
        self.data_dir.join("workouts.json")
    }

    pub fn profile_path(&self) -> PathBuf {
        self.data_dir.join("profile.json")
    }
}

/// Exercise catalog source
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON catalog file; the built-in catalog is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub fallback_to_builtin: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            fallback_to_builtin: true,
        }
    }
}

/// Session timing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_rest_seconds")]
    pub rest_seconds: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rest_seconds: default_rest_seconds(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_xp_per_workout")]
    pub xp_per_workout: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            xp_per_workout: default_xp_per_workout(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("fitgen")
}

fn default_true() -> bool {
    true
}

fn default_rest_seconds() -> u32 {
    crate::session::REST_SECONDS
}

fn default_xp_per_workout() -> u32 {
    crate::stats::DEFAULT_XP_PER_WORKOUT
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

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("fitgen").join("config.toml")
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
