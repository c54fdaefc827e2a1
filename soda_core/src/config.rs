//! Configuration file support for sodalog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/sodalog/config.toml`.

use crate::{Error, GoalConfig, Result};
use chrono::FixedOffset;
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
    pub goals: GoalDefaults,

    #[serde(default)]
    pub display: DisplayConfig,
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

/// Where drink definitions come from
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// TOML catalog to use instead of the built-in one
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Goals used until the user sets their own
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoalDefaults {
    #[serde(default = "default_daily_limit_oz")]
    pub daily_limit_oz: f64,

    #[serde(default = "default_weekly_limit_oz")]
    pub weekly_limit_oz: f64,

    #[serde(default = "default_target_reduction_percent")]
    pub target_reduction_percent: f64,
}

impl Default for GoalDefaults {
    fn default() -> Self {
        Self {
            daily_limit_oz: default_daily_limit_oz(),
            weekly_limit_oz: default_weekly_limit_oz(),
            target_reduction_percent: default_target_reduction_percent(),
        }
    }
}

impl From<&GoalDefaults> for GoalConfig {
    fn from(defaults: &GoalDefaults) -> Self {
        GoalConfig {
            daily_limit_oz: defaults.daily_limit_oz,
            weekly_limit_oz: defaults.weekly_limit_oz,
            target_reduction_percent: defaults.target_reduction_percent,
        }
    }
}

/// How days are cut
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    /// Fixed UTC offset for day boundaries; the system zone when unset
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl DisplayConfig {
    /// The configured fixed offset, if any
    pub fn fixed_offset(&self) -> Result<Option<FixedOffset>> {
        self.utc_offset_minutes
            .map(|minutes| {
                minutes
                    .checked_mul(60)
                    .and_then(FixedOffset::east_opt)
                    .ok_or_else(|| {
                        Error::Config(format!("utc_offset_minutes out of range: {}", minutes))
                    })
            })
            .transpose()
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("sodalog")
}

fn default_daily_limit_oz() -> f64 {
    GoalConfig::default().daily_limit_oz
}

fn default_weekly_limit_oz() -> f64 {
    GoalConfig::default().weekly_limit_oz
}

fn default_target_reduction_percent() -> f64 {
    GoalConfig::default().target_reduction_percent
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        GoalConfig::from(&config.goals)
            .validate()
            .map_err(|e| Error::Config(format!("[goals] in {:?}: {}", path, e)))?;
        config.display.fixed_offset()?;

        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("sodalog").join("config.toml")
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
