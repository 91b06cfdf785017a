//! Configuration loading and typed config structures for the Stow simulation.
//!
//! The canonical configuration lives in `stow-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and derives the [`UnloadConfig`] handed to every unload
//! activity from the compatibility toggles.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `stow-config.yaml`. All fields have defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Map size, seed, and run length.
    #[serde(default)]
    pub world: WorldConfig,

    /// Unload pacing.
    #[serde(default)]
    pub unload: UnloadSettings,

    /// Third-party extension toggles.
    #[serde(default)]
    pub compatibility: CompatibilityConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `STOW_LOG_LEVEL` overrides `logging.level` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// The per-activity configuration derived from these settings.
    pub const fn unload_config(&self) -> UnloadConfig {
        UnloadConfig::from_settings(&self.unload, &self.compatibility)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Random seed for the demo scenario.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Map columns.
    #[serde(default = "default_width")]
    pub width: i32,

    /// Map rows.
    #[serde(default = "default_height")]
    pub height: i32,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Maximum ticks before the run stops (0 = until idle).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Agents spawned by the demo scenario.
    #[serde(default = "default_agents")]
    pub agents: u32,

    /// Ground stacks each agent picks up before unloading.
    #[serde(default = "default_items_per_agent")]
    pub items_per_agent: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            width: default_width(),
            height: default_height(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: default_max_ticks(),
            agents: default_agents(),
            items_per_agent: default_items_per_agent(),
        }
    }
}

/// Unload pacing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnloadSettings {
    /// Ticks an agent pauses before each item.
    #[serde(default = "default_base_delay_ticks")]
    pub base_delay_ticks: u32,

    /// Pause used instead when the slow storage extension is active.
    #[serde(default = "default_slow_storage_delay_ticks")]
    pub slow_storage_delay_ticks: u32,

    /// Cells the default walker covers per tick.
    #[serde(default = "default_walker_stride")]
    pub walker_stride: u32,
}

impl Default for UnloadSettings {
    fn default() -> Self {
        Self {
            base_delay_ticks: default_base_delay_ticks(),
            slow_storage_delay_ticks: default_slow_storage_delay_ticks(),
            walker_stride: default_walker_stride(),
        }
    }
}

/// Toggles for third-party extensions that change unload behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct CompatibilityConfig {
    /// A storage extension with slower placement that manages its own
    /// reservations.
    #[serde(default)]
    pub slow_storage_extension: bool,

    /// A combat inventory tracker that must recompute loadouts after
    /// inventory changes.
    #[serde(default)]
    pub combat_inventory_tracker: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    /// Override the level with `STOW_LOG_LEVEL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("STOW_LOG_LEVEL") {
            self.level = val;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Configuration handed to each unload activity at construction.
///
/// Decouples the state machine from the presence of any particular
/// extension: the activity only sees the resulting behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnloadConfig {
    /// Ticks spent in the Waiting state before each selection.
    pub unload_delay_ticks: u32,
    /// Leave the destination claim alone after placing.
    pub skip_release_on_place: bool,
    /// Call the inventory recompute hook after each transfer or drop.
    pub recompute_inventory_after_transfer: bool,
}

impl UnloadConfig {
    /// Derive the activity config from settings and compatibility toggles.
    pub const fn from_settings(
        settings: &UnloadSettings,
        compatibility: &CompatibilityConfig,
    ) -> Self {
        Self {
            unload_delay_ticks: if compatibility.slow_storage_extension {
                settings.slow_storage_delay_ticks
            } else {
                settings.base_delay_ticks
            },
            skip_release_on_place: compatibility.slow_storage_extension,
            recompute_inventory_after_transfer: compatibility.combat_inventory_tracker,
        }
    }
}

impl Default for UnloadConfig {
    fn default() -> Self {
        Self::from_settings(&UnloadSettings::default(), &CompatibilityConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_width() -> i32 {
    24
}

const fn default_height() -> i32 {
    16
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_max_ticks() -> u64 {
    5_000
}

const fn default_agents() -> u32 {
    3
}

const fn default_items_per_agent() -> u32 {
    6
}

const fn default_base_delay_ticks() -> u32 {
    3
}

const fn default_slow_storage_delay_ticks() -> u32 {
    20
}

const fn default_walker_stride() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_owned()
}
