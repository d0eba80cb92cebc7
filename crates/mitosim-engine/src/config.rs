//! Configuration loading and typed config structures for the engine.
//!
//! The canonical configuration lives in `mitosim-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure and provides a loader that reads the file, with an environment
//! override for the checkpoint path so deployments can relocate state
//! without editing the file.

use std::path::Path;

use serde::Deserialize;

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

    /// A field value is outside its valid range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed).
    #[serde(default)]
    pub world: WorldConfig,

    /// Population parameters.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Run parameters (step size, tick count, checkpoint cadence).
    #[serde(default)]
    pub run: RunConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `MITOSIM_CHECKPOINT_PATH` overrides `run.checkpoint_path` if set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.run.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.run.dt_hours <= 0.0 {
            return Err(ConfigError::Invalid {
                reason: "run.dt_hours must be positive".to_owned(),
            });
        }
        if self.population.initial_cells == 0 {
            return Err(ConfigError::Invalid {
                reason: "population.initial_cells must be at least 1".to_owned(),
            });
        }
        if self.population.max_cells < self.population.initial_cells {
            return Err(ConfigError::Invalid {
                reason: "population.max_cells must be >= population.initial_cells".to_owned(),
            });
        }
        Ok(())
    }
}

/// World-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable run name used in logs.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Seed for the shared draw stream.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
        }
    }
}

/// Population parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PopulationConfig {
    /// Number of cells seeded at simulation start.
    #[serde(default = "default_initial_cells")]
    pub initial_cells: usize,

    /// Hard population cap; divisions beyond it are dropped.
    #[serde(default = "default_max_cells")]
    pub max_cells: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_cells: default_initial_cells(),
            max_cells: default_max_cells(),
        }
    }
}

/// Run parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunConfig {
    /// Simulation hours advanced per tick.
    #[serde(default = "default_dt_hours")]
    pub dt_hours: f64,

    /// Number of ticks to run.
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Ticks between checkpoint writes; 0 disables periodic checkpoints.
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: u64,

    /// Path the checkpoint file is written to.
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: String,
}

impl RunConfig {
    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("MITOSIM_CHECKPOINT_PATH") {
            if !path.is_empty() {
                self.checkpoint_path = path;
            }
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dt_hours: default_dt_hours(),
            ticks: default_ticks(),
            checkpoint_interval: default_checkpoint_interval(),
            checkpoint_path: default_checkpoint_path(),
        }
    }
}

fn default_world_name() -> String {
    "mitosim".to_owned()
}

const fn default_seed() -> u64 {
    1
}

const fn default_initial_cells() -> usize {
    16
}

const fn default_max_cells() -> usize {
    4096
}

const fn default_dt_hours() -> f64 {
    1.0
}

const fn default_ticks() -> u64 {
    240
}

const fn default_checkpoint_interval() -> u64 {
    24
}

fn default_checkpoint_path() -> String {
    "mitosim-checkpoint.bin".to_owned()
}
