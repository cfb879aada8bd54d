//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `entio-config.yaml` next to the
//! engine binary. This module defines strongly-typed structs that mirror
//! the YAML structure, and provides a loader that reads the file. Every
//! field has a default, so an empty file is a valid configuration.

use std::path::Path;

use serde::Deserialize;

/// Environment variable that overrides `world.level_path`.
pub const LEVEL_PATH_ENV: &str = "ENTIO_LEVEL";

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

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// World-level settings (name, level, tick timing).
    #[serde(default)]
    pub world: WorldConfig,

    /// Output/input dispatch settings.
    #[serde(default)]
    pub io: IoConfig,

    /// Run boundaries.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `ENTIO_LEVEL` overrides `world.level_path` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.world.apply_env_overrides();
        Ok(config)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable run name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Path of the YAML level to load.
    #[serde(default = "default_level_path")]
    pub level_path: String,

    /// Game time advanced per tick, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Whether the driver sleeps the tick interval between ticks.
    #[serde(default = "default_true")]
    pub real_time: bool,
}

impl WorldConfig {
    /// Override the level path with `ENTIO_LEVEL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(LEVEL_PATH_ENV) {
            self.level_path = val;
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            level_path: default_level_path(),
            tick_interval_ms: default_tick_interval_ms(),
            real_time: true,
        }
    }
}

/// Output/input dispatch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IoConfig {
    /// Maximum nesting of synchronous input dispatch. Inputs fired deeper
    /// than this are dropped with a warning.
    #[serde(default = "default_max_dispatch_depth")]
    pub max_dispatch_depth: u32,

    /// Log a warning when an output's target pattern matches nothing.
    #[serde(default = "default_true")]
    pub warn_unresolved_targets: bool,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            max_dispatch_depth: default_max_dispatch_depth(),
            warn_unresolved_targets: true,
        }
    }
}

/// Run boundary configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Stop after this many ticks. 0 means no tick bound.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Stop as soon as no delivery is pending after a tick.
    #[serde(default)]
    pub stop_when_idle: bool,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            stop_when_idle: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_world_name() -> String {
    "entio".to_owned()
}

fn default_level_path() -> String {
    "levels/demo.yaml".to_owned()
}

const fn default_tick_interval_ms() -> u64 {
    100
}

const fn default_max_dispatch_depth() -> u32 {
    64
}

const fn default_max_ticks() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.world.tick_interval_ms, 100);
        assert_eq!(config.io.max_dispatch_depth, 64);
        assert!(config.io.warn_unresolved_targets);
        assert_eq!(config.simulation.max_ticks, 600);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  name: "Test Run"
  level_path: "levels/test.yaml"
  tick_interval_ms: 50
  real_time: false

io:
  max_dispatch_depth: 8
  warn_unresolved_targets: false

simulation:
  max_ticks: 20
  stop_when_idle: true

logging:
  level: "debug"
  json: true
"#;

        let config = EngineConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.world.name, "Test Run");
        assert_eq!(config.world.tick_interval_ms, 50);
        assert!(!config.world.real_time);
        assert_eq!(config.io.max_dispatch_depth, 8);
        assert!(!config.io.warn_unresolved_targets);
        assert_eq!(config.simulation.max_ticks, 20);
        assert!(config.simulation.stop_when_idle);
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "io:\n  max_dispatch_depth: 4\n";
        let config = EngineConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.io.max_dispatch_depth, 4);
        // Everything else uses defaults
        assert!(config.io.warn_unresolved_targets);
        assert_eq!(config.world.tick_interval_ms, 100);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(EngineConfig::parse("").is_ok());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = EngineConfig::parse("io: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("entio-config.yaml");
        if path.exists() {
            let config = EngineConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
