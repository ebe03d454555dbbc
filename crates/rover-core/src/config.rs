//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `fleet-config.yaml` at the working
//! directory. Every field has a default, so an empty or missing file yields
//! a runnable configuration.

use std::path::Path;
use std::time::Duration;

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

    /// A value parsed but is not usable.
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

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FleetConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Shape of each new session's fleet.
    #[serde(default)]
    pub fleet: FleetSection,

    /// Telemetry and motion tick periods.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Broadcaster buffer sizes.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FleetConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The `PORT` environment variable overrides `server.port`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse(&contents)?.with_env_overrides())
    }

    /// Parse configuration from a YAML string.
    ///
    /// The result depends only on `yaml`; environment overrides are applied
    /// by [`from_file`](Self::from_file) and
    /// [`with_env_overrides`](Self::with_env_overrides).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply process environment overrides (`PORT`).
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        self.server.apply_env_overrides();
        self
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        if self.fleet.rovers_per_session == 0 {
            return invalid("fleet.rovers_per_session must be at least 1");
        }
        if self.fleet.battery_min > self.fleet.battery_max {
            return invalid("fleet.battery_min must not exceed fleet.battery_max");
        }
        if self.fleet.battery_max > 100 {
            return invalid("fleet.battery_max is a percentage (0-100)");
        }
        if self.timing.telemetry_interval_ms == 0 || self.timing.motion_interval_ms == 0 {
            return invalid("timing intervals must be at least 1 ms");
        }
        if self.broadcast.history_capacity == 0 || self.broadcast.subscriber_buffer == 0 {
            return invalid("broadcast buffer sizes must be at least 1");
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSection {
    /// Override the port with the `PORT` environment variable when set to
    /// a valid port number.
    pub fn apply_env_overrides(&mut self) {
        self.override_port(std::env::var("PORT").ok().as_deref());
    }

    /// Replace the port with `value` if it parses as a port number.
    pub fn override_port(&mut self, value: Option<&str>) {
        if let Some(port) = value.and_then(|v| v.trim().parse().ok()) {
            self.port = port;
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Shape of each new session's fleet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FleetSection {
    /// Number of rovers created per session (`Rover-1` .. `Rover-N`).
    #[serde(default = "default_rovers_per_session")]
    pub rovers_per_session: u32,

    /// Lowest initial battery percentage.
    #[serde(default = "default_battery_min")]
    pub battery_min: u8,

    /// Highest initial battery percentage.
    #[serde(default = "default_battery_max")]
    pub battery_max: u8,
}

impl Default for FleetSection {
    fn default() -> Self {
        Self {
            rovers_per_session: default_rovers_per_session(),
            battery_min: default_battery_min(),
            battery_max: default_battery_max(),
        }
    }
}

/// Tick periods for the telemetry generator and the motion loops.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Milliseconds between telemetry ticks.
    #[serde(default = "default_interval_ms")]
    pub telemetry_interval_ms: u64,

    /// Milliseconds between motion steps of a moving rover.
    #[serde(default = "default_interval_ms")]
    pub motion_interval_ms: u64,
}

impl TimingConfig {
    /// Telemetry tick period.
    pub const fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry_interval_ms)
    }

    /// Motion step period.
    pub const fn motion_interval(&self) -> Duration {
        Duration::from_millis(self.motion_interval_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            telemetry_interval_ms: default_interval_ms(),
            motion_interval_ms: default_interval_ms(),
        }
    }
}

/// Broadcaster buffer sizes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastConfig {
    /// Readings retained per session for replay to new subscribers.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Messages queued per subscriber before it is treated as lagging and
    /// evicted.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            subscriber_buffer: default_subscriber_buffer(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

const fn default_rovers_per_session() -> u32 {
    5
}

const fn default_battery_min() -> u8 {
    50
}

const fn default_battery_max() -> u8 {
    100
}

const fn default_interval_ms() -> u64 {
    1_000
}

const fn default_history_capacity() -> usize {
    100
}

const fn default_subscriber_buffer() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_owned()
}
