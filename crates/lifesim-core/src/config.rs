//! Configuration loading and typed config structures for a Lifesim session.
//!
//! The configuration lives in `lifesim-config.yaml` at the project root.
//! Every section and field is optional; anything missing takes the default
//! shown on the corresponding `default_*` function. The notification timing
//! constants are presentation choices, so they are exposed here rather than
//! hard-coded in the pipeline.

use std::path::{Path, PathBuf};

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

    /// An environment override could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    Env {
        /// Name of the offending variable.
        var: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The configuration parsed but is not usable.
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

/// Top-level session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Notification pipeline timing and badge settings.
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Session driver and save location settings.
    #[serde(default)]
    pub session: SessionSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SessionConfig {
    /// Load configuration from a YAML file at the given path, then apply
    /// environment overrides.
    ///
    /// Environment variables override YAML values:
    /// - `LIFESIM_DWELL_MS` overrides `notifications.dwell_ms`
    /// - `LIFESIM_SETTLE_MS` overrides `notifications.settle_ms`
    /// - `LIFESIM_SAVE_DIR` overrides `session.save_dir`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Env`] if an override is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields the
    /// defaults (with environment overrides still applied).
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file), except for `NotFound`.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::from_file(path) {
            Err(ConfigError::Io { source }) if source.kind() == std::io::ErrorKind::NotFound => {
                let mut config = Self::default();
                config.apply_env_overrides()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Parse configuration from a YAML string. No environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if a numeric override does not parse.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides using `lookup` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if a numeric override does not parse.
    pub fn apply_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("LIFESIM_DWELL_MS") {
            self.notifications.dwell_ms = parse_ms("LIFESIM_DWELL_MS", &val)?;
        }
        if let Some(val) = lookup("LIFESIM_SETTLE_MS") {
            self.notifications.settle_ms = parse_ms("LIFESIM_SETTLE_MS", &val)?;
        }
        if let Some(val) = lookup("LIFESIM_SAVE_DIR") {
            self.session.save_dir = PathBuf::from(val);
        }
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero dwell time, a zero badge
    /// cap, a zero tick interval, or an empty save key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notifications.dwell_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "notifications.dwell_ms must be at least 1".to_owned(),
            });
        }
        if self.notifications.badge_cap == 0 {
            return Err(ConfigError::Invalid {
                reason: "notifications.badge_cap must be at least 1".to_owned(),
            });
        }
        if self.session.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "session.tick_interval_ms must be at least 1".to_owned(),
            });
        }
        if self.session.save_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "session.save_key must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

fn parse_ms(var: &'static str, val: &str) -> Result<u64, ConfigError> {
    val.trim().parse().map_err(|e| ConfigError::Env {
        var,
        reason: format!("{e}"),
    })
}

/// Timing and badge settings for the notification pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NotificationConfig {
    /// Minimum time units an event stays in the display slot.
    #[serde(default = "default_dwell_ms")]
    pub dwell_ms: u64,

    /// Length of the departure animation before the slot is free.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Largest unread count shown literally; above it the badge reads `"{cap}+"`.
    #[serde(default = "default_badge_cap")]
    pub badge_cap: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dwell_ms: default_dwell_ms(),
            settle_ms: default_settle_ms(),
            badge_cap: default_badge_cap(),
        }
    }
}

/// Session driver settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionSettings {
    /// Real-time milliseconds between timer polls.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Directory holding save blobs.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Fixed key the event log is saved under.
    #[serde(default = "default_save_key")]
    pub save_key: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            save_dir: default_save_dir(),
            save_key: default_save_key(),
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

const fn default_dwell_ms() -> u64 {
    2000
}

const fn default_settle_ms() -> u64 {
    500
}

const fn default_badge_cap() -> u64 {
    99
}

const fn default_tick_interval_ms() -> u64 {
    50
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("saves")
}

fn default_save_key() -> String {
    "lifesim-save".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}
