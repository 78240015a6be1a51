//! File-based application configuration.
//!
//! # Responsibility
//! - Parse `taskbell.toml` into typed sections with per-field defaults.
//! - Apply environment overrides for deployment secrets and paths.
//!
//! # Invariants
//! - A missing config file is not an error; defaults apply.
//! - Every section is optional and every field inside it defaults.

use crate::clock::SystemClock;
use crate::logging::default_log_level;
use crate::reminder::{EngineSettings, DEFAULT_MAX_LEAD_TIME_HOURS};
use chrono::{FixedOffset, TimeDelta};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "TASKBELL_DB_PATH";
pub const ENV_TRIGGER_TOKEN_SHA256: &str = "TASKBELL_TRIGGER_TOKEN_SHA256";

const DEFAULT_DATABASE_PATH: &str = "taskbell.db";
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub clock: ClockConfig,
    pub trigger: TriggerConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rotating log files; stderr when unset.
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Process-wide UTC offset in minutes; host offset when unset.
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Hex SHA-256 of the shared trigger secret.
    pub token_sha256: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_lead_time_hours: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_lead_time_hours: DEFAULT_MAX_LEAD_TIME_HOURS,
        }
    }
}

impl AppConfig {
    /// Parses one TOML file.
    ///
    /// # Errors
    /// - `ConfigError::Io` when the file cannot be read.
    /// - `ConfigError::Parse` on malformed TOML or mistyped fields.
    /// - `ConfigError::Invalid` when values are out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists (defaults otherwise), then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies `TASKBELL_*` overrides read through `lookup`. Blank values
    /// are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value_of = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(path) = value_of(ENV_DB_PATH) {
            self.storage.database_path = PathBuf::from(path);
        }
        if let Some(digest) = value_of(ENV_TRIGGER_TOKEN_SHA256) {
            self.trigger.token_sha256 = Some(digest.trim().to_string());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_lead_time_hours <= 0 {
            return Err(ConfigError::Invalid(format!(
                "engine.max_lead_time_hours must be positive, got {}",
                self.engine.max_lead_time_hours
            )));
        }
        if TimeDelta::try_hours(self.engine.max_lead_time_hours).is_none() {
            return Err(ConfigError::Invalid(format!(
                "engine.max_lead_time_hours is out of range, got {}",
                self.engine.max_lead_time_hours
            )));
        }
        if let Some(minutes) = self.clock.utc_offset_minutes {
            if minutes.abs() > MAX_OFFSET_MINUTES {
                return Err(ConfigError::Invalid(format!(
                    "clock.utc_offset_minutes must be within ±{MAX_OFFSET_MINUTES}, got {minutes}"
                )));
            }
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            max_lead_time: TimeDelta::try_hours(self.engine.max_lead_time_hours)
                .unwrap_or_else(|| EngineSettings::default().max_lead_time),
        }
    }

    /// Wall clock in the configured offset, or the host's local offset.
    pub fn clock(&self) -> Result<SystemClock, ConfigError> {
        let Some(minutes) = self.clock.utc_offset_minutes else {
            return Ok(SystemClock::with_host_offset());
        };
        FixedOffset::east_opt(minutes * 60)
            .map(SystemClock::new)
            .ok_or_else(|| {
                ConfigError::Invalid(format!("utc offset out of range: {minutes} minutes"))
            })
    }
}
