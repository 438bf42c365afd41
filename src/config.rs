//! Board service configuration.
//!
//! Configuration is TOML. Every key is optional; omitted keys take the
//! defaults below.
//!
//! ```toml
//! default_daily_task_limit = 5
//! privileged_roles = ["founder", "admin", "super_admin", "human_resource",
//!                     "department_head", "task_manager"]
//! duplicate_name_suffix = " (Copy)"
//!
//! [deadline_sweep]
//! interval_secs = 600
//! ```

use crate::board::domain::{PrivilegedRoles, UserRole};
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_DAILY_TASK_LIMIT: u32 = 5;
const DEFAULT_DUPLICATE_NAME_SUFFIX: &str = " (Copy)";
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;

/// Settings consumed by the board services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    /// Daily task limit applied when the directory has no per-user override.
    pub default_daily_task_limit: u32,
    /// Roles whose holders get a card for every task.
    pub privileged_roles: Vec<UserRole>,
    /// Appended to the name of a duplicated task.
    pub duplicate_name_suffix: String,
    /// Deadline sweep scheduling.
    pub deadline_sweep: DeadlineSweepConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_daily_task_limit: DEFAULT_DAILY_TASK_LIMIT,
            privileged_roles: UserRole::DEFAULT_PRIVILEGED.to_vec(),
            duplicate_name_suffix: DEFAULT_DUPLICATE_NAME_SUFFIX.to_owned(),
            deadline_sweep: DeadlineSweepConfig::default(),
        }
    }
}

/// Deadline sweep scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeadlineSweepConfig {
    /// Seconds between sweeps.
    pub interval_secs: u64,
}

impl Default for DeadlineSweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl DeadlineSweepConfig {
    /// Returns the sweep interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl BoardConfig {
    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Validation`] for out-of-range values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// the errors of [`Self::from_toml`].
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| ConfigError::Validation(format!("{path} does not name a file")))?;
        let parent = path
            .parent()
            .filter(|dir| !dir.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
        Self::from_dir(&dir, file_name)
    }

    /// Reads, parses and validates a TOML file relative to a directory
    /// capability.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// the errors of [`Self::from_toml`].
    pub fn from_dir(dir: &Dir, file_name: &str) -> Result<Self, ConfigError> {
        let content = dir.read_to_string(file_name)?;
        Self::from_toml(&content)
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] when serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_daily_task_limit == 0 {
            return Err(ConfigError::Validation(
                "default_daily_task_limit must be at least 1".to_owned(),
            ));
        }
        if self.deadline_sweep.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "deadline_sweep.interval_secs must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns the privileged roles as a set.
    #[must_use]
    pub fn privileged(&self) -> PrivilegedRoles {
        PrivilegedRoles::new(self.privileged_roles.iter().copied())
    }
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML is malformed or contains unknown keys.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range.
    #[error("configuration validation failed: {0}")]
    Validation(String),
}
