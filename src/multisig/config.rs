//! Engine configuration

use crate::core::FeeSchedule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Largest keysgroup accepted
pub const DEFAULT_MAX_KEYSGROUP_SIZE: usize = 15;

/// Shortest pending lifetime in hours
pub const DEFAULT_MIN_LIFETIME_HOURS: u8 = 1;

/// Longest pending lifetime in hours
pub const DEFAULT_MAX_LIFETIME_HOURS: u8 = 72;

/// Seconds between expiry sweeps
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Multisignature engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fees: FeeSchedule,
    pub max_keysgroup_size: usize,
    pub min_lifetime_hours: u8,
    pub max_lifetime_hours: u8,
    pub sweep_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            max_keysgroup_size: DEFAULT_MAX_KEYSGROUP_SIZE,
            min_lifetime_hours: DEFAULT_MIN_LIFETIME_HOURS,
            max_lifetime_hours: DEFAULT_MAX_LIFETIME_HOURS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_keysgroup_size == 0 {
            return Err(ConfigError::Invalid(
                "max_keysgroup_size must be at least 1".to_string(),
            ));
        }
        if self.min_lifetime_hours == 0 || self.min_lifetime_hours > self.max_lifetime_hours {
            return Err(ConfigError::Invalid(format!(
                "lifetime range {}..={} is empty",
                self.min_lifetime_hours, self.max_lifetime_hours
            )));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sweep_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
