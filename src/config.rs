//! Engine configuration.
//!
//! Every field has a default matching the shipped game, so a host can
//! override just the values it cares about from a JSON blob.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bakery::offline::MAX_OFFLINE_SECONDS;

/// Errors raised while loading or validating an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be empty")]
    EmptyKey { field: &'static str },
    #[error("storage_key and version_key must differ (both {0:?})")]
    KeyCollision(String),
}

/// Tunables for the tick loop, autosave timers and persistence slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Wall-clock length of one tick in milliseconds.
    pub tick_interval_ms: f64,
    /// Regular autosave period in seconds.
    pub autosave_interval_secs: f64,
    /// Redundant fallback save period in seconds.
    pub fallback_save_interval_secs: f64,
    /// Offline progress never credits more than this many seconds of income.
    pub max_offline_seconds: f64,
    /// Largest wall-clock gap a single `advance` call will turn into ticks.
    pub max_catch_up_ms: f64,
    /// Key of the single save slot.
    pub storage_key: String,
    /// Key of the parallel version marker.
    pub version_key: String,
    /// Version stamped on every save record.
    pub save_version: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1_000.0,
            autosave_interval_secs: 30.0,
            fallback_save_interval_secs: 10.0,
            max_offline_seconds: MAX_OFFLINE_SECONDS,
            max_catch_up_ms: 5_000.0,
            storage_key: "bakeryGameSave".into(),
            version_key: "bakeryGameVersion".into(),
            save_version: 1,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("tick_interval_ms", self.tick_interval_ms),
            ("autosave_interval_secs", self.autosave_interval_secs),
            ("fallback_save_interval_secs", self.fallback_save_interval_secs),
            ("max_offline_seconds", self.max_offline_seconds),
            ("max_catch_up_ms", self.max_catch_up_ms),
        ];
        for (field, value) in positive {
            // `!(x > 0)` also rejects NaN
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if self.storage_key.is_empty() {
            return Err(ConfigError::EmptyKey {
                field: "storage_key",
            });
        }
        if self.version_key.is_empty() {
            return Err(ConfigError::EmptyKey {
                field: "version_key",
            });
        }
        if self.storage_key == self.version_key {
            return Err(ConfigError::KeyCollision(self.storage_key.clone()));
        }
        Ok(())
    }
}
