use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use crate::capabilities::{ValidatedUrl, WatchOptions};
use crate::geo::SpeedProfile;
use crate::{
    AppError, ErrorKind, DEFAULT_AVERAGE_SPEED_KMH, DEFAULT_DIRECTIONS_URL, TRAVEL_HOURS_PER_DAY,
};

pub const API_KEY_ENV_VAR: &str = "ORS_API_KEY";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

/// Settings the shell hands to the core at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub directions_url: String,
    pub directions_api_key: Option<SecretString>,
    pub average_speed_kmh: f64,
    pub hours_per_day: f64,
    pub min_estimated_days: u32,
    pub watch: WatchOptions,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            directions_url: DEFAULT_DIRECTIONS_URL.to_string(),
            directions_api_key: None,
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
            hours_per_day: TRAVEL_HOURS_PER_DAY,
            min_estimated_days: 1,
            watch: WatchOptions::default(),
        }
    }
}

impl CoreConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Fills a missing API key from the `ORS_API_KEY` environment variable.
    #[must_use]
    pub fn with_env_api_key(self) -> Self {
        self.with_fallback_api_key(std::env::var(API_KEY_ENV_VAR).ok())
    }

    /// A key already present always wins over `fallback`.
    #[must_use]
    pub fn with_fallback_api_key(mut self, fallback: Option<String>) -> Self {
        if self.directions_api_key.is_none() {
            self.directions_api_key = fallback
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::new);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ValidatedUrl::new(self.directions_url.as_str())
            .map_err(|e| ConfigError::Validation(format!("directions_url: {e}")))?;

        if !self.average_speed_kmh.is_finite() || self.average_speed_kmh <= 0.0 {
            return Err(ConfigError::Validation(
                "average_speed_kmh must be > 0".into(),
            ));
        }
        if !self.hours_per_day.is_finite()
            || self.hours_per_day <= 0.0
            || self.hours_per_day > 24.0
        {
            return Err(ConfigError::Validation(
                "hours_per_day must be in (0, 24]".into(),
            ));
        }
        if self.watch.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.interval_ms must be > 0".into(),
            ));
        }
        if !self.watch.distance_m.is_finite() || self.watch.distance_m < 0.0 {
            return Err(ConfigError::Validation(
                "watch.distance_m must be >= 0".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn speed_profile(&self) -> SpeedProfile {
        SpeedProfile {
            average_speed_kmh: self.average_speed_kmh,
            hours_per_day: self.hours_per_day,
            min_days: self.min_estimated_days,
        }
    }
}
