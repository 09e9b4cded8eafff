//! Screen configuration supplied by the shell.
//!
//! Shells pass an [`IntakeConfig`] with `Event::ScreenEntered`, usually
//! parsed from a bundled JSON file via [`IntakeConfig::from_json`]. Missing
//! fields take their defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::{DocumentPickConfig, PositionOptions, ANY_MIME_TYPE};

pub const DEFAULT_LOCATION_TIMEOUT_MS: u64 = 30_000;
pub const MIN_LOCATION_TIMEOUT_MS: u64 = 1_000;
pub const MAX_LOCATION_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_MAP_BASE_URL: &str = "https://www.google.com/maps";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Start a location attempt as soon as the screen is entered.
    pub locate_on_enter: bool,
    pub location_timeout_ms: u64,
    pub high_accuracy: bool,
    pub accepted_mime_types: Vec<String>,
    /// Ask native pickers to copy the document into app cache so the URI
    /// stays readable after the picker closes.
    pub copy_to_cache: bool,
    pub map_base_url: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            locate_on_enter: true,
            location_timeout_ms: DEFAULT_LOCATION_TIMEOUT_MS,
            high_accuracy: true,
            accepted_mime_types: vec![ANY_MIME_TYPE.to_string()],
            copy_to_cache: true,
            map_base_url: DEFAULT_MAP_BASE_URL.to_string(),
        }
    }
}

impl IntakeConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_LOCATION_TIMEOUT_MS..=MAX_LOCATION_TIMEOUT_MS).contains(&self.location_timeout_ms)
        {
            return Err(ConfigError::Validation(format!(
                "location_timeout_ms must be within {MIN_LOCATION_TIMEOUT_MS}..={MAX_LOCATION_TIMEOUT_MS}, got {}",
                self.location_timeout_ms
            )));
        }
        if self.accepted_mime_types.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "accepted_mime_types must contain at least one type".into(),
            ));
        }
        let map_url = url::Url::parse(&self.map_base_url)
            .map_err(|e| ConfigError::Validation(format!("map_base_url: {e}")))?;
        if !matches!(map_url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "map_base_url must be http(s), got {}",
                map_url.scheme()
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            timeout_ms: self.location_timeout_ms,
            high_accuracy: self.high_accuracy,
        }
    }

    #[must_use]
    pub fn pick_config(&self) -> DocumentPickConfig {
        DocumentPickConfig::default()
            .with_mime_types(self.accepted_mime_types.iter().cloned())
            .with_copy_to_cache(self.copy_to_cache)
    }
}
