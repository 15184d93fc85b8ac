//! Configuration for one monitored location, plus the options a user may change
//! after the location has been set up.

use crate::types::language::Language;
use crate::types::lat_lon::LatLon;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default refresh interval in seconds.
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 900;
/// Refresh interval older configurations were created with.
pub const LEGACY_SCAN_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_NAME: &str = "Airly";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("API key must not be empty")]
    MissingApiKey,

    #[error("Latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),

    #[error("Longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),

    #[error("Refresh interval must be a positive duration")]
    InvalidInterval,

    #[error("Unsupported language '{0}', expected one of: en, pl")]
    UnsupportedLanguage(String),
}

/// Everything needed to poll one location.
///
/// Deserializes from the stored entry data; omitted optional fields take their defaults.
///
/// # Examples
///
/// ```
/// use airly::{Language, LocationConfig};
///
/// let config: LocationConfig = serde_json::from_str(
///     r#"{ "api_key": "secret", "latitude": 50.06, "longitude": 19.94 }"#,
/// ).unwrap();
///
/// assert_eq!(config.language, Language::En);
/// assert_eq!(config.scan_interval, 900);
/// assert!(!config.use_nearest);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub api_key: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub language: Language,
    /// Refresh interval in seconds.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
    /// Query the nearest station instead of the exact point.
    #[serde(default)]
    pub use_nearest: bool,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL_SECS
}

/// Settings that can be edited on an already configured entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryOptions {
    /// Refresh interval in seconds. `None` keeps the current one.
    #[serde(default)]
    pub scan_interval: Option<u64>,
}

impl fmt::Debug for LocationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationConfig")
            .field("api_key", &"<redacted>")
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("name", &self.name)
            .field("language", &self.language)
            .field("scan_interval", &self.scan_interval)
            .field("use_nearest", &self.use_nearest)
            .finish()
    }
}

impl LocationConfig {
    pub fn new(api_key: impl Into<String>, location: LatLon) -> Self {
        Self {
            api_key: api_key.into(),
            latitude: location.0,
            longitude: location.1,
            name: default_name(),
            language: Language::default(),
            scan_interval: DEFAULT_SCAN_INTERVAL_SECS,
            use_nearest: false,
        }
    }

    pub fn location(&self) -> LatLon {
        LatLon(self.latitude, self.longitude)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    /// Identifies the location; two entries for the same point are not allowed.
    pub fn unique_id(&self) -> String {
        format!("{}-{}", self.latitude, self.longitude)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        self.location().validate()?;
        if self.scan_interval == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(())
    }

    /// Returns a copy of this configuration with `options` applied.
    pub fn with_options(&self, options: &EntryOptions) -> Self {
        let mut updated = self.clone();
        if let Some(scan_interval) = options.scan_interval {
            updated.scan_interval = scan_interval;
        }
        updated
    }
}
