use crate::types::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
/// Both values are decimal degrees.
///
/// # Examples
///
/// ```
/// use airly::LatLon;
///
/// let krakow = LatLon(50.0614, 19.9366);
/// assert_eq!(krakow.0, 50.0614); // Latitude
/// assert_eq!(krakow.1, 19.9366); // Longitude
/// assert!(krakow.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    /// Checks that both components are finite and inside their valid ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLatitude`] for a latitude outside `[-90, 90]` and
    /// [`ConfigError::InvalidLongitude`] for a longitude outside `[-180, 180]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.0.is_finite() || !(-90.0..=90.0).contains(&self.0) {
            return Err(ConfigError::InvalidLatitude(self.0));
        }
        if !self.1.is_finite() || !(-180.0..=180.0).contains(&self.1) {
            return Err(ConfigError::InvalidLongitude(self.1));
        }
        Ok(())
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.0, self.1)
    }
}
