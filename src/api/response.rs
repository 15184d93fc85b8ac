//! Wire types for the Airly `measurements` endpoints.
//!
//! Only the `current` block is modelled; `history` and `forecast` are ignored, as are
//! presentation fields such as index colours.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `GET /v2/measurements/point` and `GET /v2/measurements/nearest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub current: CurrentMeasurement,
}

/// The most recent averaged measurement window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMeasurement {
    #[serde(default)]
    pub from_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub till_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub values: Vec<MeasurementValue>,
    #[serde(default)]
    pub indexes: Vec<IndexRecord>,
    #[serde(default)]
    pub standards: Vec<StandardRecord>,
}

/// One reported metric, e.g. `{"name": "PM25", "value": 12.3}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementValue {
    pub name: String,
    pub value: f64,
}

/// A composite index. Airly reports `value: null` and `level: "UNKNOWN"` when the
/// point has no coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    pub level: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub advice: Option<String>,
}

/// A regulatory limit for one pollutant and how much of it the current value uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardRecord {
    #[serde(default)]
    pub name: Option<String>,
    pub pollutant: String,
    pub limit: f64,
    pub percent: f64,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CurrentMeasurement {
    /// The index the integration reports; Airly may list several, the first one wins.
    pub fn primary_index(&self) -> Option<&IndexRecord> {
        self.indexes.first()
    }
}
