//! The immutable result of one successful refresh, and the string keys consumers
//! use to read values out of it.

use crate::api::error::FetchError;
use crate::api::response::CurrentMeasurement;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const ATTR_PM1: &str = "PM1";
pub const ATTR_PM25: &str = "PM25";
pub const ATTR_PM10: &str = "PM10";
pub const ATTR_PRESSURE: &str = "PRESSURE";
pub const ATTR_HUMIDITY: &str = "HUMIDITY";
pub const ATTR_TEMPERATURE: &str = "TEMPERATURE";
pub const ATTR_CAQI: &str = "CAQI";
pub const ATTR_CAQI_LEVEL: &str = "CAQI_LEVEL";
pub const ATTR_CAQI_DESCRIPTION: &str = "DESCRIPTION";
pub const ATTR_CAQI_ADVICE: &str = "ADVICE";
pub const LIMIT_SUFFIX: &str = "_LIMIT";
pub const PERCENT_SUFFIX: &str = "_PERCENT";

/// Limit set by a standard for one pollutant, and the share of it currently used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollutantStandard {
    pub limit: f64,
    pub percent: f64,
}

/// A single published value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotValue {
    Number(f64),
    Text(String),
}

impl SnapshotValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SnapshotValue::Number(value) => Some(*value),
            SnapshotValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SnapshotValue::Number(_) => None,
            SnapshotValue::Text(text) => Some(text),
        }
    }
}

impl fmt::Display for SnapshotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotValue::Number(value) => write!(f, "{}", value),
            SnapshotValue::Text(text) => f.write_str(text),
        }
    }
}

/// Everything one successful fetch produced.
///
/// Snapshots are built in one step from a vendor response and never modified
/// afterwards. Which metrics are present depends on the installation that answered;
/// a nearest-station response may lack pollutants a point response would report,
/// so every per-metric lookup returns an `Option`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSnapshot {
    pub values: BTreeMap<String, f64>,
    pub standards: BTreeMap<String, PollutantStandard>,
    pub caqi: f64,
    /// Lower-cased level with underscores replaced by spaces, e.g. `"very high"`.
    pub caqi_level: String,
    pub description: String,
    pub advice: String,
    pub from_date_time: Option<DateTime<Utc>>,
    pub till_date_time: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

impl MeasurementSnapshot {
    /// Flattens the `current` block of a response.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::MissingIndex`] if the response has no index record or the
    /// first index carries no value.
    pub fn from_current(
        current: &CurrentMeasurement,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, FetchError> {
        let index = current.primary_index().ok_or(FetchError::MissingIndex)?;
        let caqi = index.value.ok_or(FetchError::MissingIndex)?;

        let values = current
            .values
            .iter()
            .map(|value| (value.name.clone(), value.value))
            .collect();
        let standards = current
            .standards
            .iter()
            .map(|standard| {
                (
                    standard.pollutant.clone(),
                    PollutantStandard {
                        limit: standard.limit,
                        percent: standard.percent,
                    },
                )
            })
            .collect();

        Ok(Self {
            values,
            standards,
            caqi,
            caqi_level: normalize_level(&index.level),
            description: index.description.clone().unwrap_or_default(),
            advice: index.advice.clone().unwrap_or_default(),
            from_date_time: current.from_date_time,
            till_date_time: current.till_date_time,
            fetched_at,
        })
    }

    /// Raw value of a reported metric, e.g. `snapshot.value("PM25")`.
    pub fn value(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).copied()
    }

    pub fn standard(&self, pollutant: &str) -> Option<&PollutantStandard> {
        self.standards.get(pollutant)
    }

    /// Looks up a published key.
    ///
    /// Recognised keys are the metric names reported by Airly, `{POLLUTANT}_LIMIT`,
    /// `{POLLUTANT}_PERCENT`, `CAQI`, `CAQI_LEVEL`, `DESCRIPTION` and `ADVICE`.
    pub fn get(&self, key: &str) -> Option<SnapshotValue> {
        match key {
            ATTR_CAQI => return Some(SnapshotValue::Number(self.caqi)),
            ATTR_CAQI_LEVEL => return Some(SnapshotValue::Text(self.caqi_level.clone())),
            ATTR_CAQI_DESCRIPTION => return Some(SnapshotValue::Text(self.description.clone())),
            ATTR_CAQI_ADVICE => return Some(SnapshotValue::Text(self.advice.clone())),
            _ => {}
        }
        if let Some(value) = self.value(key) {
            return Some(SnapshotValue::Number(value));
        }
        if let Some(pollutant) = key.strip_suffix(LIMIT_SUFFIX) {
            return self
                .standard(pollutant)
                .map(|standard| SnapshotValue::Number(standard.limit));
        }
        if let Some(pollutant) = key.strip_suffix(PERCENT_SUFFIX) {
            return self
                .standard(pollutant)
                .map(|standard| SnapshotValue::Number(standard.percent));
        }
        None
    }

    /// Every published key and its value.
    pub fn to_map(&self) -> BTreeMap<String, SnapshotValue> {
        let mut map: BTreeMap<String, SnapshotValue> = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), SnapshotValue::Number(*value)))
            .collect();
        for (pollutant, standard) in &self.standards {
            map.insert(
                format!("{pollutant}{LIMIT_SUFFIX}"),
                SnapshotValue::Number(standard.limit),
            );
            map.insert(
                format!("{pollutant}{PERCENT_SUFFIX}"),
                SnapshotValue::Number(standard.percent),
            );
        }
        map.insert(ATTR_CAQI.to_string(), SnapshotValue::Number(self.caqi));
        map.insert(
            ATTR_CAQI_LEVEL.to_string(),
            SnapshotValue::Text(self.caqi_level.clone()),
        );
        map.insert(
            ATTR_CAQI_DESCRIPTION.to_string(),
            SnapshotValue::Text(self.description.clone()),
        );
        map.insert(
            ATTR_CAQI_ADVICE.to_string(),
            SnapshotValue::Text(self.advice.clone()),
        );
        map
    }
}

fn normalize_level(level: &str) -> String {
    level.to_lowercase().replace('_', " ")
}
