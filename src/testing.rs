//! Scripted measurement source shared by the unit tests.

use crate::api::client::{MeasurementRequest, MeasurementSource};
use crate::api::error::FetchError;
use crate::api::response::{
    CurrentMeasurement, IndexRecord, MeasurementValue, Measurements, StandardRecord,
};
use crate::types::language::Language;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Replays queued responses in order, then keeps returning `fallback`.
pub(crate) struct ScriptedSource {
    script: Mutex<VecDeque<Result<Measurements, FetchError>>>,
    fallback: Option<Measurements>,
    delay: Duration,
    calls: AtomicUsize,
    requests: Mutex<Vec<MeasurementRequest>>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn repeating(measurements: Measurements) -> Self {
        Self {
            fallback: Some(measurements),
            ..Self::new()
        }
    }

    pub(crate) fn then(self, response: Result<Measurements, FetchError>) -> Self {
        self.script.lock().unwrap().push_back(response);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<MeasurementRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MeasurementSource for ScriptedSource {
    async fn fetch(&self, request: &MeasurementRequest) -> Result<Measurements, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(*request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(response) => response,
            None => self.fallback.clone().ok_or_else(not_found),
        }
    }
}

pub(crate) fn not_found() -> FetchError {
    FetchError::NotFound {
        url: "http://airly.test/v2/measurements/point".to_string(),
        message: "Installation not found".to_string(),
    }
}

/// A complete point response with the given PM2.5 value.
pub(crate) fn measurements(pm25: f64) -> Measurements {
    Measurements {
        current: CurrentMeasurement {
            from_date_time: None,
            till_date_time: None,
            values: vec![
                MeasurementValue {
                    name: "PM25".to_string(),
                    value: pm25,
                },
                MeasurementValue {
                    name: "TEMPERATURE".to_string(),
                    value: 6.5,
                },
            ],
            indexes: vec![IndexRecord {
                name: Some("AIRLY_CAQI".to_string()),
                value: Some(pm25 * 2.0),
                level: "LOW".to_string(),
                description: Some("Air is quite good.".to_string()),
                advice: Some("Take a breath!".to_string()),
            }],
            standards: vec![StandardRecord {
                name: Some("WHO".to_string()),
                pollutant: "PM25".to_string(),
                limit: 15.0,
                percent: pm25 / 15.0 * 100.0,
            }],
        },
    }
}

/// The response Airly gives for a point without sensor coverage.
pub(crate) fn no_coverage(language: Language) -> Measurements {
    Measurements {
        current: CurrentMeasurement {
            indexes: vec![IndexRecord {
                name: Some("AIRLY_CAQI".to_string()),
                value: None,
                level: "UNKNOWN".to_string(),
                description: Some(language.no_sensors_sentinel().to_string()),
                advice: None,
            }],
            ..CurrentMeasurement::default()
        },
    }
}
