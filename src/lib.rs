mod airly;
mod api;
mod coordinator;
mod error;
mod types;

#[cfg(test)]
mod testing;

pub use airly::{Airly, LocationCheck, VALIDATION_TIMEOUT};
pub use error::{AirlyError, NotReadyReason};

pub use api::client::{
    AirlyClient, MeasurementRequest, MeasurementSource, Target, DEFAULT_BASE_URL,
    DEFAULT_NEAREST_DISTANCE_KM,
};
pub use api::error::FetchError;
pub use api::response::{
    ApiErrorBody, CurrentMeasurement, IndexRecord, MeasurementValue, Measurements,
    StandardRecord,
};

pub use coordinator::listeners::{Listener, ListenerId};
pub use coordinator::outcome::RefreshOutcome;
pub use coordinator::refresh_coordinator::{Coordinator, DEFAULT_FETCH_TIMEOUT};
pub use coordinator::scheduler::Scheduler;

pub use types::config::{
    ConfigError, EntryOptions, LocationConfig, DEFAULT_NAME, DEFAULT_SCAN_INTERVAL_SECS,
    LEGACY_SCAN_INTERVAL_SECS,
};
pub use types::language::Language;
pub use types::lat_lon::LatLon;
pub use types::snapshot::*;
