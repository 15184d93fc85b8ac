//! This module provides the main entry point of the crate. [`Airly`] owns the shared
//! HTTP transport and every configured location, and handles their lifecycle:
//! validating a location before it is added, setting it up, changing its options,
//! and unloading it.

use crate::api::client::{AirlyClient, MeasurementRequest, MeasurementSource, DEFAULT_BASE_URL};
use crate::api::error::FetchError;
use crate::coordinator::refresh_coordinator::Coordinator;
use crate::coordinator::scheduler::Scheduler;
use crate::error::AirlyError;
use crate::types::config::{EntryOptions, LocationConfig};
use crate::types::language::Language;
use crate::types::lat_lon::LatLon;
use bon::bon;
use futures_util::future::join_all;
use log::{debug, info, warn};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Time box for the probes made while validating a new location.
pub const VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of [`Airly::validate_location`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationCheck {
    /// `true` when the exact point has no sensor coverage and the nearest station
    /// should be used instead.
    pub use_nearest: bool,
}

struct Entry {
    config: LocationConfig,
    source: Arc<dyn MeasurementSource>,
    coordinator: Arc<Coordinator>,
    scheduler: Scheduler,
}

impl Entry {
    async fn unload(self) {
        self.coordinator.close();
        self.scheduler.stop().await;
    }
}

/// The main entry point for monitoring Airly locations.
///
/// Each configured location is an *entry*, identified by a caller-chosen id. Setting up
/// an entry performs an initial fetch, then refreshes it periodically until it is
/// unloaded. All entries share one HTTP client.
///
/// # Examples
///
/// ```no_run
/// # use airly::{Airly, AirlyError, LatLon, LocationConfig};
/// # #[tokio::main]
/// # async fn main() -> Result<(), AirlyError> {
/// let airly = Airly::new()?;
/// let location = LatLon(50.0614, 19.9366);
///
/// let check = airly
///     .validate_location()
///     .api_key("my-api-key")
///     .location(location)
///     .call()
///     .await?;
///
/// let mut config = LocationConfig::new("my-api-key", location);
/// config.use_nearest = check.use_nearest;
///
/// let coordinator = airly
///     .setup_entry()
///     .entry_id("home")
///     .config(config)
///     .call()
///     .await?;
///
/// if let Some(snapshot) = coordinator.current_snapshot() {
///     println!("CAQI: {} ({})", snapshot.caqi, snapshot.caqi_level);
/// }
///
/// airly.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct Airly {
    http: Client,
    base_url: String,
    entries: Mutex<HashMap<String, Entry>>,
}

#[bon]
impl Airly {
    /// Creates an instance talking to the public Airly API.
    ///
    /// # Errors
    ///
    /// Returns [`AirlyError::HttpClient`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, AirlyError> {
        let http = Client::builder()
            .user_agent(concat!("airly-rs/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(AirlyError::HttpClient)?;
        Ok(Self::with_client(http, DEFAULT_BASE_URL))
    }

    /// Creates an instance with a caller-provided HTTP client and API base URL.
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Checks a new location before it is configured.
    ///
    /// The exact point is queried first. If Airly reports that no sensor covers it, the
    /// nearest station within 5 km is queried, and the result says the entry should be
    /// configured with `use_nearest`.
    ///
    /// # Arguments
    ///
    /// * `.api_key(impl Into<String>)`: **Required.** The key to validate.
    /// * `.location(LatLon)`: **Required.** The point to check.
    /// * `.source(Arc<dyn MeasurementSource>)`: Optional. Replaces the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`AirlyError::Fetch`] with [`FetchError::Unauthorized`] for a rejected key,
    /// [`FetchError::NotFound`] when no station is near enough, and other
    /// [`FetchError`] variants for transport problems.
    #[builder]
    pub async fn validate_location(
        &self,
        #[builder(into)] api_key: String,
        location: LatLon,
        source: Option<Arc<dyn MeasurementSource>>,
    ) -> Result<LocationCheck, AirlyError> {
        location.validate()?;
        let source = source.unwrap_or_else(|| Arc::new(self.client_for(&api_key)));

        let point = MeasurementRequest::new(location, Language::En, false);
        if probe(source.as_ref(), &point).await? {
            return Ok(LocationCheck { use_nearest: false });
        }

        info!("No Airly sensors at {}, checking the nearest station", location);
        let nearest = MeasurementRequest::new(location, Language::En, true);
        if !probe(source.as_ref(), &nearest).await? {
            warn!("Nearest Airly station to {} reports no sensors either", location);
        }
        Ok(LocationCheck { use_nearest: true })
    }

    /// Sets up a location and starts refreshing it.
    ///
    /// # Arguments
    ///
    /// * `.entry_id(impl Into<String>)`: **Required.** Id used to address the entry later.
    /// * `.config(LocationConfig)`: **Required.** The location to monitor.
    /// * `.source(Arc<dyn MeasurementSource>)`: Optional. Replaces the HTTP client.
    ///
    /// # Returns
    ///
    /// The entry's coordinator, already holding its first snapshot.
    ///
    /// # Errors
    ///
    /// * [`AirlyError::Config`] for an invalid configuration.
    /// * [`AirlyError::DuplicateEntry`] if `entry_id` is taken.
    /// * [`AirlyError::AlreadyConfigured`] if another entry monitors the same point.
    /// * [`AirlyError::NotReady`] if the initial fetch fails. Nothing is registered and the
    ///   caller may retry later.
    #[builder]
    pub async fn setup_entry(
        &self,
        #[builder(into)] entry_id: String,
        config: LocationConfig,
        source: Option<Arc<dyn MeasurementSource>>,
    ) -> Result<Arc<Coordinator>, AirlyError> {
        config.validate()?;
        self.check_available(&entry_id, &config).await?;

        let source = source.unwrap_or_else(|| Arc::new(self.client_for(&config.api_key)));
        let coordinator = Arc::new(Coordinator::from_config(&config, Arc::clone(&source))?);
        coordinator.first_refresh().await?;

        let scheduler = Scheduler::start(Arc::clone(&coordinator));
        let entry = Entry {
            config,
            source,
            coordinator: Arc::clone(&coordinator),
            scheduler,
        };

        let mut entries = self.entries.lock().await;
        if let Err(e) = Self::ensure_available(&entries, &entry_id, &entry.config) {
            drop(entries);
            entry.unload().await;
            return Err(e);
        }
        info!(
            "Set up Airly entry '{}' ({}) at {}",
            entry_id,
            entry.config.name,
            entry.config.location()
        );
        entries.insert(entry_id, entry);
        Ok(coordinator)
    }

    /// Applies new options to an entry by reloading it.
    ///
    /// The entry is unloaded and set up again with the updated configuration, including a
    /// new initial fetch. If that fetch fails the entry stays unloaded and the error is
    /// returned.
    #[builder]
    pub async fn update_options(
        &self,
        #[builder(into)] entry_id: String,
        options: EntryOptions,
    ) -> Result<Arc<Coordinator>, AirlyError> {
        let (config, source) = {
            let entries = self.entries.lock().await;
            let entry = entries
                .get(&entry_id)
                .ok_or_else(|| AirlyError::UnknownEntry(entry_id.clone()))?;
            (entry.config.with_options(&options), Arc::clone(&entry.source))
        };
        config.validate()?;

        debug!("Reloading Airly entry '{}' with {:?}", entry_id, options);
        self.unload_entry(&entry_id).await?;
        self.setup_entry()
            .entry_id(entry_id)
            .config(config)
            .source(source)
            .call()
            .await
    }
}

impl Airly {
    /// Stops refreshing an entry and forgets it.
    ///
    /// # Errors
    ///
    /// Returns [`AirlyError::UnknownEntry`] if no entry has this id.
    pub async fn unload_entry(&self, entry_id: &str) -> Result<(), AirlyError> {
        let entry = self
            .entries
            .lock()
            .await
            .remove(entry_id)
            .ok_or_else(|| AirlyError::UnknownEntry(entry_id.to_string()))?;
        entry.unload().await;
        info!("Unloaded Airly entry '{}'", entry_id);
        Ok(())
    }

    pub async fn coordinator(&self, entry_id: &str) -> Option<Arc<Coordinator>> {
        self.entries
            .lock()
            .await
            .get(entry_id)
            .map(|entry| Arc::clone(&entry.coordinator))
    }

    pub async fn entry_config(&self, entry_id: &str) -> Option<LocationConfig> {
        self.entries
            .lock()
            .await
            .get(entry_id)
            .map(|entry| entry.config.clone())
    }

    /// Ids of all set-up entries, sorted.
    pub async fn entry_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Unloads every entry.
    pub async fn shutdown(&self) {
        let entries: Vec<Entry> = self
            .entries
            .lock()
            .await
            .drain()
            .map(|(_, entry)| entry)
            .collect();
        let count = entries.len();
        join_all(entries.into_iter().map(Entry::unload)).await;
        debug!("Unloaded {} Airly entries", count);
    }

    fn client_for(&self, api_key: &str) -> AirlyClient {
        AirlyClient::builder()
            .api_key(api_key)
            .http(self.http.clone())
            .base_url(self.base_url.clone())
            .build()
    }

    async fn check_available(&self, entry_id: &str, config: &LocationConfig) -> Result<(), AirlyError> {
        let entries = self.entries.lock().await;
        Self::ensure_available(&entries, entry_id, config)
    }

    fn ensure_available(
        entries: &HashMap<String, Entry>,
        entry_id: &str,
        config: &LocationConfig,
    ) -> Result<(), AirlyError> {
        if entries.contains_key(entry_id) {
            return Err(AirlyError::DuplicateEntry(entry_id.to_string()));
        }
        let unique_id = config.unique_id();
        if entries
            .values()
            .any(|entry| entry.config.unique_id() == unique_id)
        {
            return Err(AirlyError::AlreadyConfigured(unique_id));
        }
        Ok(())
    }
}

/// Returns whether the requested installation has sensors.
async fn probe(
    source: &dyn MeasurementSource,
    request: &MeasurementRequest,
) -> Result<bool, FetchError> {
    let measurements = tokio::time::timeout(VALIDATION_TIMEOUT, source.fetch(request))
        .await
        .map_err(|_| FetchError::Timeout(VALIDATION_TIMEOUT))??;
    let index = measurements
        .current
        .primary_index()
        .ok_or(FetchError::MissingIndex)?;
    let description = index.description.as_deref().unwrap_or_default();
    Ok(!request.language.is_no_sensors_sentinel(description))
}
