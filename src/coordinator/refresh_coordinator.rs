//! The refresh coordinator: one per configured location.

use crate::api::client::{MeasurementRequest, MeasurementSource, Target};
use crate::api::error::FetchError;
use crate::api::response::Measurements;
use crate::coordinator::listeners::{ListenerId, Listeners};
use crate::coordinator::outcome::RefreshOutcome;
use crate::error::{AirlyError, NotReadyReason};
use crate::types::config::{ConfigError, LocationConfig};
use crate::types::language::Language;
use crate::types::lat_lon::LatLon;
use crate::types::snapshot::MeasurementSnapshot;
use bon::bon;
use chrono::Utc;
use log::{debug, error, info};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Upper bound on a single fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Default)]
struct CoordinatorState {
    snapshot: Option<Arc<MeasurementSnapshot>>,
    last_update_success: bool,
    /// Incremented by every published attempt.
    generation: u64,
    last_outcome: Option<RefreshOutcome>,
    last_success_at: Option<Instant>,
}

/// Owns the published measurements of one location.
///
/// The coordinator fetches on demand (see [`Coordinator::refresh`]); periodic
/// refreshes are driven by a [`Scheduler`](crate::Scheduler). Consumers read the
/// last good snapshot with [`Coordinator::current_snapshot`] and learn about new
/// attempts through [`Coordinator::subscribe`].
///
/// # Examples
///
/// ```no_run
/// # use airly::{AirlyClient, Coordinator, LatLon, RefreshOutcome};
/// # use std::sync::Arc;
/// # use std::time::Duration;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = Arc::new(AirlyClient::builder().api_key("my-api-key").build());
/// let coordinator = Coordinator::builder()
///     .name("Home")
///     .source(source)
///     .location(LatLon(50.0614, 19.9366))
///     .interval(Duration::from_secs(900))
///     .build()?;
///
/// coordinator.subscribe(|outcome: &RefreshOutcome| {
///     if let Some(snapshot) = outcome.snapshot() {
///         println!("CAQI is now {}", snapshot.caqi);
///     }
/// });
///
/// coordinator.first_refresh().await?;
/// # Ok(())
/// # }
/// ```
pub struct Coordinator {
    name: String,
    source: Arc<dyn MeasurementSource>,
    request: MeasurementRequest,
    interval: Duration,
    fetch_timeout: Duration,
    state: RwLock<CoordinatorState>,
    refresh_lock: Mutex<()>,
    listeners: Listeners,
    closed: AtomicBool,
}

#[bon]
impl Coordinator {
    /// Creates a coordinator. Nothing is fetched until the first refresh.
    ///
    /// # Arguments
    ///
    /// * `.name(impl Into<String>)`: **Required.** Used in log messages and errors.
    /// * `.source(Arc<dyn MeasurementSource>)`: **Required.** Where measurements come from.
    /// * `.location(LatLon)`: **Required.** The monitored point.
    /// * `.interval(Duration)`: **Required.** Refresh interval; must be positive.
    /// * `.language(Language)`: Optional. Language of descriptions. Defaults to English.
    /// * `.use_nearest(bool)`: Optional. Read from the nearest station. Defaults to `false`.
    /// * `.fetch_timeout(Duration)`: Optional. Defaults to [`DEFAULT_FETCH_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a zero interval or an invalid location.
    #[builder]
    pub fn new(
        #[builder(into)] name: String,
        source: Arc<dyn MeasurementSource>,
        location: LatLon,
        interval: Duration,
        #[builder(default)] language: Language,
        #[builder(default)] use_nearest: bool,
        #[builder(default = DEFAULT_FETCH_TIMEOUT)] fetch_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        location.validate()?;
        if interval.is_zero() {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(Self {
            name,
            source,
            request: MeasurementRequest::new(location, language, use_nearest),
            interval,
            fetch_timeout,
            state: RwLock::new(CoordinatorState::default()),
            refresh_lock: Mutex::new(()),
            listeners: Listeners::default(),
            closed: AtomicBool::new(false),
        })
    }
}

impl Coordinator {
    /// Creates a coordinator for a stored configuration.
    pub fn from_config(
        config: &LocationConfig,
        source: Arc<dyn MeasurementSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Coordinator::builder()
            .name(config.name.clone())
            .source(source)
            .location(config.location())
            .interval(config.interval())
            .language(config.language)
            .use_nearest(config.use_nearest)
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> LatLon {
        self.request.location
    }

    pub fn language(&self) -> Language {
        self.request.language
    }

    pub fn use_nearest(&self) -> bool {
        !matches!(self.request.target, Target::Point)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The most recent successful snapshot, if any refresh has succeeded yet.
    pub fn current_snapshot(&self) -> Option<Arc<MeasurementSnapshot>> {
        self.read_state().snapshot.clone()
    }

    /// Whether the most recent completed attempt published a new snapshot.
    pub fn last_update_success(&self) -> bool {
        self.read_state().last_update_success
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Registers a callback that runs after every completed refresh attempt.
    ///
    /// Listeners run synchronously, in registration order, before `refresh` returns.
    ///
    /// A listener must not call [`subscribe`](Self::subscribe),
    /// [`unsubscribe`](Self::unsubscribe) or [`close`](Self::close) on this coordinator:
    /// they wait for notification to finish and deadlock. To refresh again from a
    /// listener, spawn the refresh. It starts once the notifying refresh has returned.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&RefreshOutcome) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(listener))
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Fetches, classifies and publishes.
    ///
    /// Refreshes of one coordinator never overlap. A call that has to wait for an
    /// in-flight refresh returns that refresh's outcome instead of fetching again.
    ///
    /// On success the snapshot is replaced and the success flag set. Any failure,
    /// including a response without sensor coverage, clears the success flag and keeps
    /// the previous snapshot. Listeners are notified in both cases. Nothing is
    /// published after [`Coordinator::close`].
    pub async fn refresh(&self) -> RefreshOutcome {
        if self.is_closed() {
            return RefreshOutcome::Closed;
        }

        let seen_generation = self.read_state().generation;
        let _guard = self.refresh_lock.lock().await;
        {
            let state = self.read_state();
            if state.generation != seen_generation {
                if let Some(outcome) = &state.last_outcome {
                    debug!("{}: joined a refresh that completed while waiting", self.name);
                    return outcome.clone();
                }
            }
        }
        if self.is_closed() {
            return RefreshOutcome::Closed;
        }

        let outcome = self.fetch_outcome().await;
        if !self.publish(&outcome) {
            debug!("{}: closed during refresh, discarding result", self.name);
            return RefreshOutcome::Closed;
        }
        self.listeners.notify(&outcome);
        outcome
    }

    /// Refreshes unless the last successful update is younger than the refresh interval.
    ///
    /// Returns `None` when the call was throttled.
    pub async fn request_refresh(&self) -> Option<RefreshOutcome> {
        let last_success_at = self.read_state().last_success_at;
        if let Some(at) = last_success_at {
            if at.elapsed() < self.interval {
                debug!("{}: refresh throttled", self.name);
                return None;
            }
        }
        Some(self.refresh().await)
    }

    /// Performs the initial refresh of a location being set up.
    ///
    /// # Errors
    ///
    /// Returns [`AirlyError::NotReady`] if the refresh did not produce a snapshot.
    pub async fn first_refresh(&self) -> Result<Arc<MeasurementSnapshot>, AirlyError> {
        let reason = match self.refresh().await {
            RefreshOutcome::Updated(snapshot) => return Ok(snapshot),
            RefreshOutcome::FetchFailed(error) => NotReadyReason::FetchFailed(error),
            RefreshOutcome::NoCoverage { description } => NotReadyReason::NoCoverage(description),
            RefreshOutcome::Closed => NotReadyReason::Closed,
        };
        Err(AirlyError::NotReady {
            entry: self.name.clone(),
            reason,
        })
    }

    /// Tears the coordinator down: clears all listeners and stops publishing.
    ///
    /// A refresh still in flight completes without publishing or notifying.
    pub fn close(&self) {
        {
            let _state = self.write_state();
            self.closed.store(true, Ordering::SeqCst);
        }
        self.listeners.clear();
        debug!("{}: coordinator closed", self.name);
    }

    async fn fetch_outcome(&self) -> RefreshOutcome {
        let fetched =
            match tokio::time::timeout(self.fetch_timeout, self.source.fetch(&self.request)).await
            {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
            };

        let outcome = match fetched {
            Ok(measurements) => self.classify(measurements),
            Err(error) => RefreshOutcome::FetchFailed(Arc::new(error)),
        };

        match &outcome {
            RefreshOutcome::Updated(snapshot) => {
                debug!("{}: data retrieved from Airly (CAQI {})", self.name, snapshot.caqi)
            }
            RefreshOutcome::FetchFailed(error) => {
                error!("{}: error fetching Airly data: {}", self.name, error)
            }
            RefreshOutcome::NoCoverage { .. } => error!(
                "{}: can't retrieve data, no Airly sensors in this area",
                self.name
            ),
            RefreshOutcome::Closed => {}
        }
        outcome
    }

    fn classify(&self, measurements: Measurements) -> RefreshOutcome {
        let current = measurements.current;
        let Some(index) = current.primary_index() else {
            return RefreshOutcome::FetchFailed(Arc::new(FetchError::MissingIndex));
        };
        if let Some(description) = index.description.as_deref() {
            if self.request.language.is_no_sensors_sentinel(description) {
                return RefreshOutcome::NoCoverage {
                    description: description.to_string(),
                };
            }
        }
        match MeasurementSnapshot::from_current(&current, Utc::now()) {
            Ok(snapshot) => RefreshOutcome::Updated(Arc::new(snapshot)),
            Err(error) => RefreshOutcome::FetchFailed(Arc::new(error)),
        }
    }

    /// Applies an outcome to the state. Returns `false` if the coordinator is closed.
    fn publish(&self, outcome: &RefreshOutcome) -> bool {
        let mut state = self.write_state();
        if self.is_closed() {
            return false;
        }
        state.generation += 1;
        match outcome {
            RefreshOutcome::Updated(snapshot) => {
                if !state.last_update_success && state.last_outcome.is_some() {
                    info!("{}: fetching Airly data recovered", self.name);
                }
                state.snapshot = Some(Arc::clone(snapshot));
                state.last_update_success = true;
                state.last_success_at = Some(Instant::now());
            }
            RefreshOutcome::FetchFailed(_) | RefreshOutcome::NoCoverage { .. } => {
                state.last_update_success = false;
            }
            RefreshOutcome::Closed => {}
        }
        state.last_outcome = Some(outcome.clone());
        true
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CoordinatorState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CoordinatorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.name)
            .field("request", &self.request)
            .field("interval", &self.interval)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("listeners", &self.listeners.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
