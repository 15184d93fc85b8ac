//! HTTP access to the Airly measurements API.
//!
//! [`MeasurementSource`] is the seam the coordinator fetches through; [`AirlyClient`]
//! is its production implementation.

use crate::api::error::FetchError;
use crate::api::response::{ApiErrorBody, Measurements};
use crate::types::language::Language;
use crate::types::lat_lon::LatLon;
use async_trait::async_trait;
use bon::bon;
use log::{debug, warn};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::fmt;

pub const DEFAULT_BASE_URL: &str = "https://airapi.airly.eu";
/// Search radius used when falling back to the nearest station.
pub const DEFAULT_NEAREST_DISTANCE_KM: f64 = 5.0;
const API_KEY_HEADER: &str = "apikey";
const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining-day";

/// Which installation a request should read from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// Interpolated measurements for the exact point.
    Point,
    /// Measurements of the closest installation within `max_distance_km`.
    Nearest { max_distance_km: f64 },
}

impl Target {
    pub fn nearest() -> Self {
        Target::Nearest {
            max_distance_km: DEFAULT_NEAREST_DISTANCE_KM,
        }
    }

    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            Target::Point => "point",
            Target::Nearest { .. } => "nearest",
        }
    }
}

/// Parameters of a single measurements fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementRequest {
    pub location: LatLon,
    pub language: Language,
    pub target: Target,
}

impl MeasurementRequest {
    pub fn new(location: LatLon, language: Language, use_nearest: bool) -> Self {
        let target = if use_nearest {
            Target::nearest()
        } else {
            Target::Point
        };
        Self {
            location,
            language,
            target,
        }
    }

    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("lat", self.location.0.to_string()),
            ("lng", self.location.1.to_string()),
        ];
        if let Target::Nearest { max_distance_km } = self.target {
            pairs.push(("maxDistanceKM", max_distance_km.to_string()));
        }
        pairs
    }
}

/// Anything that can produce measurements for a request.
///
/// Implementations must be safe to call from several coordinators at once; the
/// coordinator itself guarantees it never has two fetches in flight.
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    async fn fetch(&self, request: &MeasurementRequest) -> Result<Measurements, FetchError>;
}

/// Client for the Airly REST API.
///
/// # Examples
///
/// ```no_run
/// # use airly::{AirlyClient, FetchError, Language, LatLon, MeasurementRequest, MeasurementSource};
/// # #[tokio::main]
/// # async fn main() -> Result<(), FetchError> {
/// let client = AirlyClient::builder().api_key("my-api-key").build();
/// let request = MeasurementRequest::new(LatLon(50.0614, 19.9366), Language::En, false);
///
/// let measurements = client.fetch(&request).await?;
/// println!("{:#?}", measurements.current.values);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AirlyClient {
    api_key: String,
    http: Client,
    base_url: String,
}

#[bon]
impl AirlyClient {
    /// Creates a client.
    ///
    /// # Arguments
    ///
    /// * `.api_key(impl Into<String>)`: **Required.** The Airly API key.
    /// * `.http(Client)`: Optional. A shared `reqwest` client; a new one is created otherwise.
    /// * `.base_url(impl Into<String>)`: Optional. Defaults to [`DEFAULT_BASE_URL`].
    #[builder]
    pub fn new(
        #[builder(into)] api_key: String,
        http: Option<Client>,
        #[builder(into)] base_url: Option<String>,
    ) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            api_key,
            http: http.unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn endpoint(&self, target: Target) -> String {
        format!("{}/v2/measurements/{}", self.base_url, target.path_segment())
    }
}

impl fmt::Debug for AirlyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AirlyClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MeasurementSource for AirlyClient {
    async fn fetch(&self, request: &MeasurementRequest) -> Result<Measurements, FetchError> {
        let url = self.endpoint(request.target);
        debug!(
            "Requesting {} measurements for {} ({})",
            request.target.path_segment(),
            request.location,
            request.language
        );

        let response = self
            .http
            .get(&url)
            .query(&request.query_pairs())
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .header(ACCEPT_LANGUAGE, request.language.code())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let remaining_today = response
            .headers()
            .get(RATE_LIMIT_REMAINING_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        if let Some(remaining) = remaining_today {
            debug!("Airly requests remaining today: {}", remaining);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ApiErrorBody>().await.ok();
            let error = FetchError::from_status(url, status, body, remaining_today);
            warn!("{}", error);
            return Err(error);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        serde_json::from_slice::<Measurements>(&bytes)
            .map_err(|source| FetchError::Decode { url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let client = AirlyClient::builder()
            .api_key("key")
            .base_url("http://localhost:8080/")
            .build();
        assert_eq!(
            client.endpoint(Target::Point),
            "http://localhost:8080/v2/measurements/point"
        );
        assert_eq!(
            client.endpoint(Target::nearest()),
            "http://localhost:8080/v2/measurements/nearest"
        );

        let default_client = AirlyClient::builder().api_key("key").build();
        assert_eq!(
            default_client.endpoint(Target::Point),
            "https://airapi.airly.eu/v2/measurements/point"
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = AirlyClient::builder().api_key("secret-key-123").build();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret-key-123"));
        assert!(debug.contains("https://airapi.airly.eu"));
    }

    #[test]
    fn test_query_pairs() {
        let point = MeasurementRequest::new(LatLon(50.06, 19.94), Language::Pl, false);
        assert_eq!(
            point.query_pairs(),
            vec![("lat", "50.06".to_string()), ("lng", "19.94".to_string())]
        );

        let nearest = MeasurementRequest::new(LatLon(50.06, 19.94), Language::En, true);
        assert_eq!(nearest.target, Target::Nearest { max_distance_km: 5.0 });
        assert_eq!(
            nearest.query_pairs().last(),
            Some(&("maxDistanceKM", "5".to_string()))
        );
    }
}
