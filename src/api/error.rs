use crate::api::response::ApiErrorBody;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Airly rejected the API key for {url}: {message}")]
    Unauthorized { url: String, message: String },

    #[error("No measurements available for {url}: {message}")]
    NotFound { url: String, message: String },

    #[error("Airly rate limit exceeded for {url}: {message}")]
    RateLimited {
        url: String,
        message: String,
        remaining_today: Option<u64>,
    },

    #[error("HTTP request failed for {url} with status {status}: {message}")]
    Status {
        url: String,
        status: StatusCode,
        message: String,
    },

    #[error("Failed to decode measurements from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Response contains no usable air quality index")]
    MissingIndex,
}

impl FetchError {
    /// Classifies a non-success HTTP status.
    pub fn from_status(
        url: String,
        status: StatusCode,
        body: Option<ApiErrorBody>,
        remaining_today: Option<u64>,
    ) -> Self {
        let message = body
            .and_then(|b| b.message.or(b.error_code))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                FetchError::Unauthorized { url, message }
            }
            StatusCode::NOT_FOUND => FetchError::NotFound { url, message },
            StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited {
                url,
                message,
                remaining_today,
            },
            _ => FetchError::Status {
                url,
                status,
                message,
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, FetchError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }

    /// Connection failures and timeouts.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport { .. } | FetchError::Timeout(_))
    }
}
