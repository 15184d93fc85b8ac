use crate::api::error::FetchError;
use crate::types::config::ConfigError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AirlyError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Location '{entry}' is not ready: {reason}")]
    NotReady {
        entry: String,
        reason: NotReadyReason,
    },

    #[error("Location {0} is already configured")]
    AlreadyConfigured(String),

    #[error("Entry '{0}' is already set up")]
    DuplicateEntry(String),

    #[error("No entry with id '{0}'")]
    UnknownEntry(String),

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

/// Why the initial refresh of a location did not produce a snapshot.
#[derive(Debug, Clone)]
pub enum NotReadyReason {
    FetchFailed(Arc<FetchError>),
    NoCoverage(String),
    Closed,
}

impl fmt::Display for NotReadyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotReadyReason::FetchFailed(error) => write!(f, "{}", error),
            NotReadyReason::NoCoverage(description) => {
                write!(f, "no sensors in this area ({})", description)
            }
            NotReadyReason::Closed => f.write_str("coordinator was closed"),
        }
    }
}

impl AirlyError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, AirlyError::NotReady { .. })
    }
}
