use crate::api::error::FetchError;
use crate::types::snapshot::MeasurementSnapshot;
use std::sync::Arc;

/// The result of one refresh attempt.
///
/// Cloning is cheap: snapshots and errors are shared.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// A new snapshot was published.
    Updated(Arc<MeasurementSnapshot>),
    /// The fetch failed; the previous snapshot is still published.
    FetchFailed(Arc<FetchError>),
    /// Airly answered, but no sensor covers the location. The previous snapshot is
    /// still published.
    NoCoverage { description: String },
    /// The coordinator was closed before the attempt could publish anything.
    Closed,
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, RefreshOutcome::Updated(_))
    }

    pub fn snapshot(&self) -> Option<&Arc<MeasurementSnapshot>> {
        match self {
            RefreshOutcome::Updated(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            RefreshOutcome::FetchFailed(error) => Some(error),
            _ => None,
        }
    }
}
