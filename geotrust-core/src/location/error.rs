//! Error types for location trust checks.
//!
//! Every failure of an acquisition or validation flow is reported through
//! [`LocationError`]. None of them are fatal: the caller decides whether to
//! retry, fall back to an unverified location, or give up.

use thiserror::Error;

/// Errors that can occur while acquiring or validating a location.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    /// A reading was worse than the hard accuracy ceiling.
    #[error("Very low accuracy")]
    LowAccuracy {
        /// Accuracy reported by the device, in meters.
        accuracy_meters: f64,
    },

    /// Two consecutive readings disagreed beyond the hard distance ceiling.
    #[error("Major location inconsistency")]
    LocationInconsistency {
        /// Distance between the two readings, in meters.
        distance_meters: f64,
    },

    /// The accepted reading is older than the staleness limit.
    #[error("Old location data")]
    StaleData {
        /// Age of the reading at evaluation time, in milliseconds.
        age_millis: i64,
    },

    /// The platform reported the reading as injected by a mock provider.
    #[error("Mocked location detected")]
    MockedLocation,

    /// Foreground location permission was not granted.
    #[error("Location permission denied")]
    PermissionDenied,

    /// Device location services are switched off.
    #[error("Location services are disabled")]
    ServicesDisabled,

    /// The underlying platform location API failed.
    #[error("{0}")]
    Platform(String),

    /// The acquisition flow did not finish in time.
    #[error("Location request timed out")]
    Timeout,

    /// An operation was called in a state that does not allow it.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Settings failed validation.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl LocationError {
    /// Returns whether retrying the same flow may succeed.
    ///
    /// Reading-quality failures and platform hiccups are transient. Missing
    /// permissions, disabled services and programming errors are not fixed
    /// by asking again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LowAccuracy { .. }
                | Self::LocationInconsistency { .. }
                | Self::StaleData { .. }
                | Self::Platform(_)
                | Self::Timeout
        )
    }
}

impl From<serde_json::Error> for LocationError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidSettings(err.to_string())
    }
}

/// Result type for location operations.
pub type LocationResult<T> = Result<T, LocationError>;
