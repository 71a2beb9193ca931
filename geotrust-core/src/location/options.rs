//! Tunable thresholds for location trust checks.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{LocationError, LocationResult};
use super::threshold::TieredThreshold;
use super::types::{Platform, PositionAccuracy};

/// 300 km/h expressed in meters/second.
pub const DEFAULT_MAX_SPEED_METERS_PER_SECOND: f64 = 300.0 / 3.6;

/// Readings older than this are rejected (15 minutes).
pub const DEFAULT_MAX_LOCATION_AGE_MILLIS: i64 = 900_000;

/// Single accuracy ceiling of the quick acquisition path.
pub const QUICK_ACCURACY_LIMIT_METERS: f64 = 500.0;

/// Movements shorter than this between watch updates are not re-validated.
pub const MOVEMENT_EPSILON_METERS: f64 = 0.1;

/// Settings for acquisition and validation.
///
/// Every field has a default, so partial JSON is accepted.
///
/// # Example
///
/// ```
/// use geotrust_core::location::TrustOptions;
///
/// let options = TrustOptions::from_json(r#"{"accuracy_threshold_meters": 50.0}"#).unwrap();
/// assert_eq!(options.accuracy_threshold_meters, 50.0);
/// assert_eq!(options.max_distance_between_readings_meters, 500.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustOptions {
    /// Soft accuracy cutoff; twice this is the hard cutoff.
    pub accuracy_threshold_meters: f64,

    /// Soft cutoff on the distance between the two secure readings; twice
    /// this is the hard cutoff.
    pub max_distance_between_readings_meters: f64,

    /// Speeds above this are physically implausible for a user on the ground.
    pub max_speed_threshold_meters_per_second: f64,

    /// Delay between the two secure readings.
    pub time_between_readings_millis: u64,

    /// Maximum age of an accepted reading.
    pub max_location_age_millis: i64,

    /// Accuracy ceiling of the quick path.
    pub quick_accuracy_limit_meters: f64,

    /// Upper bound on the whole quick-then-secure flow.
    pub acquisition_timeout_millis: u64,

    /// Whether a timed-out flow may hand back one unchecked reading.
    pub allow_unverified_fallback: bool,

    /// Platform the readings come from; gates mock detection.
    pub platform: Platform,
}

impl Default for TrustOptions {
    fn default() -> Self {
        Self {
            accuracy_threshold_meters: 200.0,
            max_distance_between_readings_meters: 500.0,
            max_speed_threshold_meters_per_second: DEFAULT_MAX_SPEED_METERS_PER_SECOND,
            time_between_readings_millis: 1_000,
            max_location_age_millis: DEFAULT_MAX_LOCATION_AGE_MILLIS,
            quick_accuracy_limit_meters: QUICK_ACCURACY_LIMIT_METERS,
            acquisition_timeout_millis: 10_000,
            allow_unverified_fallback: true,
            platform: Platform::default(),
        }
    }
}

impl TrustOptions {
    /// Default options for the given platform.
    #[must_use]
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }

    /// Accuracy cutoffs.
    #[must_use]
    pub fn accuracy_tiers(&self) -> TieredThreshold {
        TieredThreshold::doubling(self.accuracy_threshold_meters)
    }

    /// Distance cutoffs between the two secure readings.
    #[must_use]
    pub fn distance_tiers(&self) -> TieredThreshold {
        TieredThreshold::doubling(self.max_distance_between_readings_meters)
    }

    /// Speed cutoff.
    #[must_use]
    pub const fn speed_tiers(&self) -> TieredThreshold {
        TieredThreshold::single(self.max_speed_threshold_meters_per_second)
    }

    /// Staleness cutoff, in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Ages are far below 2^52 ms.
    pub fn staleness_tiers(&self) -> TieredThreshold {
        TieredThreshold::single(self.max_location_age_millis as f64)
    }

    /// Accuracy cutoff of the quick path.
    #[must_use]
    pub const fn quick_accuracy_tiers(&self) -> TieredThreshold {
        TieredThreshold::single(self.quick_accuracy_limit_meters)
    }

    /// Delay between the two secure readings.
    #[must_use]
    pub const fn time_between_readings(&self) -> Duration {
        Duration::from_millis(self.time_between_readings_millis)
    }

    /// Timeout of the whole acquisition flow.
    #[must_use]
    pub const fn acquisition_timeout(&self) -> Duration {
        Duration::from_millis(self.acquisition_timeout_millis)
    }

    /// Checks that every threshold is usable.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvalidSettings`] naming the first bad field.
    pub fn validate(&self) -> LocationResult<()> {
        let positive = [
            ("accuracy_threshold_meters", self.accuracy_threshold_meters),
            (
                "max_distance_between_readings_meters",
                self.max_distance_between_readings_meters,
            ),
            (
                "max_speed_threshold_meters_per_second",
                self.max_speed_threshold_meters_per_second,
            ),
            ("quick_accuracy_limit_meters", self.quick_accuracy_limit_meters),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(LocationError::InvalidSettings(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.max_location_age_millis <= 0 {
            return Err(LocationError::InvalidSettings(
                "max_location_age_millis must be positive".to_string(),
            ));
        }
        if self.acquisition_timeout_millis == 0 {
            return Err(LocationError::InvalidSettings(
                "acquisition_timeout_millis must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses and validates options from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a threshold is invalid.
    pub fn from_json(json: &str) -> LocationResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Converts these options to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (extremely rare).
    pub fn to_json(&self) -> LocationResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Hints for a continuous position subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    /// Requested accuracy for each update.
    pub accuracy: PositionAccuracy,

    /// Minimum time between updates.
    pub time_interval_millis: u64,

    /// Minimum movement between updates, in whole meters.
    pub distance_interval_meters: u32,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            accuracy: PositionAccuracy::High,
            time_interval_millis: 5_000,
            distance_interval_meters: 10,
        }
    }
}
