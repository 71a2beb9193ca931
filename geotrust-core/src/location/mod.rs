//! Location module for GeoTrust.
//!
//! Decides whether a device location can be trusted before a user posts at a
//! place, and keeps watching for spoofed or impossible movement afterwards:
//!
//! - Secure acquisition from two readings a short delay apart
//! - Quick acquisition from a single looser reading
//! - Per-update anomaly checks (mocked provider, low accuracy, impossible speed)
//! - A session-owned alert counter that demands re-verification past a limit
//!
//! # Thresholds
//!
//! | Check | Soft cutoff | Hard cutoff |
//! |-------|-------------|-------------|
//! | Accuracy | 200 m | 400 m |
//! | Distance between secure readings | 500 m | 1000 m |
//! | Speed | 83.3 m/s | 83.3 m/s |
//! | Age of accepted reading | 15 min | 15 min |
//!
//! Past the soft cutoff a reading is logged, past the hard one it is rejected
//! or counted as an anomaly. All cutoffs are configurable via [`TrustOptions`].
//!
//! # Example Usage
//!
//! ```
//! use geotrust_core::location::{check_first_reading, check_reading_pair, PositionSample, TrustOptions};
//!
//! let options = TrustOptions::default();
//! let first = PositionSample::new(41.0082, 28.9784, 1_000).with_accuracy(15.0);
//! let second = PositionSample::new(41.0083, 28.9785, 2_000).with_accuracy(12.0);
//!
//! assert!(check_first_reading(&options, &first).is_ok());
//! assert!(check_reading_pair(&options, &first, &second, 3_000).is_ok());
//! ```

mod distance;
mod error;
mod evaluator;
mod options;
mod place;
mod provider;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
mod threshold;
mod types;
mod watch;

pub use distance::{
    distance_between, haversine_distance, implied_speed, implied_speed_with_slack,
    EARTH_RADIUS_METERS,
};
pub use error::{LocationError, LocationResult};
pub use evaluator::{
    assess_sample, check_first_reading, check_quick_reading, check_reading_pair,
    LocationTrustEvaluator, SecurityReview,
};
pub use options::{
    TrustOptions, WatchOptions, DEFAULT_MAX_LOCATION_AGE_MILLIS,
    DEFAULT_MAX_SPEED_METERS_PER_SECOND, MOVEMENT_EPSILON_METERS, QUICK_ACCURACY_LIMIT_METERS,
};
pub use place::{nearby_cell, CheckInLocation, Place, PlaceProximity, DEFAULT_PLACE_CELL_PRECISION};
pub use provider::{Alerter, Clock, LogAlerter, PositionProvider, SystemClock, UserAlert};
pub use threshold::{Tier, TieredThreshold};
pub use types::{
    AcquiredLocation, Platform, PositionAccuracy, PositionSample, RunningSecurityState,
    SecurityAssessment, RESTART_ALERT_THRESHOLD,
};
pub use watch::{SecurityTracker, WatchSession, WatchStatus, WatchUpdate};
