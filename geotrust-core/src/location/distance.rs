//! Great-circle distance between readings.
//!
//! City-scale distances only: no special handling of poles or antipodes.

use super::types::PositionSample;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two points given in degrees.
///
/// # Examples
///
/// ```
/// use geotrust_core::location::haversine_distance;
///
/// // One degree of longitude along the equator.
/// let meters = haversine_distance(0.0, 0.0, 0.0, 1.0);
/// assert!((meters - 111_195.0).abs() < 1_112.0);
/// ```
#[must_use]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1.0 for near-antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

/// Haversine distance in meters between two samples.
#[must_use]
pub fn distance_between(from: &PositionSample, to: &PositionSample) -> f64 {
    haversine_distance(from.latitude, from.longitude, to.latitude, to.longitude)
}

/// Speed implied by moving from `from` to `to`, in meters/second.
///
/// Returns `None` when `to` is not strictly later than `from`, or when the
/// timestamps are too far apart to subtract.
#[must_use]
pub fn implied_speed(from: &PositionSample, to: &PositionSample) -> Option<f64> {
    implied_speed_with_slack(from, to, 0.0)
}

/// Like [`implied_speed`], but the distance is first reduced by
/// `slack_meters` (never below zero).
///
/// Pass the combined accuracy radius of both readings so that GPS jitter
/// between closely spaced updates does not read as movement.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Millisecond deltas are far below 2^52.
pub fn implied_speed_with_slack(
    from: &PositionSample,
    to: &PositionSample,
    slack_meters: f64,
) -> Option<f64> {
    let elapsed_millis = to.timestamp_millis.checked_sub(from.timestamp_millis)?;
    if elapsed_millis <= 0 {
        return None;
    }
    let distance = (distance_between(from, to) - slack_meters.max(0.0)).max(0.0);
    Some(distance / (elapsed_millis as f64 / 1_000.0))
}
