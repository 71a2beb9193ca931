//! Place proximity and check-in payloads.
//!
//! Once a location is accepted it is used to decide whether the user is at a
//! place, to look up nearby places by geohash cell, and to build the location
//! part of a post sent to the backend.

use serde::{Deserialize, Serialize};

use super::distance::haversine_distance;
use super::types::{AcquiredLocation, PositionSample};

/// Geohash length used for nearby-place lookups (~±610 m cells).
pub const DEFAULT_PLACE_CELL_PRECISION: u8 = 6;

/// Decimal places kept in check-in coordinates (~1.1 m).
const CHECK_IN_DECIMALS: i32 = 5;

/// A place users can post at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Backend identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Center latitude in degrees.
    pub latitude: f64,
    /// Center longitude in degrees.
    pub longitude: f64,
    /// Radius within which a user counts as being at the place.
    pub radius_meters: f64,
}

/// How far a sample is from a place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaceProximity {
    /// Distance from the sample to the place center.
    pub distance_meters: f64,
    /// Whether the sample may be inside the place radius.
    pub within: bool,
}

impl Place {
    /// Measures `sample` against this place.
    ///
    /// The reading's accuracy is given the benefit of the doubt: a user
    /// counts as present when the accuracy circle reaches the place radius.
    ///
    /// # Examples
    ///
    /// ```
    /// use geotrust_core::location::{Place, PositionSample};
    ///
    /// let cafe = Place {
    ///     id: "p1".to_string(),
    ///     name: "Cafe".to_string(),
    ///     latitude: 41.0082,
    ///     longitude: 28.9784,
    ///     radius_meters: 50.0,
    /// };
    /// let here = PositionSample::new(41.0083, 28.9785, 0).with_accuracy(5.0);
    /// assert!(cafe.proximity(&here).within);
    /// ```
    #[must_use]
    pub fn proximity(&self, sample: &PositionSample) -> PlaceProximity {
        let distance_meters =
            haversine_distance(sample.latitude, sample.longitude, self.latitude, self.longitude);
        let slack = sample
            .accuracy_meters
            .filter(|a| a.is_finite() && *a > 0.0)
            .unwrap_or(0.0);
        PlaceProximity {
            distance_meters,
            within: distance_meters - slack <= self.radius_meters,
        }
    }

    /// Geohash cell of the place center.
    #[must_use]
    pub fn cell(&self, precision: u8) -> String {
        encode_cell(self.latitude, self.longitude, precision)
    }
}

fn encode_cell(lat: f64, lon: f64, precision: u8) -> String {
    geohash::encode(geohash::Coord { x: lon, y: lat }, usize::from(precision))
        .unwrap_or_else(|_| String::new())
}

/// Geohash cell of `sample`, for querying nearby places.
///
/// Returns an empty string for coordinates geohash cannot encode.
///
/// # Examples
///
/// ```
/// use geotrust_core::location::{nearby_cell, PositionSample, DEFAULT_PLACE_CELL_PRECISION};
///
/// let cell = nearby_cell(&PositionSample::new(37.7749, -122.4194, 0), DEFAULT_PLACE_CELL_PRECISION);
/// assert_eq!(cell.len(), 6);
/// ```
#[must_use]
pub fn nearby_cell(sample: &PositionSample, precision: u8) -> String {
    encode_cell(sample.latitude, sample.longitude, precision)
}

fn round_coordinate(coord: f64) -> f64 {
    let multiplier = 10_f64.powi(CHECK_IN_DECIMALS);
    (coord * multiplier).round() / multiplier
}

/// Location part of a post, as sent to the backend.
///
/// Speed and the mock flag stay on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInLocation {
    /// Latitude rounded to 5 decimals.
    pub latitude: f64,
    /// Longitude rounded to 5 decimals.
    pub longitude: f64,
    /// Reported accuracy, if any.
    pub accuracy_meters: Option<f64>,
    /// Capture time as Unix milliseconds.
    pub timestamp_millis: i64,
    /// Whether the location passed the trust checks.
    pub verified: bool,
}

impl CheckInLocation {
    /// Builds the payload for an acquired location.
    #[must_use]
    pub fn from_acquired(location: &AcquiredLocation) -> Self {
        let sample = &location.sample;
        Self {
            latitude: round_coordinate(sample.latitude),
            longitude: round_coordinate(sample.longitude),
            accuracy_meters: sample.accuracy_meters,
            timestamp_millis: sample.timestamp_millis,
            verified: location.verified,
        }
    }

    /// Converts the payload to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (extremely rare).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
