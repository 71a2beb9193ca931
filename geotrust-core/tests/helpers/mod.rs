//! Reusable test helpers for evaluator and watch session tests.
//!
//! These helpers wire the REAL evaluator to the scripted provider, recording
//! alerter and manual clock from `geotrust_core::location::testing`.

#![allow(dead_code)]

use geotrust_core::location::testing::{ManualClock, RecordingAlerter, ScriptedProvider};
use geotrust_core::location::{LocationTrustEvaluator, Platform, PositionSample, TrustOptions};

/// Fixed "now" for every test, in Unix milliseconds.
pub const NOW: i64 = 1_700_000_000_000;

/// Meters per degree of latitude on a 6 371 km sphere.
pub const METERS_PER_DEGREE: f64 = 111_194.93;

/// Evaluator type used throughout the integration tests.
pub type TestEvaluator = LocationTrustEvaluator<ScriptedProvider, RecordingAlerter, ManualClock>;

/// Builds an evaluator over `provider` with the clock at [`NOW`].
pub fn evaluator(provider: ScriptedProvider, options: TrustOptions) -> TestEvaluator {
    LocationTrustEvaluator::new(provider, RecordingAlerter::new(), ManualClock::at(NOW), options)
}

/// Default options for an Android device.
pub fn android() -> TrustOptions {
    TrustOptions::for_platform(Platform::Android)
}

/// A reading in Istanbul's old town with good accuracy, taken at [`NOW`].
pub fn reading() -> PositionSample {
    PositionSample::new(41.0082, 28.9784, NOW).with_accuracy(10.0)
}

/// A copy of `sample` moved `meters` due north.
pub fn north_of(sample: &PositionSample, meters: f64) -> PositionSample {
    let mut moved = sample.clone();
    moved.latitude += meters / METERS_PER_DEGREE;
    moved
}

/// A copy of `sample` captured `millis` later.
pub fn later(sample: &PositionSample, millis: i64) -> PositionSample {
    let mut moved = sample.clone();
    moved.timestamp_millis += millis;
    moved
}
