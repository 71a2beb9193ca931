//! Location data types.

use serde::{Deserialize, Serialize};

/// Number of accumulated alerts a session tolerates before asking the user to
/// re-verify their location from scratch.
pub const RESTART_ALERT_THRESHOLD: u32 = 5;

/// Accuracy hint passed to the platform when requesting a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PositionAccuracy {
    /// GPS-grade accuracy. Slower and more power hungry.
    #[default]
    High,
    /// Network/Wi-Fi assisted accuracy. Faster first fix.
    Balanced,
}

/// Mobile platform the samples come from.
///
/// Only Android exposes a mock-provider flag, so mocked readings are
/// honoured on Android alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Platform {
    /// Android reports `isFromMockProvider` for each reading.
    Android,
    /// iOS has no public mock indicator.
    Ios,
    /// Desktop, web, tests.
    #[default]
    Other,
}

impl Platform {
    /// Returns whether the platform layer can report mocked readings.
    #[must_use]
    pub const fn reports_mocked_locations(self) -> bool {
        matches!(self, Self::Android)
    }
}

/// A single GPS reading as delivered by the platform.
///
/// Samples are transient: they are evaluated and then dropped, except for the
/// accepted one the caller keeps for place checks.
///
/// # Example
///
/// ```
/// use geotrust_core::location::PositionSample;
///
/// let sample = PositionSample::new(41.0082, 28.9784, 1_700_000_000_000)
///     .with_accuracy(12.0)
///     .with_speed(1.4);
/// assert_eq!(sample.accuracy_meters, Some(12.0));
/// assert!(!sample.is_mocked);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Latitude in degrees.
    pub latitude: f64,

    /// Longitude in degrees.
    pub longitude: f64,

    /// Device-reported horizontal accuracy in meters.
    pub accuracy_meters: Option<f64>,

    /// Device-reported instantaneous speed in meters/second.
    pub speed_meters_per_second: Option<f64>,

    /// Capture time as Unix milliseconds.
    pub timestamp_millis: i64,

    /// Platform mock-provider flag (always false outside Android).
    #[serde(default)]
    pub is_mocked: bool,
}

impl PositionSample {
    /// Creates a sample with no accuracy or speed information.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, timestamp_millis: i64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters: None,
            speed_meters_per_second: None,
            timestamp_millis,
            is_mocked: false,
        }
    }

    /// Sets the reported accuracy.
    #[must_use]
    pub const fn with_accuracy(mut self, accuracy_meters: f64) -> Self {
        self.accuracy_meters = Some(accuracy_meters);
        self
    }

    /// Sets the reported speed.
    #[must_use]
    pub const fn with_speed(mut self, speed_meters_per_second: f64) -> Self {
        self.speed_meters_per_second = Some(speed_meters_per_second);
        self
    }

    /// Sets the mock-provider flag.
    #[must_use]
    pub const fn mocked(mut self, is_mocked: bool) -> Self {
        self.is_mocked = is_mocked;
        self
    }

    /// Age of the sample relative to `now_millis`.
    ///
    /// Negative when the device clock is ahead of `now_millis`. Saturates on
    /// out-of-range timestamps, so a bogus past timestamp always reads as
    /// very old.
    #[must_use]
    pub const fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.timestamp_millis)
    }

    /// Returns whether both coordinates are finite and in range.
    #[must_use]
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Result of validating one sample during a watch session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityAssessment {
    /// True when no anomaly was found.
    pub is_valid: bool,

    /// Number of anomalies found in this sample.
    pub alert_count: u32,

    /// Human-readable anomaly descriptions, in detection order.
    pub warnings: Vec<String>,
}

impl SecurityAssessment {
    /// An assessment with no anomalies.
    #[must_use]
    pub const fn clean() -> Self {
        Self {
            is_valid: true,
            alert_count: 0,
            warnings: Vec::new(),
        }
    }

    /// Records one anomaly.
    pub(crate) fn flag(&mut self, warning: impl Into<String>) {
        self.alert_count += 1;
        self.warnings.push(warning.into());
        self.is_valid = false;
    }
}

/// Session-scoped trust state owned by whoever runs the watch.
///
/// The cumulative alert count only grows; the sole way back to zero is an
/// explicit [`reset`](Self::reset).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningSecurityState {
    cumulative_alert_count: u32,
    last_accepted_sample: Option<PositionSample>,
}

impl RunningSecurityState {
    /// Creates an empty state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cumulative_alert_count: 0,
            last_accepted_sample: None,
        }
    }

    /// Creates a state whose baseline is an already verified sample.
    #[must_use]
    pub const fn with_baseline(sample: PositionSample) -> Self {
        Self {
            cumulative_alert_count: 0,
            last_accepted_sample: Some(sample),
        }
    }

    /// Total alerts accumulated since the last reset.
    #[must_use]
    pub const fn cumulative_alert_count(&self) -> u32 {
        self.cumulative_alert_count
    }

    /// Most recent trustworthy sample.
    #[must_use]
    pub const fn last_accepted_sample(&self) -> Option<&PositionSample> {
        self.last_accepted_sample.as_ref()
    }

    /// Folds one assessment into the running totals.
    ///
    /// The sample becomes the new baseline only when the assessment is clean.
    pub fn record(&mut self, assessment: &SecurityAssessment, sample: &PositionSample) {
        self.cumulative_alert_count = self
            .cumulative_alert_count
            .saturating_add(assessment.alert_count);
        if assessment.is_valid {
            self.last_accepted_sample = Some(sample.clone());
        }
    }

    /// Returns whether enough anomalies piled up to demand re-verification.
    #[must_use]
    pub const fn restart_required(&self) -> bool {
        self.cumulative_alert_count > RESTART_ALERT_THRESHOLD
    }

    /// Clears the counter and installs a new baseline.
    pub fn reset(&mut self, baseline: Option<PositionSample>) {
        self.cumulative_alert_count = 0;
        self.last_accepted_sample = baseline;
    }
}

/// A location handed back by an acquisition flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquiredLocation {
    /// The accepted sample.
    pub sample: PositionSample,

    /// False only for the degraded fallback after a timeout.
    pub verified: bool,
}

impl AcquiredLocation {
    /// Wraps a sample that passed every check.
    #[must_use]
    pub const fn verified(sample: PositionSample) -> Self {
        Self {
            sample,
            verified: true,
        }
    }

    /// Wraps a sample that was not checked.
    #[must_use]
    pub const fn unverified(sample: PositionSample) -> Self {
        Self {
            sample,
            verified: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PositionSample {
        PositionSample::new(41.0082, 28.9784, 1_000)
    }

    #[test]
    fn position_accuracy_default_is_high() {
        assert_eq!(PositionAccuracy::default(), PositionAccuracy::High);
    }

    #[test]
    fn only_android_reports_mocked_locations() {
        assert!(Platform::Android.reports_mocked_locations());
        assert!(!Platform::Ios.reports_mocked_locations());
        assert!(!Platform::Other.reports_mocked_locations());
    }

    #[test]
    fn sample_builders_set_fields() {
        let s = sample().with_accuracy(8.0).with_speed(2.5).mocked(true);
        assert_eq!(s.accuracy_meters, Some(8.0));
        assert_eq!(s.speed_meters_per_second, Some(2.5));
        assert!(s.is_mocked);
    }

    #[test]
    fn sample_age() {
        assert_eq!(sample().age_millis(5_000), 4_000);
        assert_eq!(sample().age_millis(0), -1_000);
    }

    #[test]
    fn sample_age_saturates_on_extreme_timestamps() {
        let ancient = PositionSample::new(41.0, 29.0, i64::MIN);
        assert_eq!(ancient.age_millis(1_700_000_000_000), i64::MAX);

        let future = PositionSample::new(41.0, 29.0, i64::MAX);
        assert_eq!(future.age_millis(-1_000), i64::MIN);
    }

    #[test]
    fn sample_coordinate_validation() {
        assert!(sample().has_valid_coordinates());
        assert!(!PositionSample::new(f64::NAN, 0.0, 0).has_valid_coordinates());
        assert!(!PositionSample::new(91.0, 0.0, 0).has_valid_coordinates());
        assert!(!PositionSample::new(0.0, -181.0, 0).has_valid_coordinates());
        assert!(PositionSample::new(-90.0, 180.0, 0).has_valid_coordinates());
    }

    #[test]
    fn sample_json_defaults_mock_flag() {
        let json = r#"{"latitude":1.0,"longitude":2.0,"accuracy_meters":null,
            "speed_meters_per_second":null,"timestamp_millis":3}"#;
        let s: PositionSample = serde_json::from_str(json).unwrap();
        assert!(!s.is_mocked);
        assert_eq!(s.timestamp_millis, 3);
    }

    #[test]
    fn assessment_flag_invalidates() {
        let mut assessment = SecurityAssessment::clean();
        assert!(assessment.is_valid);

        assessment.flag("first");
        assessment.flag("second");

        assert!(!assessment.is_valid);
        assert_eq!(assessment.alert_count, 2);
        assert_eq!(assessment.warnings, vec!["first", "second"]);
    }

    #[test]
    fn state_records_clean_sample_as_baseline() {
        let mut state = RunningSecurityState::new();
        state.record(&SecurityAssessment::clean(), &sample());

        assert_eq!(state.cumulative_alert_count(), 0);
        assert_eq!(state.last_accepted_sample(), Some(&sample()));
    }

    #[test]
    fn state_keeps_baseline_on_flagged_sample() {
        let baseline = sample();
        let mut state = RunningSecurityState::with_baseline(baseline.clone());

        let mut assessment = SecurityAssessment::clean();
        assessment.flag("speed");
        state.record(&assessment, &PositionSample::new(42.0, 29.0, 2_000));

        assert_eq!(state.cumulative_alert_count(), 1);
        assert_eq!(state.last_accepted_sample(), Some(&baseline));
    }

    #[test]
    fn state_restart_threshold_is_exclusive() {
        let mut state = RunningSecurityState::new();
        let mut assessment = SecurityAssessment::clean();
        assessment.flag("x");

        for _ in 0..RESTART_ALERT_THRESHOLD {
            state.record(&assessment, &sample());
        }
        assert!(!state.restart_required());

        state.record(&assessment, &sample());
        assert!(state.restart_required());
    }

    #[test]
    fn state_reset_clears_counter() {
        let mut state = RunningSecurityState::new();
        let mut assessment = SecurityAssessment::clean();
        assessment.flag("x");
        state.record(&assessment, &sample());

        state.reset(Some(sample()));

        assert_eq!(state.cumulative_alert_count(), 0);
        assert_eq!(state.last_accepted_sample(), Some(&sample()));
    }

    #[test]
    fn acquired_location_constructors() {
        assert!(AcquiredLocation::verified(sample()).verified);
        assert!(!AcquiredLocation::unverified(sample()).verified);
    }
}
