//! Synchronous facade for callers that read positions themselves.
//!
//! The mobile shell owns the platform location APIs; it pushes readings in
//! and gets decisions and alerts back. No provider, clock or alerter is
//! involved, so every call is a plain function call over the FFI boundary.

use log::{info, warn};

use crate::location::{
    check_first_reading, check_quick_reading, check_reading_pair, AcquiredLocation,
    LocationResult, PositionSample, RunningSecurityState, SecurityTracker, TrustOptions,
    WatchUpdate,
};

/// Core interface for GeoTrust functionality.
///
/// Holds the active options and the running security state of the current
/// session.
#[derive(Debug, Default)]
pub struct GeoTrustCore {
    options: TrustOptions,
    tracker: SecurityTracker,
}

impl GeoTrustCore {
    /// Creates a core with default options and an empty session.
    ///
    /// # Examples
    ///
    /// ```
    /// use geotrust_core::GeoTrustCore;
    ///
    /// let core = GeoTrustCore::new();
    /// assert_eq!(core.cumulative_alert_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a core with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the options fail validation.
    pub fn with_options(options: TrustOptions) -> LocationResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            tracker: SecurityTracker::default(),
        })
    }

    /// Gets the active options.
    #[must_use]
    pub const fn options(&self) -> &TrustOptions {
        &self.options
    }

    /// Replaces the options. The running session is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the options fail validation.
    pub fn set_options(&mut self, options: TrustOptions) -> LocationResult<()> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    /// Runs the secure two-reading checks on readings taken by the caller.
    ///
    /// `second` should be taken at least
    /// [`TrustOptions::time_between_readings`] after `first`.
    ///
    /// # Errors
    ///
    /// Same as [`check_first_reading`] and [`check_reading_pair`].
    pub fn verify_reading_pair(
        &self,
        first: &PositionSample,
        second: PositionSample,
        now_millis: i64,
    ) -> LocationResult<AcquiredLocation> {
        check_first_reading(&self.options, first)?;
        check_reading_pair(&self.options, first, &second, now_millis)?;
        Ok(AcquiredLocation::verified(second))
    }

    /// Runs the quick single-reading check.
    ///
    /// # Errors
    ///
    /// Same as [`check_quick_reading`].
    pub fn verify_quick_reading(&self, sample: PositionSample) -> LocationResult<AcquiredLocation> {
        check_quick_reading(&self.options, &sample)?;
        Ok(AcquiredLocation::verified(sample))
    }

    /// Starts a new session from a verified location, clearing the alert
    /// counter.
    ///
    /// An unverified location is ignored: the counter and baseline of the
    /// running session are kept.
    pub fn begin_session(&mut self, location: &AcquiredLocation) {
        if !location.verified {
            warn!(
                "Unverified location cannot start a session, keeping {} alerts",
                self.tracker.state().cumulative_alert_count()
            );
            return;
        }
        self.tracker.reset(Some(location.sample.clone()));
        info!("Security session started");
    }

    /// Feeds one watch update through the anomaly checks.
    pub fn process_update(&mut self, sample: PositionSample) -> WatchUpdate {
        self.tracker.observe(&self.options, sample)
    }

    /// Current running state.
    #[must_use]
    pub const fn state(&self) -> &RunningSecurityState {
        self.tracker.state()
    }

    /// Alerts accumulated since the session started.
    #[must_use]
    pub const fn cumulative_alert_count(&self) -> u32 {
        self.tracker.state().cumulative_alert_count()
    }

    /// Whether the session needs a fresh verification.
    #[must_use]
    pub const fn restart_required(&self) -> bool {
        self.tracker.state().restart_required()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{LocationError, UserAlert};

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn new_starts_empty() {
        let core = GeoTrustCore::new();
        assert_eq!(core.cumulative_alert_count(), 0);
        assert!(!core.restart_required());
        assert!(core.state().last_accepted_sample().is_none());
    }

    #[test]
    fn with_options_validates() {
        let bad = TrustOptions {
            max_distance_between_readings_meters: -1.0,
            ..TrustOptions::default()
        };
        assert!(GeoTrustCore::with_options(bad).is_err());
        assert!(GeoTrustCore::with_options(TrustOptions::default()).is_ok());
    }

    #[test]
    fn set_options_rejects_invalid_and_keeps_old() {
        let mut core = GeoTrustCore::new();
        let bad = TrustOptions {
            accuracy_threshold_meters: f64::NAN,
            ..TrustOptions::default()
        };
        assert!(core.set_options(bad).is_err());
        assert_eq!(core.options().accuracy_threshold_meters, 200.0);
    }

    #[test]
    fn verify_reading_pair_accepts_second() {
        let core = GeoTrustCore::new();
        let first = PositionSample::new(41.0082, 28.9784, NOW).with_accuracy(10.0);
        let second = PositionSample::new(41.0083, 28.9785, NOW + 1_000);

        let location = core
            .verify_reading_pair(&first, second.clone(), NOW + 1_500)
            .unwrap();

        assert!(location.verified);
        assert_eq!(location.sample, second);
    }

    #[test]
    fn verify_reading_pair_reports_low_accuracy() {
        let core = GeoTrustCore::new();
        let first = PositionSample::new(41.0, 29.0, NOW).with_accuracy(401.0);
        let result = core.verify_reading_pair(&first, first.clone(), NOW);
        assert!(matches!(result, Err(LocationError::LowAccuracy { .. })));
    }

    #[test]
    fn verify_quick_reading_limits_accuracy() {
        let core = GeoTrustCore::new();
        let loose = PositionSample::new(41.0, 29.0, NOW).with_accuracy(501.0);
        assert!(core.verify_quick_reading(loose).is_err());
    }

    #[test]
    fn session_accumulates_alerts() {
        let mut core = GeoTrustCore::new();
        let start = PositionSample::new(41.0082, 28.9784, NOW);
        core.begin_session(&AcquiredLocation::verified(start));

        let near = core.process_update(PositionSample::new(41.0083, 28.9785, NOW + 1_000));
        assert_eq!(near.cumulative_alert_count, 0);

        let jump = core.process_update(PositionSample::new(41.2000, 28.9784, NOW + 2_000));
        assert_eq!(jump.cumulative_alert_count, 1);
        assert_eq!(jump.alerts, vec![UserAlert::AbnormalMovement]);
        assert_eq!(core.cumulative_alert_count(), 1);
    }

    #[test]
    fn begin_session_resets_counter() {
        let mut core = GeoTrustCore::new();
        core.process_update(PositionSample::new(41.0, 29.0, NOW).with_accuracy(5_000.0));
        assert_eq!(core.cumulative_alert_count(), 1);

        let fresh = AcquiredLocation::verified(PositionSample::new(41.0, 29.0, NOW));
        core.begin_session(&fresh);

        assert_eq!(core.cumulative_alert_count(), 0);
        assert!(core.state().last_accepted_sample().is_some());
    }

    #[test]
    fn unverified_location_is_not_a_baseline() {
        let mut core = GeoTrustCore::new();
        for i in 0..6_i32 {
            core.process_update(
                PositionSample::new(41.0 + f64::from(i) * 0.001, 29.0, NOW).with_accuracy(5_000.0),
            );
        }
        assert_eq!(core.cumulative_alert_count(), 6);
        assert!(core.restart_required());

        let fallback = AcquiredLocation::unverified(PositionSample::new(41.0, 29.0, NOW));
        core.begin_session(&fallback);

        assert!(core.state().last_accepted_sample().is_none());
        assert_eq!(core.cumulative_alert_count(), 6);
        assert!(core.restart_required());
    }

    #[test]
    fn extreme_timestamp_is_stale_not_verified() {
        let core = GeoTrustCore::new();
        let first = PositionSample::new(41.0, 29.0, NOW).with_accuracy(10.0);
        let second = PositionSample::new(41.0, 29.0, i64::MIN).with_accuracy(10.0);

        let err = core.verify_reading_pair(&first, second, NOW).unwrap_err();

        assert_eq!(err, LocationError::StaleData { age_millis: i64::MAX });
    }

    #[test]
    fn invalid_coordinates_are_never_verified() {
        let core = GeoTrustCore::new();
        let bogus = PositionSample::new(f64::NAN, 999.0, NOW).with_accuracy(10.0);
        let good = PositionSample::new(41.0, 29.0, NOW).with_accuracy(10.0);

        assert!(matches!(
            core.verify_quick_reading(bogus.clone()),
            Err(LocationError::Platform(_))
        ));
        assert!(matches!(
            core.verify_reading_pair(&good, bogus, NOW),
            Err(LocationError::Platform(_))
        ));
    }

    #[test]
    fn debug_trait_implementation() {
        let core = GeoTrustCore::new();
        let debug_str = format!("{core:?}");
        assert!(debug_str.contains("GeoTrustCore"));
    }
}
