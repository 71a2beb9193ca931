//! Location trust evaluation.
//!
//! Two jobs:
//!
//! - **Acquisition**: read the device position and decide whether it can be
//!   trusted for a place check. The secure flow takes two readings a fixed
//!   delay apart and compares them; the quick flow takes one looser reading.
//! - **Validation**: judge each update of a live watch and count anomalies.
//!
//! The decision logic lives in free functions over [`TrustOptions`] so that
//! callers which obtain readings elsewhere run exactly the same checks as the
//! provider-driven flows.
//!
//! # Example
//!
//! ```ignore
//! use geotrust_core::location::{LocationTrustEvaluator, LogAlerter, SystemClock, TrustOptions};
//!
//! let evaluator = LocationTrustEvaluator::new(provider, LogAlerter, SystemClock, TrustOptions::default());
//! let location = evaluator.acquire_location().await?;
//! if location.verified {
//!     submit_post(location.sample);
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};

use super::distance::{distance_between, implied_speed_with_slack};
use super::error::{LocationError, LocationResult};
use super::options::TrustOptions;
use super::provider::{Alerter, Clock, PositionProvider, UserAlert};
use super::threshold::Tier;
use super::types::{AcquiredLocation, PositionAccuracy, PositionSample, SecurityAssessment};

/// An assessment together with the alerts it calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityReview {
    /// Anomalies found in the sample.
    pub assessment: SecurityAssessment,
    /// Alerts to present, in detection order.
    pub alerts: Vec<UserAlert>,
}

const INVALID_COORDINATES: &str = "Location provider returned invalid coordinates";

fn reject_invalid(sample: &PositionSample) -> LocationResult<()> {
    if sample.has_valid_coordinates() {
        Ok(())
    } else {
        Err(LocationError::Platform(INVALID_COORDINATES.to_string()))
    }
}

fn reject_mocked(options: &TrustOptions, sample: &PositionSample) -> LocationResult<()> {
    if options.platform.reports_mocked_locations() && sample.is_mocked {
        warn!("Rejecting mocked location reading");
        return Err(LocationError::MockedLocation);
    }
    Ok(())
}

/// Checks the first reading of the secure flow.
///
/// # Errors
///
/// - [`LocationError::Platform`] if the coordinates are not finite or out of
///   range.
/// - [`LocationError::MockedLocation`] if the platform flags the reading.
/// - [`LocationError::LowAccuracy`] if accuracy is worse than twice the
///   accuracy threshold. Accuracy between one and two times the threshold is
///   tolerated and logged.
pub fn check_first_reading(options: &TrustOptions, sample: &PositionSample) -> LocationResult<()> {
    reject_invalid(sample)?;
    reject_mocked(options, sample)?;

    let accuracy = sample.accuracy_meters;
    match options.accuracy_tiers().classify_opt(accuracy) {
        Tier::Within => Ok(()),
        Tier::Degraded => {
            warn!("Low accuracy reading tolerated: {accuracy:?} m");
            Ok(())
        }
        Tier::Exceeded => Err(LocationError::LowAccuracy {
            accuracy_meters: accuracy.unwrap_or(f64::NAN),
        }),
    }
}

/// Compares the two readings of the secure flow and checks freshness.
///
/// # Errors
///
/// - [`LocationError::Platform`] if either reading has invalid coordinates.
/// - [`LocationError::MockedLocation`] if the platform flags the second reading.
/// - [`LocationError::LocationInconsistency`] if the readings are more than
///   twice the distance threshold apart. Distances between one and two times
///   the threshold are tolerated and logged.
/// - [`LocationError::StaleData`] if the second reading is older than the
///   staleness limit at `now_millis`.
pub fn check_reading_pair(
    options: &TrustOptions,
    first: &PositionSample,
    second: &PositionSample,
    now_millis: i64,
) -> LocationResult<()> {
    reject_invalid(first)?;
    reject_invalid(second)?;
    reject_mocked(options, second)?;

    let distance = distance_between(first, second);
    match options.distance_tiers().classify(distance) {
        Tier::Within => {}
        Tier::Degraded => warn!("Readings {distance:.1} m apart, tolerated"),
        Tier::Exceeded => {
            return Err(LocationError::LocationInconsistency {
                distance_meters: distance,
            })
        }
    }

    let age = second.age_millis(now_millis);
    #[allow(clippy::cast_precision_loss)] // Ages are far below 2^52 ms.
    let stale = options.staleness_tiers().classify(age as f64).is_exceeded();
    if stale {
        return Err(LocationError::StaleData { age_millis: age });
    }

    Ok(())
}

/// Checks the single reading of the quick flow.
///
/// # Errors
///
/// - [`LocationError::Platform`] if the coordinates are not finite or out of
///   range.
/// - [`LocationError::MockedLocation`] if the platform flags the reading.
/// - [`LocationError::LowAccuracy`] if accuracy is worse than the quick limit.
pub fn check_quick_reading(options: &TrustOptions, sample: &PositionSample) -> LocationResult<()> {
    reject_invalid(sample)?;
    reject_mocked(options, sample)?;

    if options
        .quick_accuracy_tiers()
        .classify_opt(sample.accuracy_meters)
        .is_exceeded()
    {
        return Err(LocationError::LowAccuracy {
            accuracy_meters: sample.accuracy_meters.unwrap_or(f64::NAN),
        });
    }
    Ok(())
}

/// Speed used for the movement check.
///
/// The device-reported speed, raised to the speed implied by the jump from
/// `baseline` when that is higher. Spoofing tools tend to report zero speed
/// while teleporting. The implied speed ignores movement inside the two
/// accuracy circles.
fn effective_speed(sample: &PositionSample, baseline: Option<&PositionSample>) -> Option<f64> {
    let implied = baseline.and_then(|b| {
        let slack = b.accuracy_meters.unwrap_or(0.0) + sample.accuracy_meters.unwrap_or(0.0);
        implied_speed_with_slack(b, sample, slack)
    });
    match (sample.speed_meters_per_second, implied) {
        (Some(reported), Some(implied)) => Some(reported.max(implied)),
        (reported, implied) => reported.or(implied),
    }
}

/// Judges one watch update against the last accepted sample.
///
/// Anomalies counted, at most one each:
///
/// 1. Mocked reading (Android only), with a blocking alert.
/// 2. Accuracy worse than twice the accuracy threshold, no alert.
/// 3. Speed above the limit, with a blocking alert.
///
/// A sample with invalid coordinates counts as a single anomaly and is not
/// checked further.
#[must_use]
pub fn assess_sample(
    options: &TrustOptions,
    sample: &PositionSample,
    baseline: Option<&PositionSample>,
) -> SecurityReview {
    let mut assessment = SecurityAssessment::clean();
    let mut alerts = Vec::new();

    if !sample.has_valid_coordinates() {
        assessment.flag(INVALID_COORDINATES);
        return SecurityReview { assessment, alerts };
    }

    if options.platform.reports_mocked_locations() && sample.is_mocked {
        assessment.flag("Mocked location reported by the platform");
        alerts.push(UserAlert::FakeLocation);
    }

    if let Some(accuracy) = sample.accuracy_meters {
        if options.accuracy_tiers().classify(accuracy).is_exceeded() {
            assessment.flag(format!("Very low accuracy: {accuracy:.0} m"));
        }
    }

    if let Some(speed) = effective_speed(sample, baseline) {
        if options.speed_tiers().classify(speed).is_exceeded() {
            assessment.flag(format!("Abnormal speed: {speed:.1} m/s"));
            alerts.push(UserAlert::AbnormalMovement);
        }
    }

    SecurityReview { assessment, alerts }
}

/// Sends the warnings of an assessment to the log.
pub(crate) fn log_anomalies(assessment: &SecurityAssessment) {
    for warning in &assessment.warnings {
        warn!("Location anomaly: {warning}");
    }
}

/// Runs the acquisition flows against a [`PositionProvider`].
pub struct LocationTrustEvaluator<P, A, C> {
    provider: P,
    alerter: A,
    clock: C,
    options: TrustOptions,
    gps_alert_shown: AtomicBool,
}

impl<P, A, C> LocationTrustEvaluator<P, A, C>
where
    P: PositionProvider,
    A: Alerter,
    C: Clock,
{
    /// Creates an evaluator.
    #[must_use]
    pub const fn new(provider: P, alerter: A, clock: C, options: TrustOptions) -> Self {
        Self {
            provider,
            alerter,
            clock,
            options,
            gps_alert_shown: AtomicBool::new(false),
        }
    }

    /// Active options.
    #[must_use]
    pub const fn options(&self) -> &TrustOptions {
        &self.options
    }

    /// The underlying provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// The alert sink.
    #[must_use]
    pub const fn alerter(&self) -> &A {
        &self.alerter
    }

    /// Presents an alert through the configured sink.
    pub fn notify(&self, alert: UserAlert) {
        self.alerter.alert(alert);
    }

    /// Reads one position, converting platform failures.
    ///
    /// The first platform failure seen by this evaluator raises
    /// [`UserAlert::CheckGps`]; later ones are only returned.
    async fn read(&self, accuracy: PositionAccuracy) -> LocationResult<PositionSample> {
        let result = self
            .provider
            .current_position(accuracy)
            .await
            .and_then(|sample| reject_invalid(&sample).map(|()| sample));

        match result {
            Ok(sample) => {
                debug!(
                    "Reading ({:.5}, {:.5}) accuracy {:?} m",
                    sample.latitude, sample.longitude, sample.accuracy_meters
                );
                Ok(sample)
            }
            Err(LocationError::Platform(message)) => {
                warn!("Location provider failed: {message}");
                if !self.gps_alert_shown.swap(true, Ordering::SeqCst) {
                    self.alerter.alert(UserAlert::CheckGps);
                }
                Err(LocationError::Platform(message))
            }
            Err(other) => Err(other),
        }
    }

    /// Makes sure location can be read at all.
    ///
    /// A missing background permission is logged and otherwise ignored; it
    /// only degrades continuous tracking.
    ///
    /// # Errors
    ///
    /// - [`LocationError::ServicesDisabled`] if location services are off.
    /// - [`LocationError::PermissionDenied`] if foreground permission is refused.
    pub async fn ensure_location_ready(&self) -> LocationResult<()> {
        if !self.provider.services_enabled().await? {
            return Err(LocationError::ServicesDisabled);
        }
        if !self.provider.request_foreground_permission().await? {
            return Err(LocationError::PermissionDenied);
        }
        if !self.provider.request_background_permission().await? {
            info!("Background location permission not granted, tracking may be less accurate");
        }
        Ok(())
    }

    /// Takes two high-accuracy readings a fixed delay apart and accepts the
    /// second if they agree.
    ///
    /// Always performs exactly two reads unless the first one fails, and the
    /// second read never starts before `time_between_readings` has elapsed.
    ///
    /// # Errors
    ///
    /// See [`check_first_reading`] and [`check_reading_pair`]. Provider
    /// failures surface as [`LocationError::Platform`].
    pub async fn acquire_secure_location(&self) -> LocationResult<AcquiredLocation> {
        let first = self.read(PositionAccuracy::High).await?;
        check_first_reading(&self.options, &first)?;

        tokio::time::sleep(self.options.time_between_readings()).await;

        let second = self.read(PositionAccuracy::High).await?;
        check_reading_pair(&self.options, &first, &second, self.clock.now_millis())?;

        info!("Secure location verified");
        Ok(AcquiredLocation::verified(second))
    }

    /// Takes one balanced-accuracy reading with a looser accuracy limit.
    ///
    /// # Errors
    ///
    /// See [`check_quick_reading`]. Provider failures surface as
    /// [`LocationError::Platform`].
    pub async fn acquire_quick_location(&self) -> LocationResult<AcquiredLocation> {
        let sample = self.read(PositionAccuracy::Balanced).await?;
        check_quick_reading(&self.options, &sample)?;
        Ok(AcquiredLocation::verified(sample))
    }

    /// Full acquisition: readiness checks, quick attempt, secure fallback.
    ///
    /// The quick and secure attempts together are bounded by the acquisition
    /// timeout. When it expires and the options allow it, one more
    /// balanced reading (bounded by the same timeout) is returned unverified.
    ///
    /// # Errors
    ///
    /// Readiness errors, non-retryable quick-path errors, secure-path errors,
    /// or [`LocationError::Timeout`].
    pub async fn acquire_location(&self) -> LocationResult<AcquiredLocation> {
        self.ensure_location_ready().await?;

        let timeout = self.options.acquisition_timeout();
        let flow = async {
            match self.acquire_quick_location().await {
                Ok(location) => Ok(location),
                Err(err) if err.is_retryable() => {
                    debug!("Quick location rejected ({err}), falling back to secure flow");
                    self.acquire_secure_location().await
                }
                Err(err) => Err(err),
            }
        };

        match tokio::time::timeout(timeout, flow).await {
            Ok(result) => result,
            Err(_) if self.options.allow_unverified_fallback => {
                warn!("Location acquisition timed out, falling back to an unverified reading");
                let sample = tokio::time::timeout(timeout, self.read(PositionAccuracy::Balanced))
                    .await
                    .map_err(|_| LocationError::Timeout)??;
                Ok(AcquiredLocation::unverified(sample))
            }
            Err(_) => Err(LocationError::Timeout),
        }
    }

    /// Judges one watch update and presents the alerts it calls for.
    ///
    /// `baseline` is the last accepted sample; the caller owns the running
    /// totals and adds the returned alert count to them.
    pub fn validate_location_security(
        &self,
        sample: &PositionSample,
        baseline: Option<&PositionSample>,
    ) -> SecurityAssessment {
        let review = assess_sample(&self.options, sample, baseline);
        log_anomalies(&review.assessment);
        for alert in &review.alerts {
            self.alerter.alert(*alert);
        }
        review.assessment
    }
}
