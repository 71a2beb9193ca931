//! Continuous location watching.
//!
//! A [`WatchSession`] owns one platform subscription and the
//! [`RunningSecurityState`] of the screen that started it:
//!
//! ```text
//! Idle ──start──▶ Watching ──stop / drop──▶ Stopped
//! ```
//!
//! Alert accumulation never changes the state. Once the cumulative count
//! passes [`RESTART_ALERT_THRESHOLD`](super::types::RESTART_ALERT_THRESHOLD)
//! the user is prompted once, and the counter only goes back to zero through
//! [`WatchSession::restart`].

use futures::StreamExt;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::distance::distance_between;
use super::error::{LocationError, LocationResult};
use super::evaluator::{assess_sample, log_anomalies, LocationTrustEvaluator};
use super::options::{TrustOptions, WatchOptions, MOVEMENT_EPSILON_METERS};
use super::provider::{Alerter, Clock, PositionProvider, UserAlert};
use super::types::{AcquiredLocation, PositionSample, RunningSecurityState, SecurityAssessment};

/// Lifecycle of a watch subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchStatus {
    /// No subscription yet.
    Idle,
    /// Subscription active.
    Watching,
    /// Subscription released.
    Stopped,
}

/// Outcome of feeding one update through a [`SecurityTracker`].
#[derive(Debug, Clone, PartialEq)]
pub struct WatchUpdate {
    /// The update itself.
    pub sample: PositionSample,

    /// `None` when the device did not move enough to be re-checked.
    pub assessment: Option<SecurityAssessment>,

    /// Alerts raised by this update, including the restart prompt.
    pub alerts: Vec<UserAlert>,

    /// Running total after this update.
    pub cumulative_alert_count: u32,

    /// Whether the session needs a fresh verification.
    pub restart_required: bool,
}

/// Running totals plus the once-per-crossing restart prompt.
#[derive(Debug, Clone, Default)]
pub struct SecurityTracker {
    state: RunningSecurityState,
    restart_prompted: bool,
}

impl SecurityTracker {
    /// Starts tracking from an optional verified baseline.
    #[must_use]
    pub fn new(baseline: Option<PositionSample>) -> Self {
        Self {
            state: baseline.map_or_else(RunningSecurityState::new, RunningSecurityState::with_baseline),
            restart_prompted: false,
        }
    }

    /// Current running state.
    #[must_use]
    pub const fn state(&self) -> &RunningSecurityState {
        &self.state
    }

    /// Clears the counter and installs a new baseline.
    pub fn reset(&mut self, baseline: Option<PositionSample>) {
        self.state.reset(baseline);
        self.restart_prompted = false;
    }

    /// Validates `sample` against the last accepted sample and folds the
    /// result into the running totals.
    ///
    /// Updates closer than [`MOVEMENT_EPSILON_METERS`] to the baseline are
    /// not assessed and leave the totals untouched. Anomalies are logged as
    /// warnings; samples with invalid coordinates are counted and never
    /// become the baseline.
    pub fn observe(&mut self, options: &TrustOptions, sample: PositionSample) -> WatchUpdate {
        let baseline = self.state.last_accepted_sample();
        let moved = baseline.map_or(f64::INFINITY, |b| distance_between(b, &sample));

        if moved < MOVEMENT_EPSILON_METERS {
            debug!("Skipping security check, moved {moved:.3} m");
            return WatchUpdate {
                sample,
                assessment: None,
                alerts: Vec::new(),
                cumulative_alert_count: self.state.cumulative_alert_count(),
                restart_required: self.state.restart_required(),
            };
        }

        let review = assess_sample(options, &sample, baseline);
        log_anomalies(&review.assessment);
        self.state.record(&review.assessment, &sample);

        let mut alerts = review.alerts;
        if self.state.restart_required() && !self.restart_prompted {
            info!(
                "{} location alerts accumulated, restart required",
                self.state.cumulative_alert_count()
            );
            alerts.push(UserAlert::RestartRequired);
            self.restart_prompted = true;
        }

        WatchUpdate {
            sample,
            assessment: Some(review.assessment),
            alerts,
            cumulative_alert_count: self.state.cumulative_alert_count(),
            restart_required: self.state.restart_required(),
        }
    }
}

enum Subscription<S> {
    Idle,
    Watching(S),
    Stopped,
}

/// A live location watch owned by one screen or session.
///
/// Dropping the session releases the subscription.
pub struct WatchSession<S> {
    subscription: Subscription<S>,
    tracker: SecurityTracker,
}

impl<S> WatchSession<S>
where
    S: futures::Stream<Item = PositionSample> + Unpin,
{
    /// Creates an idle session from a verified baseline.
    #[must_use]
    pub fn new(baseline: Option<PositionSample>) -> Self {
        Self {
            subscription: Subscription::Idle,
            tracker: SecurityTracker::new(baseline),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> WatchStatus {
        match self.subscription {
            Subscription::Idle => WatchStatus::Idle,
            Subscription::Watching(_) => WatchStatus::Watching,
            Subscription::Stopped => WatchStatus::Stopped,
        }
    }

    /// Returns whether the subscription has been released.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.subscription, Subscription::Stopped)
    }

    /// Running totals of this session.
    #[must_use]
    pub const fn state(&self) -> &RunningSecurityState {
        self.tracker.state()
    }

    /// Subscribes to position updates.
    ///
    /// # Errors
    ///
    /// - [`LocationError::InvalidState`] unless the session is idle.
    /// - Provider errors from opening the subscription.
    pub async fn start<P>(&mut self, provider: &P, options: &WatchOptions) -> LocationResult<()>
    where
        P: PositionProvider<Watch = S>,
    {
        match self.subscription {
            Subscription::Idle => {}
            Subscription::Watching(_) => {
                return Err(LocationError::InvalidState(
                    "watch already started".to_string(),
                ))
            }
            Subscription::Stopped => {
                return Err(LocationError::InvalidState(
                    "watch already stopped".to_string(),
                ))
            }
        }

        let stream = provider.watch_position(options).await?;
        self.subscription = Subscription::Watching(stream);
        info!("Location watch started");
        Ok(())
    }

    /// Waits for the next update and validates it.
    ///
    /// Alerts raised by the update are presented through the evaluator's
    /// alerter. Returns `Ok(None)` when the platform ends the stream.
    ///
    /// # Errors
    ///
    /// [`LocationError::InvalidState`] unless the session is watching.
    pub async fn next_update<P, A, C>(
        &mut self,
        evaluator: &LocationTrustEvaluator<P, A, C>,
    ) -> LocationResult<Option<WatchUpdate>>
    where
        P: PositionProvider,
        A: Alerter,
        C: Clock,
    {
        let Subscription::Watching(stream) = &mut self.subscription else {
            return Err(LocationError::InvalidState("watch not active".to_string()));
        };

        let Some(sample) = stream.next().await else {
            debug!("Location watch stream ended");
            return Ok(None);
        };

        let update = self.tracker.observe(evaluator.options(), sample);
        for alert in &update.alerts {
            evaluator.notify(*alert);
        }
        Ok(Some(update))
    }

    /// Re-verifies the location from scratch and resets the running totals.
    ///
    /// The totals are left alone when verification fails.
    ///
    /// # Errors
    ///
    /// Errors from [`LocationTrustEvaluator::acquire_secure_location`].
    pub async fn restart<P, A, C>(
        &mut self,
        evaluator: &LocationTrustEvaluator<P, A, C>,
    ) -> LocationResult<AcquiredLocation>
    where
        P: PositionProvider,
        A: Alerter,
        C: Clock,
    {
        let location = evaluator.acquire_secure_location().await?;
        self.tracker.reset(Some(location.sample.clone()));
        info!("Location re-verified, alert count reset");
        Ok(location)
    }

    /// Releases the subscription. Stopping twice is a no-op.
    pub fn stop(&mut self) {
        if matches!(self.subscription, Subscription::Watching(_)) {
            info!("Location watch stopped");
        }
        self.subscription = Subscription::Stopped;
    }
}
