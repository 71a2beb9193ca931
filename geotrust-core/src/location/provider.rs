//! Seams to the platform: position source, user alerts and wall clock.
//!
//! The mobile shell implements [`PositionProvider`] and [`Alerter`] on top of
//! its location services and dialog APIs. The core never talks to hardware
//! or UI directly.

use std::future::Future;

use chrono::Utc;
use futures::Stream;
use log::warn;
use serde::{Deserialize, Serialize};

use super::error::LocationResult;
use super::options::WatchOptions;
use super::types::{PositionAccuracy, PositionSample};

/// Platform location services.
///
/// Implementations report hardware, driver and timeout failures as
/// [`LocationError::Platform`](super::LocationError::Platform).
pub trait PositionProvider {
    /// Stream of updates from a watch subscription.
    ///
    /// Dropping the stream cancels the subscription.
    type Watch: Stream<Item = PositionSample> + Unpin;

    /// Requests a single position.
    fn current_position(
        &self,
        accuracy: PositionAccuracy,
    ) -> impl Future<Output = LocationResult<PositionSample>>;

    /// Starts a continuous subscription.
    fn watch_position(
        &self,
        options: &WatchOptions,
    ) -> impl Future<Output = LocationResult<Self::Watch>>;

    /// Returns whether device location services are switched on.
    fn services_enabled(&self) -> impl Future<Output = LocationResult<bool>>;

    /// Asks for foreground permission; resolves to whether it was granted.
    fn request_foreground_permission(&self) -> impl Future<Output = LocationResult<bool>>;

    /// Asks for background permission; resolves to whether it was granted.
    fn request_background_permission(&self) -> impl Future<Output = LocationResult<bool>>;
}

/// A user-facing notification raised by a trust check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserAlert {
    /// The platform reported a mocked reading.
    FakeLocation,
    /// Movement faster than anyone on the ground could travel.
    AbnormalMovement,
    /// The location API failed; GPS may be off.
    CheckGps,
    /// Too many anomalies; location must be verified again.
    RestartRequired,
}

impl UserAlert {
    /// Returns whether the alert needs acknowledgement before the user can
    /// carry on.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        !matches!(self, Self::CheckGps)
    }

    /// Short title for the dialog.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::FakeLocation => "Fake location detected",
            Self::AbnormalMovement => "Abnormal movement detected",
            Self::CheckGps => "Location unavailable",
            Self::RestartRequired => "Restart required",
        }
    }

    /// Body text for the dialog.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::FakeLocation => "Your device reports a simulated location. Disable mock location apps to continue.",
            Self::AbnormalMovement => "Your location changed faster than is physically possible.",
            Self::CheckGps => "Could not read your location. Please check that GPS is enabled.",
            Self::RestartRequired => "Too many location anomalies were detected. Verify your location again to continue.",
        }
    }
}

/// Outbound channel for user-facing alerts.
pub trait Alerter {
    /// Presents an alert.
    fn alert(&self, alert: UserAlert);
}

/// Alerter that only writes to the log.
///
/// Used when the caller collects alerts from return values instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlerter;

impl Alerter for LogAlerter {
    fn alert(&self, alert: UserAlert) {
        warn!("{}: {}", alert.title(), alert.message());
    }
}

/// Wall-clock source in Unix milliseconds.
pub trait Clock {
    /// Current time in Unix milliseconds.
    fn now_millis(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
