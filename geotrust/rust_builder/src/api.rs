//! API bridging layer that exposes geotrust-core to the Flutter shell.
//!
//! The shell reads positions through the platform plugins, pushes them in
//! here and shows whatever alerts come back.

use flutter_rust_bridge::frb;
use log::warn;

pub use geotrust_core::location::{Platform, UserAlert};
use geotrust_core::location::{
    AcquiredLocation, CheckInLocation, LocationError, PositionSample, TrustOptions, WatchUpdate,
};

/// One reading as delivered by the platform plugin.
#[derive(Debug, Clone, Copy)]
pub struct Reading {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
    pub speed_meters_per_second: Option<f64>,
    pub timestamp_millis: i64,
    pub is_mocked: bool,
}

impl From<Reading> for PositionSample {
    fn from(r: Reading) -> Self {
        Self {
            latitude: r.latitude,
            longitude: r.longitude,
            accuracy_meters: r.accuracy_meters,
            speed_meters_per_second: r.speed_meters_per_second,
            timestamp_millis: r.timestamp_millis,
            is_mocked: r.is_mocked,
        }
    }
}

/// Result of an acquisition check.
#[derive(Debug, Clone)]
pub struct Verification {
    /// Whether the location passed every check.
    pub verified: bool,
    /// User-facing reason when it did not.
    pub error: Option<String>,
    /// Whether retrying the acquisition may help.
    pub retryable: bool,
    /// Rounded coordinates for a check-in, present when verified.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Verification {
    fn from_result(result: Result<AcquiredLocation, LocationError>) -> Self {
        match result {
            Ok(location) => {
                let check_in = CheckInLocation::from_acquired(&location);
                Self {
                    verified: location.verified,
                    error: None,
                    retryable: false,
                    latitude: Some(check_in.latitude),
                    longitude: Some(check_in.longitude),
                }
            }
            Err(e) => {
                warn!("Location rejected: {e}");
                Self {
                    verified: false,
                    retryable: e.is_retryable(),
                    error: Some(e.to_string()),
                    latitude: None,
                    longitude: None,
                }
            }
        }
    }
}

/// Outcome of one watch update.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// Whether the update was checked at all.
    pub assessed: bool,
    /// Whether it passed.
    pub is_valid: bool,
    /// Anomalies found in this update.
    pub alert_count: u32,
    /// Running total for the session.
    pub cumulative_alert_count: u32,
    /// Whether the user must re-verify.
    pub restart_required: bool,
    /// Alerts the shell should show, in order.
    pub alerts: Vec<UserAlert>,
    /// Log-style descriptions of the anomalies.
    pub warnings: Vec<String>,
}

impl From<WatchUpdate> for UpdateOutcome {
    fn from(update: WatchUpdate) -> Self {
        let (assessed, is_valid, alert_count, warnings) = match update.assessment {
            Some(a) => (true, a.is_valid, a.alert_count, a.warnings),
            None => (false, true, 0, Vec::new()),
        };
        Self {
            assessed,
            is_valid,
            alert_count,
            cumulative_alert_count: update.cumulative_alert_count,
            restart_required: update.restart_required,
            alerts: update.alerts,
            warnings,
        }
    }
}

/// Core interface for GeoTrust functionality (wrapper around geotrust-core).
#[derive(Debug, Default)]
#[frb(opaque)]
pub struct GeoTrustCore {
    inner: geotrust_core::GeoTrustCore,
}

impl GeoTrustCore {
    /// Creates a core with default options for `platform`.
    #[must_use]
    #[frb(sync)]
    pub fn new(platform: Platform) -> Self {
        let options = TrustOptions::for_platform(platform);
        let mut inner = geotrust_core::GeoTrustCore::new();
        // Platform defaults always validate.
        if let Err(e) = inner.set_options(options) {
            warn!("Falling back to default options: {e}");
        }
        Self { inner }
    }

    /// Checks two high-accuracy readings taken a short delay apart.
    #[frb(sync)]
    pub fn verify_reading_pair(&self, first: Reading, second: Reading, now_millis: i64) -> Verification {
        Verification::from_result(self.inner.verify_reading_pair(
            &first.into(),
            second.into(),
            now_millis,
        ))
    }

    /// Checks a single balanced-accuracy reading.
    #[frb(sync)]
    pub fn verify_quick_reading(&self, reading: Reading) -> Verification {
        Verification::from_result(self.inner.verify_quick_reading(reading.into()))
    }

    /// Starts a watch session from the reading that was just verified.
    ///
    /// An unverified reading leaves the running session and its alert count
    /// untouched.
    #[frb(sync)]
    pub fn begin_session(&mut self, reading: Reading, verified: bool) {
        let sample = PositionSample::from(reading);
        let location = if verified {
            AcquiredLocation::verified(sample)
        } else {
            AcquiredLocation::unverified(sample)
        };
        self.inner.begin_session(&location);
    }

    /// Runs the anomaly checks on one watch update.
    #[frb(sync)]
    pub fn process_update(&mut self, reading: Reading) -> UpdateOutcome {
        self.inner.process_update(reading.into()).into()
    }

    /// Alerts accumulated since the session started.
    #[must_use]
    #[frb(sync)]
    pub fn cumulative_alert_count(&self) -> u32 {
        self.inner.cumulative_alert_count()
    }

    /// Whether the session needs a fresh verification.
    #[must_use]
    #[frb(sync)]
    pub fn restart_required(&self) -> bool {
        self.inner.restart_required()
    }

    /// Gets the active options as JSON.
    #[frb(sync)]
    pub fn options_json(&self) -> Result<String, String> {
        serde_json::to_string(self.inner.options()).map_err(|e| e.to_string())
    }

    /// Replaces the options from JSON. Missing fields take their defaults.
    #[frb(sync)]
    pub fn set_options_json(&mut self, json: String) -> Result<(), String> {
        let options = TrustOptions::from_json(&json).map_err(|e| e.to_string())?;
        self.inner.set_options(options).map_err(|e| e.to_string())
    }
}

/// Title of an alert dialog.
#[must_use]
#[frb(sync)]
pub fn alert_title(alert: UserAlert) -> String {
    alert.title().to_string()
}

/// Body of an alert dialog.
#[must_use]
#[frb(sync)]
pub fn alert_message(alert: UserAlert) -> String {
    alert.message().to_string()
}

/// Whether the alert blocks until dismissed.
#[must_use]
#[frb(sync)]
pub fn alert_is_blocking(alert: UserAlert) -> bool {
    alert.is_blocking()
}
