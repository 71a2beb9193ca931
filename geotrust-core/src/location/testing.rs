//! In-memory stand-ins for the platform seams.
//!
//! Only compiled for tests or with the `test-utils` feature.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::time::Instant;

use super::error::{LocationError, LocationResult};
use super::options::WatchOptions;
use super::provider::{Alerter, Clock, PositionProvider, UserAlert};
use super::types::{PositionAccuracy, PositionSample};

/// A single `current_position` call seen by [`ScriptedProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRequest {
    /// Requested accuracy.
    pub accuracy: PositionAccuracy,
    /// Tokio instant of the call (follows a paused test clock).
    pub at: Instant,
}

/// Provider that replays scripted readings.
///
/// `current_position` pops the next scripted result; an exhausted script
/// yields a platform error. `watch_position` hands out the scripted watch
/// samples as a stream and tracks how many streams are still alive.
#[derive(Debug)]
pub struct ScriptedProvider {
    readings: RefCell<VecDeque<LocationResult<PositionSample>>>,
    watch_samples: RefCell<Vec<PositionSample>>,
    requests: RefCell<Vec<PositionRequest>>,
    active_watches: Rc<Cell<usize>>,
    services_enabled: Cell<bool>,
    foreground_granted: Cell<bool>,
    background_granted: Cell<bool>,
    hang_remaining: Cell<usize>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self {
            readings: RefCell::new(VecDeque::new()),
            watch_samples: RefCell::new(Vec::new()),
            requests: RefCell::new(Vec::new()),
            active_watches: Rc::new(Cell::new(0)),
            services_enabled: Cell::new(true),
            foreground_granted: Cell::new(true),
            background_granted: Cell::new(true),
            hang_remaining: Cell::new(0),
        }
    }
}

impl ScriptedProvider {
    /// Creates a provider with an empty script and every permission granted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider that answers `current_position` with `readings`.
    #[must_use]
    pub fn with_readings(readings: impl IntoIterator<Item = PositionSample>) -> Self {
        let provider = Self::new();
        for reading in readings {
            provider.push_reading(reading);
        }
        provider
    }

    /// Appends a successful reading.
    pub fn push_reading(&self, sample: PositionSample) {
        self.readings.borrow_mut().push_back(Ok(sample));
    }

    /// Appends a failing reading.
    pub fn push_error(&self, error: LocationError) {
        self.readings.borrow_mut().push_back(Err(error));
    }

    /// Sets the samples the next watch subscription will emit.
    pub fn set_watch_samples(&self, samples: Vec<PositionSample>) {
        *self.watch_samples.borrow_mut() = samples;
    }

    /// Makes the next `count` calls to `current_position` never resolve.
    pub fn hang_next(&self, count: usize) {
        self.hang_remaining.set(count);
    }

    /// Toggles the location services switch.
    pub fn set_services_enabled(&self, enabled: bool) {
        self.services_enabled.set(enabled);
    }

    /// Sets the answer to the foreground permission prompt.
    pub fn set_foreground_granted(&self, granted: bool) {
        self.foreground_granted.set(granted);
    }

    /// Sets the answer to the background permission prompt.
    pub fn set_background_granted(&self, granted: bool) {
        self.background_granted.set(granted);
    }

    /// Every `current_position` call so far.
    #[must_use]
    pub fn requests(&self) -> Vec<PositionRequest> {
        self.requests.borrow().clone()
    }

    /// Number of watch streams not yet dropped.
    #[must_use]
    pub fn active_watches(&self) -> usize {
        self.active_watches.get()
    }
}

impl PositionProvider for ScriptedProvider {
    type Watch = ScriptedWatch;

    async fn current_position(&self, accuracy: PositionAccuracy) -> LocationResult<PositionSample> {
        self.requests.borrow_mut().push(PositionRequest {
            accuracy,
            at: Instant::now(),
        });
        let hang = self.hang_remaining.get();
        if hang > 0 {
            self.hang_remaining.set(hang - 1);
            futures::future::pending::<()>().await;
        }
        self.readings
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(LocationError::Platform("no scripted reading".to_string())))
    }

    async fn watch_position(&self, _options: &WatchOptions) -> LocationResult<ScriptedWatch> {
        self.active_watches.set(self.active_watches.get() + 1);
        Ok(ScriptedWatch {
            samples: self.watch_samples.borrow_mut().drain(..).collect(),
            active: Rc::clone(&self.active_watches),
        })
    }

    async fn services_enabled(&self) -> LocationResult<bool> {
        Ok(self.services_enabled.get())
    }

    async fn request_foreground_permission(&self) -> LocationResult<bool> {
        Ok(self.foreground_granted.get())
    }

    async fn request_background_permission(&self) -> LocationResult<bool> {
        Ok(self.background_granted.get())
    }
}

/// Watch stream handed out by [`ScriptedProvider`].
#[derive(Debug)]
pub struct ScriptedWatch {
    samples: VecDeque<PositionSample>,
    active: Rc<Cell<usize>>,
}

impl Stream for ScriptedWatch {
    type Item = PositionSample;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.samples.pop_front())
    }
}

impl Drop for ScriptedWatch {
    fn drop(&mut self) {
        self.active.set(self.active.get().saturating_sub(1));
    }
}

/// Alerter that remembers what it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingAlerter {
    alerts: RefCell<Vec<UserAlert>>,
}

impl RecordingAlerter {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts shown so far, oldest first.
    #[must_use]
    pub fn alerts(&self) -> Vec<UserAlert> {
        self.alerts.borrow().clone()
    }

    /// How many times `alert` was shown.
    #[must_use]
    pub fn count(&self, alert: UserAlert) -> usize {
        self.alerts.borrow().iter().filter(|a| **a == alert).count()
    }
}

impl Alerter for RecordingAlerter {
    fn alert(&self, alert: UserAlert) {
        self.alerts.borrow_mut().push(alert);
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    /// Creates a clock set to `now_millis`.
    #[must_use]
    pub const fn at(now_millis: i64) -> Self {
        Self {
            now: Cell::new(now_millis),
        }
    }

    /// Moves the clock to `now_millis`.
    pub fn set(&self, now_millis: i64) {
        self.now.set(now_millis);
    }

    /// Moves the clock forward.
    pub fn advance(&self, millis: i64) {
        self.now.set(self.now.get() + millis);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.get()
    }
}
