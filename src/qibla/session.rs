//! Compass session: sensor acquisition, fusion and teardown.
//!
//! A [`HeadingSession`] owns every sensor subscription it opens and the single
//! [`SmoothedHeading`] fed by them. Sources are tried in a fixed order when
//! the session opens and the first one that subscribes successfully is used
//! until the session closes:
//!
//! 1. the platform heading stream
//! 2. magnetometer plus accelerometer (tilt compensated)
//! 3. magnetometer alone (assumes the device is held flat)
//!
//! If none of them is available the session reports [`SessionState::BearingOnly`]
//! and callers show the static qibla bearing.
//!
//! Closing the session (explicitly or by dropping it) drops every
//! [`Subscription`], which runs the provider's unsubscribe hook before
//! `close` returns. Samples still queued in the channel are discarded with
//! the receiver.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::common::constants::{RAW_MAGNETOMETER_INTERVAL_MS, TILT_SENSOR_INTERVAL_MS};
use crate::error::SalahError;
use crate::qibla::bearing::{BearingDistance, circular_difference, is_aligned, normalize_degrees};
use crate::qibla::heading::{
    HeadingSample, HeadingSource, SmoothedHeading, Vector3, raw_magnetometer_heading,
    tilt_compensated_heading,
};

/// One sample delivered by a sensor stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorEvent {
    /// Degrees clockwise from north as reported by the platform.
    Heading { degrees: f64, accuracy: Option<f64> },
    Magnetometer(Vector3),
    Accelerometer(Vector3),
}

/// Handle for an active sensor stream.
///
/// The unsubscribe hook runs exactly once, on [`Subscription::cancel`] or on
/// drop, whichever comes first.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A subscription with nothing to release.
    pub fn detached() -> Self {
        Self { unsubscribe: None }
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// The three independent sensor stream providers.
///
/// Each call either returns a live subscription that pushes samples into
/// `sink`, or `SalahError::SensorUnavailable` when the stream (or permission
/// for it) is missing. Implementations must stop sending once the returned
/// subscription has been released.
pub trait SensorHub {
    fn subscribe_heading(&self, sink: Sender<SensorEvent>) -> Result<Subscription, SalahError>;

    fn subscribe_magnetometer(
        &self,
        interval: Duration,
        sink: Sender<SensorEvent>,
    ) -> Result<Subscription, SalahError>;

    fn subscribe_accelerometer(
        &self,
        interval: Duration,
        sink: Sender<SensorEvent>,
    ) -> Result<Subscription, SalahError>;
}

/// Lifecycle of a compass session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Inactive,
    AcquiringSource,
    Tracking(HeadingSource),
    /// No heading source could be opened; show the bearing only.
    BearingOnly,
}

impl SessionState {
    pub fn source(&self) -> HeadingSource {
        match self {
            SessionState::Tracking(source) => *source,
            _ => HeadingSource::None,
        }
    }
}

/// Everything the compass view needs to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QiblaReading {
    pub bearing_degrees: f64,
    pub distance_meters: f64,
    /// Smoothed heading; `None` until the first sample arrives.
    pub heading_degrees: Option<f64>,
    pub cumulative_heading: f64,
    /// Signed rotation from the heading to the qibla bearing.
    pub offset_degrees: Option<f64>,
    pub aligned: bool,
    pub source: &'static str,
    pub accuracy: Option<f64>,
}

pub struct HeadingSession {
    qibla: BearingDistance,
    state: SessionState,
    smoother: SmoothedHeading,
    has_sample: bool,
    accuracy: Option<f64>,
    last_magnetometer: Option<Vector3>,
    last_accelerometer: Option<Vector3>,
    subscriptions: Vec<Subscription>,
    receiver: Option<Receiver<SensorEvent>>,
}

impl HeadingSession {
    pub fn new(qibla: BearingDistance) -> Self {
        Self {
            qibla,
            state: SessionState::Inactive,
            smoother: SmoothedHeading::new(),
            has_sample: false,
            accuracy: None,
            last_magnetometer: None,
            last_accelerometer: None,
            subscriptions: Vec::new(),
            receiver: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    /// Start the session, acquiring the first available heading source.
    ///
    /// Any previous session state is torn down first.
    pub fn open(&mut self, hub: &dyn SensorHub) -> SessionState {
        self.close();
        self.state = SessionState::AcquiringSource;
        self.smoother.reset();

        let (sender, receiver) = mpsc::channel();
        self.receiver = Some(receiver);
        self.state = self.acquire(hub, sender);

        match self.state {
            SessionState::Tracking(source) => {
                log_debug!("Compass tracking via {}", source.name());
            }
            _ => {
                log_warning!("No heading sensor available; showing bearing only");
            }
        }
        self.state
    }

    fn acquire(&mut self, hub: &dyn SensorHub, sender: Sender<SensorEvent>) -> SessionState {
        match hub.subscribe_heading(sender.clone()) {
            Ok(subscription) => {
                self.subscriptions.push(subscription);
                return SessionState::Tracking(HeadingSource::GpsTrueHeading);
            }
            Err(e) => log_debug!("Heading stream: {e}"),
        }

        let tilt_interval = Duration::from_millis(TILT_SENSOR_INTERVAL_MS);
        let magnetometer = match hub.subscribe_magnetometer(tilt_interval, sender.clone()) {
            Ok(subscription) => subscription,
            Err(e) => {
                log_debug!("Magnetometer: {e}");
                return SessionState::BearingOnly;
            }
        };

        match hub.subscribe_accelerometer(tilt_interval, sender.clone()) {
            Ok(accelerometer) => {
                self.subscriptions.push(magnetometer);
                self.subscriptions.push(accelerometer);
                return SessionState::Tracking(HeadingSource::TiltCompensated);
            }
            Err(e) => log_debug!("Accelerometer: {e}"),
        }

        // Re-subscribe at the slower rate used for flat-device headings.
        magnetometer.cancel();
        let raw_interval = Duration::from_millis(RAW_MAGNETOMETER_INTERVAL_MS);
        match hub.subscribe_magnetometer(raw_interval, sender) {
            Ok(subscription) => {
                log_warning!("Tilt compensation unavailable; heading assumes a flat device");
                self.subscriptions.push(subscription);
                SessionState::Tracking(HeadingSource::RawMagnetometer)
            }
            Err(e) => {
                log_debug!("Magnetometer: {e}");
                SessionState::BearingOnly
            }
        }
    }

    /// Feed one event into the fusion. Events from a source other than the
    /// active one are ignored.
    pub fn handle_event(&mut self, event: SensorEvent) -> Option<HeadingSample> {
        let sample = match (self.state, event) {
            (
                SessionState::Tracking(HeadingSource::GpsTrueHeading),
                SensorEvent::Heading { degrees, accuracy },
            ) => degrees.is_finite().then(|| HeadingSample {
                degrees: normalize_degrees(degrees),
                source: HeadingSource::GpsTrueHeading,
                accuracy,
            }),
            (SessionState::Tracking(HeadingSource::TiltCompensated), SensorEvent::Magnetometer(m)) => {
                self.last_magnetometer = Some(m);
                self.tilt_sample()
            }
            (SessionState::Tracking(HeadingSource::TiltCompensated), SensorEvent::Accelerometer(a)) => {
                self.last_accelerometer = Some(a);
                self.tilt_sample()
            }
            (SessionState::Tracking(HeadingSource::RawMagnetometer), SensorEvent::Magnetometer(m)) => {
                Some(HeadingSample {
                    degrees: raw_magnetometer_heading(&m),
                    source: HeadingSource::RawMagnetometer,
                    accuracy: None,
                })
            }
            _ => None,
        }?;

        self.smoother.update(sample.degrees);
        self.has_sample = true;
        self.accuracy = sample.accuracy;
        Some(sample)
    }

    fn tilt_sample(&self) -> Option<HeadingSample> {
        let (Some(m), Some(a)) = (self.last_magnetometer, self.last_accelerometer) else {
            return None;
        };
        tilt_compensated_heading(&m, &a).map(|degrees| HeadingSample {
            degrees,
            source: HeadingSource::TiltCompensated,
            accuracy: None,
        })
    }

    /// Process every queued event without blocking. Returns how many produced
    /// a heading sample.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let event = match &self.receiver {
                Some(receiver) => match receiver.try_recv() {
                    Ok(event) => event,
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
                },
                None => break,
            };
            if self.handle_event(event).is_some() {
                applied += 1;
            }
        }
        applied
    }

    /// Block until the next usable sample or until `timeout` elapses.
    pub fn wait_next(&mut self, timeout: Duration) -> Option<HeadingSample> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let event = match self.receiver.as_ref()?.recv_timeout(remaining) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            };
            if let Some(sample) = self.handle_event(event) {
                return Some(sample);
            }
        }
    }

    /// Release every subscription and return to `Inactive`.
    pub fn close(&mut self) {
        let released = self.subscriptions.len();
        self.subscriptions.clear();
        self.receiver = None;
        self.last_magnetometer = None;
        self.last_accelerometer = None;
        self.accuracy = None;
        self.has_sample = false;
        if self.state != SessionState::Inactive {
            log_debug!("Compass session closed ({released} subscriptions released)");
        }
        self.state = SessionState::Inactive;
    }

    pub fn snapshot(&self) -> QiblaReading {
        let heading = self.has_sample.then_some(self.smoother.last_estimate);
        QiblaReading {
            bearing_degrees: self.qibla.bearing_degrees,
            distance_meters: self.qibla.distance_meters,
            heading_degrees: heading,
            cumulative_heading: self.smoother.cumulative_unwrapped,
            offset_degrees: heading.map(|h| circular_difference(self.qibla.bearing_degrees, h)),
            aligned: heading.is_some_and(|h| is_aligned(h, self.qibla.bearing_degrees)),
            source: self.state.source().name(),
            accuracy: self.accuracy,
        }
    }
}

impl Drop for HeadingSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Hub for hosts without live sensors: either one fixed heading (for example
/// typed on the command line) or nothing at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedHeadingHub {
    pub heading: Option<f64>,
}

impl FixedHeadingHub {
    pub fn new(heading: Option<f64>) -> Self {
        Self { heading }
    }
}

impl SensorHub for FixedHeadingHub {
    fn subscribe_heading(&self, sink: Sender<SensorEvent>) -> Result<Subscription, SalahError> {
        let degrees = self.heading.ok_or_else(|| SalahError::SensorUnavailable {
            sensor: "heading".to_string(),
        })?;
        // The receiver outlives this call, so the send cannot fail here.
        let _ = sink.send(SensorEvent::Heading {
            degrees,
            accuracy: None,
        });
        Ok(Subscription::detached())
    }

    fn subscribe_magnetometer(
        &self,
        _interval: Duration,
        _sink: Sender<SensorEvent>,
    ) -> Result<Subscription, SalahError> {
        Err(SalahError::SensorUnavailable {
            sensor: "magnetometer".to_string(),
        })
    }

    fn subscribe_accelerometer(
        &self,
        _interval: Duration,
        _sink: Sender<SensorEvent>,
    ) -> Result<Subscription, SalahError> {
        Err(SalahError::SensorUnavailable {
            sensor: "accelerometer".to_string(),
        })
    }
}
