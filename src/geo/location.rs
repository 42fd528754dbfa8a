//! Location acquisition with a bounded wait and a fixed fallback.
//!
//! The device location is an external collaborator behind [`LocationProvider`].
//! Resolution never fails: a configured coordinate wins outright, a device fix
//! is accepted if it arrives within the timeout, and anything else (no
//! provider, permission denied, timeout, provider error) resolves to the
//! fallback coordinate tagged with the reason.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use crate::common::constants::FALLBACK_LABEL;
use crate::error::SalahError;
use crate::geo::coordinate::GeoCoordinate;

/// Where the coordinate in a [`LocationFix`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Device,
    Configured,
    FallbackNoPermission,
    FallbackTimeout,
    FallbackError,
}

impl LocationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationSource::Device => "device",
            LocationSource::Configured => "configured",
            LocationSource::FallbackNoPermission => "fallback_no_permission",
            LocationSource::FallbackTimeout => "fallback_timeout",
            LocationSource::FallbackError => "fallback_error",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            LocationSource::FallbackNoPermission
                | LocationSource::FallbackTimeout
                | LocationSource::FallbackError
        )
    }
}

/// The location block carried by the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub accuracy: Option<f64>,
    pub label: String,
    pub source: LocationSource,
}

impl LocationFix {
    pub fn coordinate(&self) -> GeoCoordinate {
        GeoCoordinate {
            latitude: self.lat,
            longitude: self.lon,
        }
    }
}

/// A reading delivered by the device location provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceReading {
    pub coordinate: GeoCoordinate,
    /// Horizontal accuracy in metres, when reported.
    pub accuracy: Option<f64>,
}

/// Failure modes of a device location request.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationError {
    PermissionDenied,
    Timeout,
    Failed(String),
}

impl std::fmt::Display for LocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationError::PermissionDenied => write!(f, "location permission denied"),
            LocationError::Timeout => write!(f, "timed out waiting for a location fix"),
            LocationError::Failed(reason) => write!(f, "location request failed: {reason}"),
        }
    }
}

impl std::error::Error for LocationError {}

impl From<LocationError> for SalahError {
    fn from(err: LocationError) -> Self {
        SalahError::LocationUnavailable {
            reason: err.to_string(),
        }
    }
}

/// Device location collaborator.
#[cfg_attr(test, mockall::automock)]
pub trait LocationProvider: Send + Sync {
    /// Request the current coordinate. Implementations may block up to `timeout`.
    fn current_coordinate(&self, timeout: Duration) -> Result<DeviceReading, LocationError>;
}

/// Resolves the coordinate for a request.
pub struct LocationResolver {
    configured: Option<GeoCoordinate>,
    provider: Option<Arc<dyn LocationProvider>>,
    fallback: GeoCoordinate,
    timeout: Duration,
}

impl LocationResolver {
    pub fn new(timeout: Duration) -> Self {
        Self {
            configured: None,
            provider: None,
            fallback: GeoCoordinate::fallback(),
            timeout,
        }
    }

    /// Use a fixed coordinate instead of asking any provider.
    pub fn with_configured(mut self, coordinate: Option<GeoCoordinate>) -> Self {
        self.configured = coordinate;
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn LocationProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_fallback(mut self, fallback: GeoCoordinate) -> Self {
        self.fallback = fallback;
        self
    }

    /// Resolve a location. Never blocks longer than the configured timeout.
    pub fn resolve(&self) -> LocationFix {
        if let Some(coordinate) = self.configured {
            return LocationFix {
                lat: coordinate.latitude,
                lon: coordinate.longitude,
                accuracy: None,
                label: "Configured location".to_string(),
                source: LocationSource::Configured,
            };
        }

        let Some(provider) = &self.provider else {
            return self.fallback_fix(LocationSource::FallbackNoPermission);
        };

        match request_with_timeout(Arc::clone(provider), self.timeout) {
            Ok(reading) => LocationFix {
                lat: reading.coordinate.latitude,
                lon: reading.coordinate.longitude,
                accuracy: reading.accuracy,
                label: "Device location".to_string(),
                source: LocationSource::Device,
            },
            Err(err) => {
                let source = match err {
                    LocationError::PermissionDenied => LocationSource::FallbackNoPermission,
                    LocationError::Timeout => LocationSource::FallbackTimeout,
                    LocationError::Failed(_) => LocationSource::FallbackError,
                };
                log_pipe!();
                log_warning!("{}", SalahError::from(err));
                log_info!("Using fallback location: {}", self.fallback);
                self.fallback_fix(source)
            }
        }
    }

    fn fallback_fix(&self, source: LocationSource) -> LocationFix {
        LocationFix {
            lat: self.fallback.latitude,
            lon: self.fallback.longitude,
            accuracy: None,
            label: FALLBACK_LABEL.to_string(),
            source,
        }
    }
}

/// Run the provider on a worker thread and stop waiting after `timeout`.
///
/// A provider that ignores its timeout is abandoned, not joined; its late
/// answer goes to a dropped receiver.
fn request_with_timeout(
    provider: Arc<dyn LocationProvider>,
    timeout: Duration,
) -> Result<DeviceReading, LocationError> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(provider.current_coordinate(timeout));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            let reading = result?;
            // Reject readings that would break the coordinate invariant
            GeoCoordinate::new(reading.coordinate.latitude, reading.coordinate.longitude)
                .map_err(|e| LocationError::Failed(e.to_string()))?;
            Ok(reading)
        }
        Err(mpsc::RecvTimeoutError::Timeout) => Err(LocationError::Timeout),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(LocationError::Failed("provider thread exited".to_string()))
        }
    }
}
