//! Domain error taxonomy for the prayer and qibla engine.
//!
//! Most of these are absorbed where they occur (a missing method is dropped
//! from the registry, an unavailable sensor falls through to the next source,
//! a location timeout falls back to the default coordinate). Only
//! `ComputationUnavailable` and the validation variants reach a caller as a
//! failed request. Polar indeterminacy is never an error; it is `None`.

/// Errors produced by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SalahError {
    /// The location provider timed out, was denied, or failed.
    LocationUnavailable { reason: String },
    /// A single calculation preset could not be constructed.
    MethodUnavailable { method: String, reason: String },
    /// No calculation method could produce a result for the request.
    ComputationUnavailable { reason: String },
    /// A heading source could not be subscribed to.
    SensorUnavailable { sensor: String },
    /// Latitude or longitude outside the valid range.
    InvalidCoordinate { latitude: f64, longitude: f64 },
    /// Parameters rejected before any astronomy was attempted.
    InvalidParameters { reason: String },
}

impl std::fmt::Display for SalahError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SalahError::LocationUnavailable { reason } => {
                write!(f, "Location unavailable: {reason}")
            }
            SalahError::MethodUnavailable { method, reason } => {
                write!(f, "Calculation method '{method}' unavailable: {reason}")
            }
            SalahError::ComputationUnavailable { reason } => {
                write!(f, "Prayer times could not be computed: {reason}")
            }
            SalahError::SensorUnavailable { sensor } => {
                write!(f, "Sensor '{sensor}' unavailable")
            }
            SalahError::InvalidCoordinate {
                latitude,
                longitude,
            } => write!(
                f,
                "Invalid coordinate ({latitude}, {longitude}): latitude must be within [-90, 90] and longitude within [-180, 180]"
            ),
            SalahError::InvalidParameters { reason } => {
                write!(f, "Invalid calculation parameters: {reason}")
            }
        }
    }
}

impl std::error::Error for SalahError {}
