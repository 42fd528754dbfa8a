//! Heading sources and the exponential smoother.
//!
//! Raw headings jitter by several degrees and wrap at 0/360. The smoother
//! blends each sample into the previous estimate along the shortest arc and
//! also tracks an unbounded "unwrapped" angle, so a rotating compass needle
//! turns 359° → 1° forward instead of spinning back through 180°.

use serde::{Deserialize, Serialize};

use crate::common::constants::HEADING_SMOOTHING_ALPHA;
use crate::qibla::bearing::{circular_difference, normalize_degrees};

/// A three-axis sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Which stream produced a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingSource {
    /// Platform heading from the location service.
    GpsTrueHeading,
    /// Magnetometer corrected for device tilt by the accelerometer.
    TiltCompensated,
    /// Magnetometer only; assumes the device is flat.
    RawMagnetometer,
    None,
}

impl HeadingSource {
    /// Short name shown next to the compass.
    pub fn name(&self) -> &'static str {
        match self {
            HeadingSource::GpsTrueHeading => "location",
            HeadingSource::TiltCompensated => "tilt-comp",
            HeadingSource::RawMagnetometer => "magnetometer",
            HeadingSource::None => "none",
        }
    }
}

/// One raw heading observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingSample {
    /// Degrees clockwise from north, in [0, 360).
    pub degrees: f64,
    pub source: HeadingSource,
    pub accuracy: Option<f64>,
}

/// Heading from a magnetometer vector rotated into the horizontal plane
/// using roll and pitch from the accelerometer.
///
/// `None` for a zero gravity vector, which carries no tilt information.
pub fn tilt_compensated_heading(magnetometer: &Vector3, accelerometer: &Vector3) -> Option<f64> {
    if accelerometer.norm() == 0.0 {
        return None;
    }

    let (ax, ay, az) = (accelerometer.x, accelerometer.y, accelerometer.z);
    let roll = ay.atan2(az);
    let pitch = (-ax).atan2((ay * ay + az * az).sqrt());

    let (mx, my, mz) = (magnetometer.x, magnetometer.y, magnetometer.z);
    let xh = mx * pitch.cos() + mz * pitch.sin();
    let yh = mx * roll.sin() * pitch.sin() + my * roll.cos() - mz * roll.sin() * pitch.cos();

    let heading = yh.atan2(xh).to_degrees();
    heading.is_finite().then(|| normalize_degrees(heading))
}

/// Heading from the magnetometer alone.
pub fn raw_magnetometer_heading(magnetometer: &Vector3) -> f64 {
    normalize_degrees(magnetometer.y.atan2(magnetometer.x).to_degrees())
}

/// Smoothed heading state for one viewing session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SmoothedHeading {
    /// Current estimate in [0, 360).
    pub last_estimate: f64,
    /// Sum of every applied rotation. Unbounded.
    pub cumulative_unwrapped: f64,
}

impl SmoothedHeading {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Blend a raw heading into the estimate and return the new estimate.
    pub fn update(&mut self, raw_degrees: f64) -> f64 {
        let normalized = normalize_degrees(raw_degrees);
        let diff = circular_difference(normalized, self.last_estimate);
        self.last_estimate =
            normalize_degrees(self.last_estimate + diff * (1.0 - HEADING_SMOOTHING_ALPHA));
        self.cumulative_unwrapped += diff;
        self.last_estimate
    }
}
