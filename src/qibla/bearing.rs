//! Great-circle bearing and distance, and circular angle arithmetic.

use serde::{Deserialize, Serialize};

use crate::common::constants::{
    ALIGNMENT_THRESHOLD_DEGREES, EARTH_RADIUS_METERS, QIBLA_LATITUDE, QIBLA_LONGITUDE,
};
use crate::geo::coordinate::GeoCoordinate;

/// The Kaaba, Makkah.
pub const QIBLA_TARGET: GeoCoordinate = GeoCoordinate {
    latitude: QIBLA_LATITUDE,
    longitude: QIBLA_LONGITUDE,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BearingDistance {
    /// Initial great-circle bearing, clockwise from true north, in [0, 360).
    pub bearing_degrees: f64,
    pub distance_meters: f64,
}

/// Forward azimuth and haversine distance from `from` to `to`.
///
/// Identical points give bearing 0 and distance 0.
pub fn bearing_and_distance(from: &GeoCoordinate, to: &GeoCoordinate) -> BearingDistance {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let delta_phi = phi2 - phi1;
    let delta_lambda = (to.longitude - from.longitude).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();
    let bearing = normalize_degrees(y.atan2(x).to_degrees());

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    BearingDistance {
        bearing_degrees: bearing,
        distance_meters: EARTH_RADIUS_METERS * c,
    }
}

/// Bearing and distance to the Kaaba.
pub fn qibla_from(from: &GeoCoordinate) -> BearingDistance {
    bearing_and_distance(from, &QIBLA_TARGET)
}

/// Wrap any angle into [0, 360).
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Signed shortest rotation from `b` to `a`, in (−180, 180].
pub fn circular_difference(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Whether a heading points at the target within the alignment threshold.
pub fn is_aligned(heading: f64, bearing: f64) -> bool {
    circular_difference(heading, bearing).abs() <= ALIGNMENT_THRESHOLD_DEGREES
}
