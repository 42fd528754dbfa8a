//! Solar position and hour-angle calculations for prayer times.
//!
//! Meeus-style low-precision solar coordinates (good to about 0.01°), evaluated
//! for the day and its two neighbours so transit and hour angles can be
//! interpolated across the day. All angles are in degrees; results of
//! [`SolarTime`] are fractional hours after 00:00 UTC of the date.

use chrono::{Datelike, NaiveDate};

use crate::common::constants::PRAYER_SUN_ALTITUDE_DEGREES;
use crate::geo::coordinate::GeoCoordinate;

// # Angle helpers

/// Wrap `value` into `[0, max)`.
pub fn normalize_to_scale(value: f64, max: f64) -> f64 {
    value - max * (value / max).floor()
}

/// Wrap an angle into `[0, 360)`.
pub fn unwind_angle(angle: f64) -> f64 {
    normalize_to_scale(angle, 360.0)
}

/// Bring an angle into `[-180, 180]` by whole turns.
pub fn quadrant_shift_angle(angle: f64) -> f64 {
    if (-180.0..=180.0).contains(&angle) {
        return angle;
    }
    angle - 360.0 * (angle / 360.0).round()
}

// # Julian dates

/// Julian day for a Gregorian calendar date plus fractional hours (UT).
pub fn julian_day(year: i32, month: u32, day: u32, hours: f64) -> f64 {
    let (y, m) = if month > 2 {
        (year as f64, month as f64)
    } else {
        ((year - 1) as f64, (month + 12) as f64)
    };
    let d = day as f64 + hours / 24.0;

    let a = (y / 100.0).trunc();
    let b = (2.0 - a + (a / 4.0).trunc()).trunc();

    let i0 = (365.25 * (y + 4716.0)).trunc();
    let i1 = (30.6001 * (m + 1.0)).trunc();

    i0 + i1 + d + b - 1524.5
}

/// Julian centuries since J2000.0.
pub fn julian_century(julian_day: f64) -> f64 {
    (julian_day - 2_451_545.0) / 36_525.0
}

// # Solar series

fn mean_solar_longitude(t: f64) -> f64 {
    unwind_angle(280.466_456_7 + 36_000.769_83 * t + 0.000_303_2 * t * t)
}

fn mean_lunar_longitude(t: f64) -> f64 {
    unwind_angle(218.3165 + 481_267.8813 * t)
}

fn ascending_lunar_node_longitude(t: f64) -> f64 {
    unwind_angle(125.044_52 - 1934.136_261 * t + 0.002_070_8 * t * t + t.powi(3) / 450_000.0)
}

fn mean_solar_anomaly(t: f64) -> f64 {
    unwind_angle(357.529_11 + 35_999.050_29 * t - 0.000_153_7 * t * t)
}

fn solar_equation_of_the_center(t: f64, mean_anomaly: f64) -> f64 {
    let m = mean_anomaly.to_radians();
    m.sin() * (1.914_602 - 0.004_817 * t - 0.000_014 * t * t)
        + (2.0 * m).sin() * (0.019_993 - 0.000_101 * t)
        + (3.0 * m).sin() * 0.000_289
}

fn apparent_solar_longitude(t: f64, mean_longitude: f64) -> f64 {
    let longitude = mean_longitude + solar_equation_of_the_center(t, mean_solar_anomaly(t));
    let omega = 125.04 - 1934.136 * t;
    unwind_angle(longitude - 0.005_69 - 0.004_78 * omega.to_radians().sin())
}

fn mean_obliquity_of_the_ecliptic(t: f64) -> f64 {
    23.439_291 - 0.013_004_167 * t - 0.000_000_163_9 * t * t + 0.000_000_503_6 * t.powi(3)
}

fn apparent_obliquity_of_the_ecliptic(t: f64, mean_obliquity: f64) -> f64 {
    let o = 125.04 - 1934.136 * t;
    mean_obliquity + 0.002_56 * o.to_radians().cos()
}

fn mean_sidereal_time(t: f64) -> f64 {
    let jd = t * 36_525.0 + 2_451_545.0;
    let theta = 280.460_618_37 + 360.985_647_366_29 * (jd - 2_451_545.0) + 0.000_387_933 * t * t
        - t.powi(3) / 38_710_000.0;
    unwind_angle(theta)
}

fn nutation_in_longitude(solar_longitude: f64, lunar_longitude: f64, node: f64) -> f64 {
    let l0 = solar_longitude.to_radians();
    let lp = lunar_longitude.to_radians();
    let omega = node.to_radians();
    (-17.2 / 3600.0) * omega.sin() - (1.32 / 3600.0) * (2.0 * l0).sin()
        - (0.23 / 3600.0) * (2.0 * lp).sin()
        + (0.21 / 3600.0) * (2.0 * omega).sin()
}

fn nutation_in_obliquity(solar_longitude: f64, lunar_longitude: f64, node: f64) -> f64 {
    let l0 = solar_longitude.to_radians();
    let lp = lunar_longitude.to_radians();
    let omega = node.to_radians();
    (9.2 / 3600.0) * omega.cos() + (0.57 / 3600.0) * (2.0 * l0).cos()
        + (0.10 / 3600.0) * (2.0 * lp).cos()
        - (0.09 / 3600.0) * (2.0 * omega).cos()
}

/// Altitude of a body with declination `declination` at local hour angle `hour_angle`.
pub fn altitude_of_celestial_body(latitude: f64, declination: f64, hour_angle: f64) -> f64 {
    let phi = latitude.to_radians();
    let delta = declination.to_radians();
    let h = hour_angle.to_radians();
    (phi.sin() * delta.sin() + phi.cos() * delta.cos() * h.cos())
        .asin()
        .to_degrees()
}

// # Interpolation

/// Second-order interpolation from the value `y2` and its neighbours `y1`, `y3`.
pub fn interpolate(y2: f64, y1: f64, y3: f64, n: f64) -> f64 {
    let a = y2 - y1;
    let b = y3 - y2;
    let c = b - a;
    y2 + (n / 2.0) * (a + b + n * c)
}

/// Like [`interpolate`] but for angles that may wrap at 360°.
pub fn interpolate_angles(y2: f64, y1: f64, y3: f64, n: f64) -> f64 {
    let a = unwind_angle(y2 - y1);
    let b = unwind_angle(y3 - y2);
    let c = b - a;
    y2 + (n / 2.0) * (a + b + n * c)
}

/// Sun position for a single Julian day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarCoordinates {
    pub declination: f64,
    pub right_ascension: f64,
    pub apparent_sidereal_time: f64,
}

impl SolarCoordinates {
    pub fn new(julian_day: f64) -> Self {
        let t = julian_century(julian_day);
        let l0 = mean_solar_longitude(t);
        let lp = mean_lunar_longitude(t);
        let omega = ascending_lunar_node_longitude(t);
        let lambda = apparent_solar_longitude(t, l0).to_radians();
        let theta0 = mean_sidereal_time(t);
        let delta_psi = nutation_in_longitude(l0, lp, omega);
        let delta_epsilon = nutation_in_obliquity(l0, lp, omega);
        let epsilon0 = mean_obliquity_of_the_ecliptic(t);
        let epsilon_apparent = apparent_obliquity_of_the_ecliptic(t, epsilon0).to_radians();

        let declination = (epsilon_apparent.sin() * lambda.sin()).asin().to_degrees();
        let right_ascension = unwind_angle(
            (epsilon_apparent.cos() * lambda.sin())
                .atan2(lambda.cos())
                .to_degrees(),
        );
        let apparent_sidereal_time = theta0
            + (delta_psi * 3600.0 * (epsilon0 + delta_epsilon).to_radians().cos()) / 3600.0;

        Self {
            declination,
            right_ascension,
            apparent_sidereal_time,
        }
    }
}

/// Fraction of a day at which the sun transits, before correction.
pub fn approximate_transit(longitude: f64, sidereal_time: f64, right_ascension: f64) -> f64 {
    let lw = -longitude;
    normalize_to_scale((right_ascension + lw - sidereal_time) / 360.0, 1.0)
}

/// Solar transit in hours after 00:00 UTC.
pub fn corrected_transit(
    approximate: f64,
    longitude: f64,
    today: &SolarCoordinates,
    yesterday: &SolarCoordinates,
    tomorrow: &SolarCoordinates,
) -> f64 {
    let lw = -longitude;
    let theta = unwind_angle(today.apparent_sidereal_time + 360.985_647 * approximate);
    let alpha = unwind_angle(interpolate_angles(
        today.right_ascension,
        yesterday.right_ascension,
        tomorrow.right_ascension,
        approximate,
    ));
    let hour_angle = quadrant_shift_angle(theta - lw - alpha);
    let delta_m = hour_angle / -360.0;
    (approximate + delta_m) * 24.0
}

/// Time in hours after 00:00 UTC at which the sun reaches `altitude`, either
/// before or after transit. `None` when the sun never reaches that altitude.
pub fn corrected_hour_angle(
    approximate: f64,
    altitude: f64,
    coordinate: &GeoCoordinate,
    after_transit: bool,
    today: &SolarCoordinates,
    yesterday: &SolarCoordinates,
    tomorrow: &SolarCoordinates,
) -> Option<f64> {
    let lw = -coordinate.longitude;
    let phi = coordinate.latitude.to_radians();
    let term1 = altitude.to_radians().sin() - phi.sin() * today.declination.to_radians().sin();
    let term2 = phi.cos() * today.declination.to_radians().cos();
    let cos_h0 = term1 / term2;
    if !cos_h0.is_finite() || cos_h0.abs() > 1.0 {
        return None;
    }

    let h0 = cos_h0.acos().to_degrees();
    let m = if after_transit {
        approximate + h0 / 360.0
    } else {
        approximate - h0 / 360.0
    };

    let theta = unwind_angle(today.apparent_sidereal_time + 360.985_647 * m);
    let alpha = unwind_angle(interpolate_angles(
        today.right_ascension,
        yesterday.right_ascension,
        tomorrow.right_ascension,
        m,
    ));
    let delta = interpolate(
        today.declination,
        yesterday.declination,
        tomorrow.declination,
        m,
    );
    let hour_angle = theta - lw - alpha;
    let h = altitude_of_celestial_body(coordinate.latitude, delta, hour_angle);
    let delta_m = (h - altitude)
        / (360.0
            * delta.to_radians().cos()
            * phi.cos()
            * hour_angle.to_radians().sin());

    let hours = (m + delta_m) * 24.0;
    hours.is_finite().then_some(hours)
}

/// Transit, sunrise and sunset for one date, plus arbitrary hour angles.
#[derive(Debug, Clone)]
pub struct SolarTime {
    coordinate: GeoCoordinate,
    approximate_transit: f64,
    today: SolarCoordinates,
    yesterday: SolarCoordinates,
    tomorrow: SolarCoordinates,
    pub transit: f64,
    pub sunrise: Option<f64>,
    pub sunset: Option<f64>,
}

impl SolarTime {
    pub fn new(date: NaiveDate, coordinate: &GeoCoordinate) -> Self {
        let jd = julian_day(date.year(), date.month(), date.day(), 0.0);
        let yesterday = SolarCoordinates::new(jd - 1.0);
        let today = SolarCoordinates::new(jd);
        let tomorrow = SolarCoordinates::new(jd + 1.0);

        let approximate = approximate_transit(
            coordinate.longitude,
            today.apparent_sidereal_time,
            today.right_ascension,
        );
        let transit = corrected_transit(
            approximate,
            coordinate.longitude,
            &today,
            &yesterday,
            &tomorrow,
        );

        let mut solar = Self {
            coordinate: *coordinate,
            approximate_transit: approximate,
            today,
            yesterday,
            tomorrow,
            transit,
            sunrise: None,
            sunset: None,
        };
        solar.sunrise = solar.hour_angle(PRAYER_SUN_ALTITUDE_DEGREES, false);
        solar.sunset = solar.hour_angle(PRAYER_SUN_ALTITUDE_DEGREES, true);
        solar
    }

    /// Hours after 00:00 UTC at which the sun is at `altitude` degrees.
    pub fn hour_angle(&self, altitude: f64, after_transit: bool) -> Option<f64> {
        corrected_hour_angle(
            self.approximate_transit,
            altitude,
            &self.coordinate,
            after_transit,
            &self.today,
            &self.yesterday,
            &self.tomorrow,
        )
    }

    /// Time at which an object's shadow is `shadow_length` times its height
    /// plus its noon shadow.
    pub fn afternoon(&self, shadow_length: f64) -> Option<f64> {
        let tangent = (self.coordinate.latitude - self.today.declination).abs();
        let inverse = shadow_length + tangent.to_radians().tan();
        let angle = (1.0 / inverse).atan().to_degrees();
        self.hour_angle(angle, true)
    }

    pub fn declination(&self) -> f64 {
        self.today.declination
    }
}
