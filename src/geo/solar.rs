//! Standalone sunrise/sunset model for the day/night switch.
//!
//! A low-order approximation of the solar position (mean anomaly, equation of
//! centre, ecliptic longitude) good to about a minute at mid latitudes. The
//! prayer engine carries its own higher-order model in `prayer::astronomy`;
//! this one only needs to answer "is the sun up".
//!
//! When the sun does not cross the −0.833° threshold on the given date
//! (midnight sun or polar night) both events are `None`. Callers treat that as
//! "cannot determine" and apply their own fallback policy.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::cmp::Ordering;

use crate::common::constants::{OBLIQUITY_DEGREES, SUN_ALTITUDE_RISE_SET_DEGREES};

/// Julian day of 2000-01-01 12:00 TT.
const J2000: f64 = 2_451_545.0;

/// `num_days_from_ce` of 2000-01-01.
const J2000_DAYS_FROM_CE: i32 = 730_120;

/// Orbital eccentricity used by the equation of time.
const ECCENTRICITY: f64 = 0.016_708_634;

/// Sunrise and sunset for one date. `None` means the event does not happen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunTimes {
    pub solar_noon: DateTime<Utc>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

/// Julian day at 00:00 UTC of the given date.
pub fn julian_day_at_midnight(date: NaiveDate) -> f64 {
    let days = (date.num_days_from_ce() - J2000_DAYS_FROM_CE) as f64;
    J2000 - 0.5 + days
}

/// Solar declination in degrees for a mean anomaly (degrees).
fn declination(mean_anomaly: f64) -> f64 {
    let m = mean_anomaly.to_radians();
    let center = 1.9148 * m.sin() + 0.0200 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin();
    let ecliptic_longitude = (mean_anomaly + center + 180.0 + 102.9372).rem_euclid(360.0);
    (ecliptic_longitude.to_radians().sin() * OBLIQUITY_DEGREES.to_radians().sin())
        .asin()
        .to_degrees()
}

/// Equation of time in minutes.
fn equation_of_time(jd: f64, mean_anomaly: f64) -> f64 {
    let m = mean_anomaly.to_radians();
    let centuries = (jd - J2000) / 36_525.0;
    let mean_longitude = (280.4665 + 36_000.7698 * centuries).rem_euclid(360.0).to_radians();
    let y = (OBLIQUITY_DEGREES.to_radians() / 2.0).tan().powi(2);
    let e = ECCENTRICITY;

    let radians = y * (2.0 * mean_longitude).sin() - 2.0 * e * m.sin()
        + 4.0 * e * y * m.sin() * (2.0 * mean_longitude).cos()
        - 0.5 * y * y * (4.0 * mean_longitude).sin()
        - 1.25 * e * e * (2.0 * m).sin();
    4.0 * radians.to_degrees()
}

/// Compute sunrise and sunset for `date` at the given coordinate.
///
/// Instants are absolute (UTC). Latitude and longitude are expected to be
/// in range; the caller validates through `GeoCoordinate`.
pub fn sun_times(date: NaiveDate, latitude: f64, longitude: f64) -> SunTimes {
    let jd = julian_day_at_midnight(date);
    let n = jd - J2000;
    let mean_solar_day = J2000 + n - longitude / 360.0;
    let mean_anomaly = (357.5291 + 0.985_600_28 * (mean_solar_day - J2000)).rem_euclid(360.0);

    let delta = declination(mean_anomaly).to_radians();
    let phi = latitude.to_radians();
    let cos_h = (SUN_ALTITUDE_RISE_SET_DEGREES.to_radians().sin() - phi.sin() * delta.sin())
        / (phi.cos() * delta.cos());

    let solar_noon_minutes = 720.0 - 4.0 * longitude - equation_of_time(jd, mean_anomaly);
    let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    let solar_noon = offset_minutes(midnight, solar_noon_minutes);

    if !cos_h.is_finite() || !(-1.0..=1.0).contains(&cos_h) {
        return SunTimes {
            solar_noon,
            sunrise: None,
            sunset: None,
        };
    }

    let hour_angle_minutes = 4.0 * cos_h.acos().to_degrees();

    SunTimes {
        solar_noon,
        sunrise: Some(offset_minutes(midnight, solar_noon_minutes - hour_angle_minutes)),
        sunset: Some(offset_minutes(midnight, solar_noon_minutes + hour_angle_minutes)),
    }
}

/// Sunrise and sunset of the local calendar day `date` in `tz`.
///
/// [`sun_times`] works on the UTC day. Near the date line that day's solar
/// noon can fall on the next or previous local date, so the UTC day is moved
/// until the local noon matches `date`.
pub fn sun_times_local(date: NaiveDate, latitude: f64, longitude: f64, tz: &Tz) -> SunTimes {
    let times = sun_times(date, latitude, longitude);
    let shift = match times.solar_noon.with_timezone(tz).date_naive().cmp(&date) {
        Ordering::Equal => return times,
        Ordering::Greater => -1,
        Ordering::Less => 1,
    };
    match date.checked_add_signed(Duration::days(shift)) {
        Some(anchor) => sun_times(anchor, latitude, longitude),
        None => times,
    }
}

fn offset_minutes(base: DateTime<Utc>, minutes: f64) -> DateTime<Utc> {
    base + Duration::milliseconds((minutes * 60_000.0).round() as i64)
}
