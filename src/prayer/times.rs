//! The five daily prayers plus sunrise for one date and coordinate.
//!
//! Instants are UTC, rounded to the nearest minute after the method's own
//! offsets are applied. Any event the sun's geometry cannot produce on that
//! date (high-latitude summer, polar night) is `None`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::cmp::Ordering;

use crate::geo::coordinate::GeoCoordinate;
use crate::prayer::astronomy::SolarTime;
use crate::prayer::method::{CalculationParameters, IshaRule};

/// Latitude at and above which the Moonsighting Committee uses the 1/7 rule.
const MOONSIGHTING_SEVENTH_LATITUDE: f64 = 55.0;

/// Raw daily prayer instants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrayerTimes {
    pub fajr: Option<DateTime<Utc>>,
    pub sunrise: Option<DateTime<Utc>>,
    pub dhuhr: Option<DateTime<Utc>>,
    pub asr: Option<DateTime<Utc>>,
    pub maghrib: Option<DateTime<Utc>>,
    pub isha: Option<DateTime<Utc>>,
    /// Sunrise of the following date, the end of tonight.
    pub next_sunrise: Option<DateTime<Utc>>,
}

impl PrayerTimes {
    /// Compute the times of the local calendar day `date` in `tz`.
    ///
    /// [`PrayerTimes::compute`] anchors a date at 00:00 UTC. Where the zone
    /// offset and the longitude disagree by about a day (Samoa, Tonga, Line
    /// Islands) that UTC day holds the neighbouring local day's noon, so the
    /// anchor moves by one day until Dhuhr falls on `date` locally.
    pub fn compute_local(
        coordinate: &GeoCoordinate,
        date: NaiveDate,
        tz: &Tz,
        params: &CalculationParameters,
    ) -> Self {
        let times = Self::compute(coordinate, date, params);
        let Some(dhuhr) = times.dhuhr else {
            return times;
        };

        let shift = match dhuhr.with_timezone(tz).date_naive().cmp(&date) {
            Ordering::Equal => return times,
            Ordering::Greater => -1,
            Ordering::Less => 1,
        };
        match date.checked_add_signed(Duration::days(shift)) {
            Some(anchor) => Self::compute(coordinate, anchor, params),
            None => times,
        }
    }

    /// Compute the times around the UTC day `date`.
    pub fn compute(
        coordinate: &GeoCoordinate,
        date: NaiveDate,
        params: &CalculationParameters,
    ) -> Self {
        let solar = SolarTime::new(date, coordinate);
        let tomorrow_date = date.succ_opt().unwrap_or(date);
        let tomorrow = SolarTime::new(tomorrow_date, coordinate);

        let dhuhr = Some(hours_to_instant(date, solar.transit));
        let sunrise = solar.sunrise.map(|h| hours_to_instant(date, h));
        let sunset = solar.sunset.map(|h| hours_to_instant(date, h));
        let next_sunrise = tomorrow.sunrise.map(|h| hours_to_instant(tomorrow_date, h));

        let night = match (sunset, next_sunrise) {
            (Some(sunset), Some(next)) => Some(next - sunset),
            _ => None,
        };

        let asr = solar
            .afternoon(params.madhab.shadow_length())
            .map(|h| hours_to_instant(date, h));

        let fajr = fajr_time(&solar, date, coordinate, params, sunrise, night);
        let isha = isha_time(&solar, date, coordinate, params, sunset, night);

        let mut maghrib = sunset;
        if let Some(angle) = params.maghrib_angle
            && let Some(by_angle) = solar.hour_angle(-angle, true).map(|h| hours_to_instant(date, h))
            && let (Some(sunset), Some(isha)) = (sunset, isha)
            && sunset < by_angle
            && isha > by_angle
        {
            maghrib = Some(by_angle);
        }

        let offsets = &params.method_adjustments;
        Self {
            fajr: finish(fajr, offsets.fajr),
            sunrise: finish(sunrise, offsets.sunrise),
            dhuhr: finish(dhuhr, offsets.dhuhr),
            asr: finish(asr, offsets.asr),
            maghrib: finish(maghrib, offsets.maghrib),
            isha: finish(isha, offsets.isha),
            next_sunrise: finish(next_sunrise, offsets.sunrise),
        }
    }
}

fn fajr_time(
    solar: &SolarTime,
    date: NaiveDate,
    coordinate: &GeoCoordinate,
    params: &CalculationParameters,
    sunrise: Option<DateTime<Utc>>,
    night: Option<Duration>,
) -> Option<DateTime<Utc>> {
    let mut fajr = solar
        .hour_angle(-params.fajr_angle, false)
        .map(|h| hours_to_instant(date, h));

    if params.moonsighting
        && coordinate.latitude >= MOONSIGHTING_SEVENTH_LATITUDE
        && let (Some(sunrise), Some(night)) = (sunrise, night)
    {
        fajr = Some(sunrise - night / 7);
    }

    let safe = match (sunrise, night) {
        (Some(sunrise), _) if params.moonsighting => Some(season_adjusted_morning_twilight(
            coordinate.latitude,
            date,
            sunrise,
        )),
        (Some(sunrise), Some(night)) => {
            Some(sunrise - scale(night, params.night_portions().fajr))
        }
        _ => None,
    };

    match (fajr, safe) {
        (Some(fajr), Some(safe)) if safe > fajr => Some(safe),
        (None, safe) => safe,
        (fajr, _) => fajr,
    }
}

fn isha_time(
    solar: &SolarTime,
    date: NaiveDate,
    coordinate: &GeoCoordinate,
    params: &CalculationParameters,
    sunset: Option<DateTime<Utc>>,
    night: Option<Duration>,
) -> Option<DateTime<Utc>> {
    let angle = match params.isha {
        IshaRule::Interval(minutes) => return sunset.map(|s| s + Duration::minutes(minutes)),
        IshaRule::Angle(angle) => angle,
    };

    let mut isha = solar.hour_angle(-angle, true).map(|h| hours_to_instant(date, h));

    if params.moonsighting
        && coordinate.latitude >= MOONSIGHTING_SEVENTH_LATITUDE
        && let (Some(sunset), Some(night)) = (sunset, night)
    {
        isha = Some(sunset + night / 7);
    }

    let safe = match (sunset, night) {
        (Some(sunset), _) if params.moonsighting => Some(season_adjusted_evening_twilight(
            coordinate.latitude,
            date,
            sunset,
        )),
        (Some(sunset), Some(night)) => Some(sunset + scale(night, params.night_portions().isha)),
        _ => None,
    };

    match (isha, safe) {
        (Some(isha), Some(safe)) if safe < isha => Some(safe),
        (None, safe) => safe,
        (isha, _) => isha,
    }
}

/// Moonsighting Committee bound for Fajr: minutes before sunrise, varying
/// through the year with the latitude.
pub fn season_adjusted_morning_twilight(
    latitude: f64,
    date: NaiveDate,
    sunrise: DateTime<Utc>,
) -> DateTime<Utc> {
    let lat = latitude.abs();
    let a = 75.0 + 28.65 / 55.0 * lat;
    let b = 75.0 + 19.44 / 55.0 * lat;
    let c = 75.0 + 32.74 / 55.0 * lat;
    let d = 75.0 + 48.10 / 55.0 * lat;

    let minutes = seasonal_curve(days_since_solstice(date, latitude), a, b, c, d);
    sunrise - Duration::seconds((minutes * 60.0).round() as i64)
}

/// Moonsighting Committee bound for Isha (general shafaq): minutes after sunset.
pub fn season_adjusted_evening_twilight(
    latitude: f64,
    date: NaiveDate,
    sunset: DateTime<Utc>,
) -> DateTime<Utc> {
    let lat = latitude.abs();
    let a = 75.0 + 25.60 / 55.0 * lat;
    let b = 75.0 + 2.050 / 55.0 * lat;
    let c = 75.0 - 9.21 / 55.0 * lat;
    let d = 75.0 + 6.14 / 55.0 * lat;

    let minutes = seasonal_curve(days_since_solstice(date, latitude), a, b, c, d);
    sunset + Duration::seconds((minutes * 60.0).round() as i64)
}

/// Piecewise-linear curve through `a`..`d` over the days since the winter solstice.
fn seasonal_curve(dyy: f64, a: f64, b: f64, c: f64, d: f64) -> f64 {
    if dyy < 91.0 {
        a + (b - a) / 91.0 * dyy
    } else if dyy < 137.0 {
        b + (c - b) / 46.0 * (dyy - 91.0)
    } else if dyy < 183.0 {
        c + (d - c) / 46.0 * (dyy - 137.0)
    } else if dyy < 229.0 {
        d + (c - d) / 46.0 * (dyy - 183.0)
    } else if dyy < 275.0 {
        c + (b - c) / 46.0 * (dyy - 229.0)
    } else {
        b + (a - b) / 91.0 * (dyy - 275.0)
    }
}

/// Days since the local winter solstice (December in the north, June in the south).
pub fn days_since_solstice(date: NaiveDate, latitude: f64) -> f64 {
    let day_of_year = date.ordinal() as i64;
    let leap = date.leap_year();
    let days_in_year = if leap { 366 } else { 365 };

    let days = if latitude >= 0.0 {
        let days = day_of_year + 10;
        if days >= days_in_year {
            days - days_in_year
        } else {
            days
        }
    } else {
        let southern_offset = if leap { 173 } else { 172 };
        let days = day_of_year - southern_offset;
        if days < 0 { days + days_in_year } else { days }
    };
    days as f64
}

/// Convert fractional hours after 00:00 UTC of `date` to an instant, truncated
/// to the whole second.
pub fn hours_to_instant(date: NaiveDate, hours: f64) -> DateTime<Utc> {
    let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    midnight + Duration::seconds((hours * 3600.0).floor() as i64)
}

/// Round to the nearest minute; 30 seconds rounds up.
pub fn round_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    let seconds = instant.second() as i64;
    let offset = if seconds >= 30 { 60 - seconds } else { -seconds };
    let rounded = instant + Duration::seconds(offset);
    rounded.with_nanosecond(0).unwrap_or(rounded)
}

fn finish(instant: Option<DateTime<Utc>>, offset_minutes: i64) -> Option<DateTime<Utc>> {
    instant.map(|t| round_to_minute(t + Duration::minutes(offset_minutes)))
}

fn scale(duration: Duration, factor: f64) -> Duration {
    Duration::milliseconds((duration.num_milliseconds() as f64 * factor) as i64)
}
