//! Light/dark variant driven by sunrise and sunset.
//!
//! Uses the standalone solar model rather than the prayer engine. Without a
//! location (or in polar day/night) the day is split at fixed local hours.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use std::fmt;

use crate::common::constants::{DEFAULT_EVENING_HOUR, DEFAULT_MORNING_HOUR, THEME_RETRY_MINUTES};
use crate::geo::coordinate::GeoCoordinate;
use crate::geo::solar::sun_times_local;
use crate::schedule::next_event::local_to_utc;

/// Grace added to every wake-up so the check runs just after the boundary.
const BOUNDARY_GRACE_SECONDS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Light,
    Dark,
}

impl fmt::Display for ThemeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl ThemeVariant {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Dark => "Dark",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Light => "󰖨 ",
            Self::Dark => " ",
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Self::Dark)
    }
}

/// What the boundaries of the decision were based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeBasis {
    Solar,
    FixedSplit,
    /// The computation failed; decided by the local hour and retried soon.
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeDecision {
    pub variant: ThemeVariant,
    pub basis: ThemeBasis,
    /// When to run the check again.
    pub next_check: DateTime<Utc>,
}

/// Decide the variant for `now` and when it next changes.
///
/// Dark from sunset until the next sunrise, light in between.
pub fn decide_theme(
    now: DateTime<Utc>,
    tz: &Tz,
    location: Option<&GeoCoordinate>,
) -> Result<ThemeDecision> {
    let today = now.with_timezone(tz).date_naive();

    let solar = location.and_then(|coordinate| {
        let times = sun_times_local(today, coordinate.latitude, coordinate.longitude, tz);
        times.sunrise.zip(times.sunset)
    });
    let (sunrise, sunset, basis) = match solar {
        Some((sunrise, sunset)) => (sunrise, sunset, ThemeBasis::Solar),
        None => {
            let (sunrise, sunset) = fixed_split(today, tz)?;
            (sunrise, sunset, ThemeBasis::FixedSplit)
        }
    };

    if sunset <= sunrise {
        anyhow::bail!("Sunset {sunset} does not follow sunrise {sunrise}");
    }

    let variant = if now >= sunset || now < sunrise {
        ThemeVariant::Dark
    } else {
        ThemeVariant::Light
    };

    let boundary = if now < sunrise {
        sunrise
    } else if now < sunset {
        sunset
    } else {
        let tomorrow = today + Duration::days(1);
        let sunrise = location
            .and_then(|c| sun_times_local(tomorrow, c.latitude, c.longitude, tz).sunrise);
        match sunrise {
            Some(sunrise) => sunrise,
            None => fixed_split(tomorrow, tz)?.0,
        }
    };

    Ok(ThemeDecision {
        variant,
        basis,
        next_check: boundary.max(now) + Duration::seconds(BOUNDARY_GRACE_SECONDS),
    })
}

/// Like [`decide_theme`], but never fails: errors fall back to the local
/// hour and a short retry.
pub fn decide_theme_or_retry(
    now: DateTime<Utc>,
    tz: &Tz,
    location: Option<&GeoCoordinate>,
) -> ThemeDecision {
    match decide_theme(now, tz, location) {
        Ok(decision) => decision,
        Err(e) => {
            log_warning!("Day/night check failed: {e}. Retrying in {THEME_RETRY_MINUTES} minutes");
            retry_decision(now, tz)
        }
    }
}

/// Hour-based variant with a wake-up after the retry delay.
pub fn retry_decision(now: DateTime<Utc>, tz: &Tz) -> ThemeDecision {
    let hour = now.with_timezone(tz).hour();
    let variant = if hour < DEFAULT_MORNING_HOUR || hour >= DEFAULT_EVENING_HOUR {
        ThemeVariant::Dark
    } else {
        ThemeVariant::Light
    };
    ThemeDecision {
        variant,
        basis: ThemeBasis::Retry,
        next_check: now + Duration::minutes(THEME_RETRY_MINUTES),
    }
}

fn fixed_split(date: NaiveDate, tz: &Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let morning = NaiveTime::from_hms_opt(DEFAULT_MORNING_HOUR, 0, 0)
        .context("Invalid default morning hour")?;
    let evening = NaiveTime::from_hms_opt(DEFAULT_EVENING_HOUR, 0, 0)
        .context("Invalid default evening hour")?;
    Ok((
        local_to_utc(tz, date.and_time(morning)),
        local_to_utc(tz, date.and_time(evening)),
    ))
}
