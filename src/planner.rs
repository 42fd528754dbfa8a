//! Day planning on top of the prayer engine.
//!
//! `DayPlanner` binds a calculator to one location, one display zone and
//! one set of calculation settings, and answers the questions the CLI and
//! the watch loop ask repeatedly: the payload for a date, the schedule of
//! resolved events, the next event relative to "now" and the day/night
//! variant.
//!
//! The planner is built the way the CLI commands need it:
//!
//! ```no_run
//! use salahtime::geo::{LocationResolver, timezone_for_coordinate};
//! use salahtime::planner::{DayPlanner, PlannerSettings};
//! use salahtime::prayer::{MethodRegistry, PrayerCalculator};
//! use std::time::Duration;
//!
//! let fix = LocationResolver::new(Duration::from_secs(7)).resolve();
//! let tz = timezone_for_coordinate(fix.lat, fix.lon);
//! let planner = DayPlanner::new(PrayerCalculator::new(MethodRegistry::build()), fix, tz)
//!     .with_settings(PlannerSettings::default());
//! let status = planner.status(chrono::Utc::now());
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::common::constants::DEFAULT_METHOD;
use crate::error::SalahError;
use crate::geo::coordinate::GeoCoordinate;
use crate::geo::location::LocationFix;
use crate::prayer::calculator::{AdjustmentSet, PrayerCalculator, PrayerRequest};
use crate::prayer::method::{HighLatitudeRule, Madhab};
use crate::prayer::payload::{DailyPrayerPayload, PrayerResponse};
use crate::schedule::day_night::{ThemeDecision, decide_theme_or_retry};
use crate::schedule::next_event::{DaySchedule, NextEventStatus, next_event};

/// Calculation settings after every source (flags, config, stored
/// preferences) has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSettings {
    pub method: String,
    pub madhab: Madhab,
    /// Overrides the preset's own rule when set.
    pub high_latitude_rule: Option<HighLatitudeRule>,
    pub adjustments: AdjustmentSet,
    pub all_methods: bool,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            madhab: Madhab::default(),
            high_latitude_rule: None,
            adjustments: AdjustmentSet::default(),
            all_methods: false,
        }
    }
}

pub struct DayPlanner {
    calculator: PrayerCalculator,
    location: LocationFix,
    timezone: Tz,
    settings: PlannerSettings,
}

impl DayPlanner {
    pub fn new(calculator: PrayerCalculator, location: LocationFix, timezone: Tz) -> Self {
        Self {
            calculator,
            location,
            timezone,
            settings: PlannerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PlannerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn location(&self) -> &LocationFix {
        &self.location
    }

    pub fn timezone(&self) -> &Tz {
        &self.timezone
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    /// Calendar date at the location for an instant.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    pub fn request_for(&self, date: NaiveDate, now: DateTime<Utc>) -> PrayerRequest {
        PrayerRequest {
            location: self.location.clone(),
            date,
            timezone: self.timezone,
            method: self.settings.method.clone(),
            madhab: self.settings.madhab,
            high_latitude_rule: self.settings.high_latitude_rule,
            adjustments: self.settings.adjustments,
            all_methods: self.settings.all_methods,
            calculated_at: now,
        }
    }

    pub fn compute(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<DailyPrayerPayload, SalahError> {
        self.calculator.compute(&self.request_for(date, now))
    }

    /// Today's payload, or the error payload when the request fails.
    pub fn response(&self, now: DateTime<Utc>) -> PrayerResponse {
        self.compute(self.local_date(now), now).into()
    }

    /// Resolved events of `date` for the primary method.
    pub fn schedule_for(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<DaySchedule, SalahError> {
        let payload = self.compute(date, now)?;
        let (_, result) = payload
            .primary()
            .ok_or_else(|| SalahError::ComputationUnavailable {
                reason: "the payload holds no results".to_string(),
            })?;
        Ok(DaySchedule::from_result(date, result))
    }

    /// Next and previous event around `now`.
    ///
    /// Tomorrow is only computed once today has no event left. If that
    /// computation fails, the next event falls back to tomorrow morning.
    pub fn status(&self, now: DateTime<Utc>) -> Result<NextEventStatus, SalahError> {
        let today_date = self.local_date(now);
        let today = self.schedule_for(today_date, now)?;

        let tomorrow = if today.next_after(now).is_none() {
            match self.schedule_for(today_date + Duration::days(1), now) {
                Ok(schedule) => Some(schedule),
                Err(e) => {
                    log_warning!("Tomorrow's times are unavailable: {e}");
                    None
                }
            }
        } else {
            None
        };

        Ok(next_event(&today, tomorrow.as_ref(), now, &self.timezone))
    }

    /// Day/night variant from the sun at the location.
    ///
    /// A fallback location does not count as a known position, so it uses
    /// the fixed local split instead of London's sun.
    pub fn theme(&self, now: DateTime<Utc>) -> ThemeDecision {
        let coordinate = self.known_coordinate();
        decide_theme_or_retry(now, &self.timezone, coordinate.as_ref())
    }

    fn known_coordinate(&self) -> Option<GeoCoordinate> {
        if self.location.source.is_fallback() {
            None
        } else {
            Some(self.location.coordinate())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::location::LocationSource;
    use crate::prayer::calculator::PrayerKind;
    use crate::prayer::registry::MethodRegistry;
    use crate::schedule::day_night::{ThemeBasis, ThemeVariant};
    use crate::schedule::next_event::UpcomingEvent;
    use chrono::TimeZone;

    fn london(source: LocationSource) -> LocationFix {
        LocationFix {
            lat: 51.5074,
            lon: -0.1278,
            accuracy: None,
            label: "London".to_string(),
            source,
        }
    }

    fn planner(source: LocationSource) -> DayPlanner {
        DayPlanner::new(
            PrayerCalculator::new(MethodRegistry::build()),
            london(source),
            chrono_tz::Europe::London,
        )
        .with_settings(PlannerSettings {
            method: "MWL".to_string(),
            madhab: Madhab::Shafi,
            ..Default::default()
        })
    }

    #[test]
    fn test_local_date_follows_timezone() {
        let planner = DayPlanner::new(
            PrayerCalculator::new(MethodRegistry::build()),
            london(LocationSource::Configured),
            chrono_tz::Asia::Tokyo,
        );
        let now = Utc.with_ymd_and_hms(2024, 6, 21, 20, 0, 0).unwrap();
        assert_eq!(planner.local_date(now), NaiveDate::from_ymd_opt(2024, 6, 22).unwrap());
    }

    #[test]
    fn test_status_midday_points_at_asr() {
        let planner = planner(LocationSource::Configured);
        let now = Utc.with_ymd_and_hms(2024, 6, 21, 13, 0, 0).unwrap();
        let status = planner.status(now).unwrap();

        match &status.next {
            UpcomingEvent::Today(event) => assert_eq!(event.kind, PrayerKind::Asr),
            other => panic!("expected Asr today, got {other:?}"),
        }
        let previous = status.previous.unwrap();
        assert!(matches!(previous.kind, PrayerKind::Dhuhr | PrayerKind::Jummah));
        assert!(status.progress > 0.0 && status.progress < 1.0);
    }

    #[test]
    fn test_status_just_after_local_midnight() {
        let planner = planner(LocationSource::Configured);
        // 00:30 BST on the 22nd: the new day has started and nothing of it
        // has passed yet
        let now = Utc.with_ymd_and_hms(2024, 6, 21, 23, 30, 0).unwrap();
        let status = planner.status(now).unwrap();

        match &status.next {
            UpcomingEvent::Today(event) => {
                assert!(matches!(event.kind, PrayerKind::Fajr | PrayerKind::Sunrise))
            }
            other => panic!("expected an event today, got {other:?}"),
        }
        assert!(status.previous.is_none());
        assert_eq!(status.progress, 0.0);
        assert!(status.remaining > std::time::Duration::ZERO);
    }

    #[test]
    fn test_status_keeps_the_local_day_near_the_date_line() {
        let places = [
            (-13.8333, -171.7667, chrono_tz::Pacific::Apia),
            (-21.1394, -175.2018, chrono_tz::Pacific::Tongatapu),
        ];
        for (lat, lon, tz) in places {
            let location = LocationFix {
                lat,
                lon,
                accuracy: None,
                label: tz.name().to_string(),
                source: LocationSource::Configured,
            };
            let planner = DayPlanner::new(
                PrayerCalculator::new(MethodRegistry::build()),
                location,
                tz,
            )
            .with_settings(PlannerSettings {
                method: "MWL".to_string(),
                madhab: Madhab::Shafi,
                ..Default::default()
            });

            // 14:00 local on 18 June, both zones at UTC+13
            let now = Utc.with_ymd_and_hms(2024, 6, 18, 1, 0, 0).unwrap();
            let today = planner.local_date(now);
            assert_eq!(today, NaiveDate::from_ymd_opt(2024, 6, 18).unwrap());

            let status = planner.status(now).unwrap();
            match &status.next {
                UpcomingEvent::Today(event) => {
                    assert_eq!(event.kind, PrayerKind::Asr, "in {tz}");
                    assert_eq!(event.instant.with_timezone(&tz).date_naive(), today);
                }
                other => panic!("expected Asr today in {tz}, got {other:?}"),
            }
            let previous = status.previous.unwrap();
            assert_eq!(previous.kind, PrayerKind::Dhuhr);
            assert_eq!(previous.instant.with_timezone(&tz).date_naive(), today);

            assert_eq!(planner.theme(now).variant, ThemeVariant::Light);
        }
    }

    #[test]
    fn test_response_is_payload() {
        let planner = planner(LocationSource::Configured);
        let now = Utc.with_ymd_and_hms(2024, 6, 21, 9, 0, 0).unwrap();
        let response = planner.response(now);
        let payload = response.payload().unwrap();
        assert_eq!(payload.method_used.as_deref(), Some("MWL"));
        assert_eq!(payload.timezone, "Europe/London");
    }

    #[test]
    fn test_theme_uses_sun_for_known_location() {
        let now = Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();

        let known = planner(LocationSource::Configured).theme(now);
        assert_eq!(known.basis, ThemeBasis::Solar);
        assert_eq!(known.variant, ThemeVariant::Light);

        let fallback = planner(LocationSource::FallbackTimeout).theme(now);
        assert_eq!(fallback.basis, ThemeBasis::FixedSplit);
        assert_eq!(fallback.variant, ThemeVariant::Light);
    }

    #[test]
    fn test_empty_registry_fails_status() {
        let planner = DayPlanner::new(
            PrayerCalculator::new(MethodRegistry::build_from(&[])),
            london(LocationSource::Configured),
            chrono_tz::Europe::London,
        );
        let now = Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();
        assert!(matches!(
            planner.status(now),
            Err(SalahError::ComputationUnavailable { .. })
        ));
        assert!(planner.response(now).payload().is_none());
    }
}
