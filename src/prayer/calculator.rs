//! Full daily computation: method selection, raw and derived times, user
//! adjustments and display formatting.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::SalahError;
use crate::geo::coordinate::GeoCoordinate;
use crate::geo::location::LocationFix;
use crate::prayer::method::{CalculationParameters, HighLatitudeRule, Madhab};
use crate::prayer::payload::{DailyPrayerPayload, DisplayTimes, MethodResult, PrayerInstants};
use crate::prayer::registry::{MethodRegistry, MethodSelection};
use crate::prayer::times::PrayerTimes;

/// Every event the engine reports, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerKind {
    Fajr,
    Sunrise,
    Dhuhr,
    Jummah,
    Asr,
    Maghrib,
    Isha,
    Midnight,
    Qiyam,
}

impl PrayerKind {
    pub fn key(&self) -> &'static str {
        match self {
            PrayerKind::Fajr => "fajr",
            PrayerKind::Sunrise => "sunrise",
            PrayerKind::Dhuhr => "dhuhr",
            PrayerKind::Jummah => "jummah",
            PrayerKind::Asr => "asr",
            PrayerKind::Maghrib => "maghrib",
            PrayerKind::Isha => "isha",
            PrayerKind::Midnight => "midnight",
            PrayerKind::Qiyam => "qiyam",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrayerKind::Fajr => "Fajr",
            PrayerKind::Sunrise => "Sunrise",
            PrayerKind::Dhuhr => "Zuhr",
            PrayerKind::Jummah => "Jummah",
            PrayerKind::Asr => "Asr",
            PrayerKind::Maghrib => "Maghrib",
            PrayerKind::Isha => "Isha",
            PrayerKind::Midnight => "Midnight",
            PrayerKind::Qiyam => "Qiyam (last third)",
        }
    }

    /// Row order for a day. Jummah follows Dhuhr on Fridays only.
    pub fn day_order(is_friday: bool) -> Vec<PrayerKind> {
        let mut order = vec![
            PrayerKind::Fajr,
            PrayerKind::Sunrise,
            PrayerKind::Dhuhr,
            PrayerKind::Asr,
            PrayerKind::Maghrib,
            PrayerKind::Isha,
            PrayerKind::Midnight,
            PrayerKind::Qiyam,
        ];
        if is_friday {
            order.insert(3, PrayerKind::Jummah);
        }
        order
    }
}

impl FromStr for PrayerKind {
    type Err = SalahError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fajr" => Ok(PrayerKind::Fajr),
            "sunrise" => Ok(PrayerKind::Sunrise),
            "dhuhr" | "zuhr" => Ok(PrayerKind::Dhuhr),
            "jummah" => Ok(PrayerKind::Jummah),
            "asr" => Ok(PrayerKind::Asr),
            "maghrib" => Ok(PrayerKind::Maghrib),
            "isha" => Ok(PrayerKind::Isha),
            "midnight" => Ok(PrayerKind::Midnight),
            "qiyam" => Ok(PrayerKind::Qiyam),
            other => Err(SalahError::InvalidParameters {
                reason: format!("unknown prayer '{other}'"),
            }),
        }
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// User minute offsets per event. Missing keys deserialize as zero, so a
/// partially stored map merges over the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentSet {
    pub fajr: i64,
    pub sunrise: i64,
    pub dhuhr: i64,
    pub asr: i64,
    pub maghrib: i64,
    pub isha: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub midnight: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub qiyam: i64,
}

impl AdjustmentSet {
    /// Offset for an event. Jummah shares Dhuhr's.
    pub fn get(&self, kind: PrayerKind) -> i64 {
        match kind {
            PrayerKind::Fajr => self.fajr,
            PrayerKind::Sunrise => self.sunrise,
            PrayerKind::Dhuhr | PrayerKind::Jummah => self.dhuhr,
            PrayerKind::Asr => self.asr,
            PrayerKind::Maghrib => self.maghrib,
            PrayerKind::Isha => self.isha,
            PrayerKind::Midnight => self.midnight,
            PrayerKind::Qiyam => self.qiyam,
        }
    }

    pub fn set(&mut self, kind: PrayerKind, minutes: i64) {
        match kind {
            PrayerKind::Fajr => self.fajr = minutes,
            PrayerKind::Sunrise => self.sunrise = minutes,
            PrayerKind::Dhuhr | PrayerKind::Jummah => self.dhuhr = minutes,
            PrayerKind::Asr => self.asr = minutes,
            PrayerKind::Maghrib => self.maghrib = minutes,
            PrayerKind::Isha => self.isha = minutes,
            PrayerKind::Midnight => self.midnight = minutes,
            PrayerKind::Qiyam => self.qiyam = minutes,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PrayerKind, i64)> + '_ {
        PrayerKind::day_order(false)
            .into_iter()
            .map(|kind| (kind, self.get(kind)))
    }
}

/// Shift an instant by whole minutes. Absent instants stay absent.
pub fn adjust(instant: Option<DateTime<Utc>>, minutes: i64) -> Option<DateTime<Utc>> {
    instant.map(|t| t + Duration::minutes(minutes))
}

/// Midnight and the start of the last third, measured from Maghrib to the next sunrise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NightTimes {
    pub midnight: Option<DateTime<Utc>>,
    pub qiyam: Option<DateTime<Utc>>,
}

pub fn night_times(
    maghrib: Option<DateTime<Utc>>,
    next_sunrise: Option<DateTime<Utc>>,
) -> NightTimes {
    let (Some(maghrib), Some(next_sunrise)) = (maghrib, next_sunrise) else {
        return NightTimes {
            midnight: None,
            qiyam: None,
        };
    };

    let night_ms = (next_sunrise - maghrib).num_milliseconds();
    NightTimes {
        midnight: Some(maghrib + Duration::milliseconds(night_ms.div_euclid(2))),
        qiyam: Some(maghrib + Duration::milliseconds((2 * night_ms).div_euclid(3))),
    }
}

/// Inputs for one daily computation.
#[derive(Debug, Clone)]
pub struct PrayerRequest {
    pub location: LocationFix,
    /// Calendar date at the coordinate.
    pub date: NaiveDate,
    /// Zone used for the formatted strings.
    pub timezone: Tz,
    pub method: String,
    pub madhab: Madhab,
    /// Overrides the preset's rule when set.
    pub high_latitude_rule: Option<HighLatitudeRule>,
    pub adjustments: AdjustmentSet,
    /// Compute every registered method instead of the requested one.
    pub all_methods: bool,
    pub calculated_at: DateTime<Utc>,
}

/// Computes daily payloads against a method registry.
pub struct PrayerCalculator {
    registry: MethodRegistry,
}

impl PrayerCalculator {
    pub fn new(registry: MethodRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Compute the payload for a request.
    ///
    /// Polar conditions show up as `None` fields, not errors. Only an invalid
    /// coordinate or an empty registry fails the request.
    pub fn compute(&self, request: &PrayerRequest) -> Result<DailyPrayerPayload, SalahError> {
        let coordinate = GeoCoordinate::new(request.location.lat, request.location.lon)?;

        if self.registry.is_empty() {
            return Err(SalahError::ComputationUnavailable {
                reason: "no calculation methods available".to_string(),
            });
        }

        let mut results = BTreeMap::new();
        let mut selection = None;

        if request.all_methods {
            for params in self.registry.iter() {
                results.insert(
                    params.name.clone(),
                    compute_method(&coordinate, request, params),
                );
            }
        } else {
            let chosen = self.registry.select(&request.method)?;
            if let MethodSelection::Fallback { requested, used } = &chosen {
                log_pipe!();
                log_warning!("Method '{requested}' is unavailable, using '{used}'");
            }
            let params = self.registry.get(chosen.used()).ok_or_else(|| {
                SalahError::ComputationUnavailable {
                    reason: format!("method '{}' vanished from the registry", chosen.used()),
                }
            })?;
            results.insert(
                params.name.clone(),
                compute_method(&coordinate, request, params),
            );
            selection = Some(chosen);
        }

        Ok(DailyPrayerPayload {
            location: request.location.clone(),
            calculated_at: request.calculated_at,
            date: request.date,
            timezone: request.timezone.name().to_string(),
            method_requested: request.method.clone(),
            method_used: selection.as_ref().map(|s| s.used().to_string()),
            method_selection: selection,
            madhab: request.madhab,
            requested_adjustments: request.adjustments,
            results,
        })
    }
}

/// Raw, adjusted and formatted times for one method.
pub fn compute_method(
    coordinate: &GeoCoordinate,
    request: &PrayerRequest,
    params: &CalculationParameters,
) -> MethodResult {
    let mut params = params.clone().with_madhab(request.madhab);
    if let Some(rule) = request.high_latitude_rule {
        params = params.with_high_latitude_rule(rule);
    }

    let times = PrayerTimes::compute_local(coordinate, request.date, &request.timezone, &params);
    let night = night_times(times.maghrib, times.next_sunrise);
    let is_friday = request.date.weekday() == Weekday::Fri;

    let raw = PrayerInstants {
        fajr: times.fajr,
        sunrise: times.sunrise,
        dhuhr: times.dhuhr,
        asr: times.asr,
        maghrib: times.maghrib,
        isha: times.isha,
        next_sunrise: times.next_sunrise,
        midnight: night.midnight,
        qiyam: night.qiyam,
        jummah: if is_friday { times.dhuhr } else { None },
    };

    let adj = &request.adjustments;
    let adjusted = PrayerInstants {
        fajr: adjust(raw.fajr, adj.fajr),
        sunrise: adjust(raw.sunrise, adj.sunrise),
        dhuhr: adjust(raw.dhuhr, adj.dhuhr),
        asr: adjust(raw.asr, adj.asr),
        maghrib: adjust(raw.maghrib, adj.maghrib),
        isha: adjust(raw.isha, adj.isha),
        next_sunrise: adjust(raw.next_sunrise, adj.sunrise),
        midnight: adjust(raw.midnight, adj.midnight),
        qiyam: adjust(raw.qiyam, adj.qiyam),
        jummah: adjust(raw.jummah, adj.dhuhr),
    };

    let times = DisplayTimes::from_instants(&adjusted, &request.timezone);
    MethodResult {
        raw,
        adjusted,
        times,
    }
}
