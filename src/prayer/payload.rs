//! JSON shapes exchanged with the widget file and the CLI.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::common::constants::UNRESOLVED_PLACEHOLDER;
use crate::error::SalahError;
use crate::geo::location::LocationFix;
use crate::prayer::calculator::{AdjustmentSet, PrayerKind};
use crate::prayer::method::Madhab;
use crate::prayer::registry::MethodSelection;

/// One set of instants (raw or adjusted). `None` serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrayerInstants {
    pub fajr: Option<DateTime<Utc>>,
    pub sunrise: Option<DateTime<Utc>>,
    pub dhuhr: Option<DateTime<Utc>>,
    pub asr: Option<DateTime<Utc>>,
    pub maghrib: Option<DateTime<Utc>>,
    pub isha: Option<DateTime<Utc>>,
    pub next_sunrise: Option<DateTime<Utc>>,
    pub midnight: Option<DateTime<Utc>>,
    pub qiyam: Option<DateTime<Utc>>,
    /// Present on Fridays only; always equal to `dhuhr`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub jummah: Option<DateTime<Utc>>,
}

impl PrayerInstants {
    pub fn get(&self, kind: PrayerKind) -> Option<DateTime<Utc>> {
        match kind {
            PrayerKind::Fajr => self.fajr,
            PrayerKind::Sunrise => self.sunrise,
            PrayerKind::Dhuhr => self.dhuhr,
            PrayerKind::Jummah => self.jummah,
            PrayerKind::Asr => self.asr,
            PrayerKind::Maghrib => self.maghrib,
            PrayerKind::Isha => self.isha,
            PrayerKind::Midnight => self.midnight,
            PrayerKind::Qiyam => self.qiyam,
        }
    }
}

/// Short local time strings (`HH:MM`), `—` where unresolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayTimes {
    pub fajr: String,
    pub sunrise: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
    pub midnight: String,
    pub qiyam: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub jummah: Option<String>,
}

impl DisplayTimes {
    pub fn from_instants(instants: &PrayerInstants, tz: &Tz) -> Self {
        Self {
            fajr: format_time(instants.fajr, tz),
            sunrise: format_time(instants.sunrise, tz),
            dhuhr: format_time(instants.dhuhr, tz),
            asr: format_time(instants.asr, tz),
            maghrib: format_time(instants.maghrib, tz),
            isha: format_time(instants.isha, tz),
            midnight: format_time(instants.midnight, tz),
            qiyam: format_time(instants.qiyam, tz),
            jummah: instants.jummah.map(|t| format_time(Some(t), tz)),
        }
    }

    pub fn get(&self, kind: PrayerKind) -> &str {
        match kind {
            PrayerKind::Fajr => &self.fajr,
            PrayerKind::Sunrise => &self.sunrise,
            PrayerKind::Dhuhr => &self.dhuhr,
            PrayerKind::Jummah => self.jummah.as_deref().unwrap_or(UNRESOLVED_PLACEHOLDER),
            PrayerKind::Asr => &self.asr,
            PrayerKind::Maghrib => &self.maghrib,
            PrayerKind::Isha => &self.isha,
            PrayerKind::Midnight => &self.midnight,
            PrayerKind::Qiyam => &self.qiyam,
        }
    }
}

/// Format an instant as `HH:MM` in `tz`.
pub fn format_time(instant: Option<DateTime<Utc>>, tz: &Tz) -> String {
    match instant {
        Some(t) => t.with_timezone(tz).format("%H:%M").to_string(),
        None => UNRESOLVED_PLACEHOLDER.to_string(),
    }
}

/// Everything computed for one method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodResult {
    pub raw: PrayerInstants,
    pub adjusted: PrayerInstants,
    pub times: DisplayTimes,
}

impl MethodResult {
    /// Rows in display order for the given date.
    pub fn rows(&self, is_friday: bool) -> Vec<DisplayRow> {
        PrayerKind::day_order(is_friday)
            .into_iter()
            .map(|kind| DisplayRow {
                kind,
                label: kind.label(),
                time: self.times.get(kind).to_string(),
                instant: self.adjusted.get(kind),
            })
            .collect()
    }
}

/// A labelled, formatted row as shown in lists and share text.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub kind: PrayerKind,
    pub label: &'static str,
    pub time: String,
    pub instant: Option<DateTime<Utc>>,
}

/// Plain-text rendering: a title line, a blank line, then one padded row per event.
pub fn share_text(date: NaiveDate, rows: &[DisplayRow]) -> String {
    let mut lines = vec![format!("Prayer times ({})", date.format("%Y-%m-%d")), String::new()];
    lines.extend(rows.iter().map(|row| format!("{:<12} {}", row.label, row.time)));
    lines.join("\n")
}

/// The engine's output artifact for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPrayerPayload {
    pub location: LocationFix,
    pub calculated_at: DateTime<Utc>,
    pub date: NaiveDate,
    pub timezone: String,
    pub method_requested: String,
    /// `None` when every method was computed.
    pub method_used: Option<String>,
    pub method_selection: Option<MethodSelection>,
    pub madhab: Madhab,
    pub requested_adjustments: AdjustmentSet,
    /// Keyed by the name of the method that produced the result. After a
    /// fallback that is `methodUsed`, not `methodRequested`, so readers
    /// expecting the requested key must look up `methodUsed` instead.
    pub results: BTreeMap<String, MethodResult>,
}

impl DailyPrayerPayload {
    /// The result for the method actually used, or the first one when all
    /// methods were computed.
    pub fn primary(&self) -> Option<(&str, &MethodResult)> {
        if let Some(used) = &self.method_used
            && let Some(result) = self.results.get(used)
        {
            return Some((used.as_str(), result));
        }
        if let Some(result) = self.results.get(&self.method_requested) {
            return Some((self.method_requested.as_str(), result));
        }
        self.results
            .iter()
            .next()
            .map(|(name, result)| (name.as_str(), result))
    }
}

/// Error shape written in place of a payload when a request fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: bool,
    pub message: String,
    pub details: String,
}

impl ErrorPayload {
    pub fn from_error(err: &SalahError) -> Self {
        Self {
            error: true,
            message: "Failed to calculate prayer times".to_string(),
            details: err.to_string(),
        }
    }
}

/// Either a complete payload or an explicit error; never nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrayerResponse {
    Error(ErrorPayload),
    Payload(Box<DailyPrayerPayload>),
}

impl From<Result<DailyPrayerPayload, SalahError>> for PrayerResponse {
    fn from(result: Result<DailyPrayerPayload, SalahError>) -> Self {
        match result {
            Ok(payload) => PrayerResponse::Payload(Box::new(payload)),
            Err(err) => PrayerResponse::Error(ErrorPayload::from_error(&err)),
        }
    }
}

impl PrayerResponse {
    pub fn payload(&self) -> Option<&DailyPrayerPayload> {
        match self {
            PrayerResponse::Payload(payload) => Some(payload),
            PrayerResponse::Error(_) => None,
        }
    }
}
