//! Next and previous prayer relative to "now", countdown progress, and the
//! local-day boundary that forces a recompute.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use std::time::Duration as StdDuration;

use crate::common::constants::{DEFAULT_MORNING_HOUR, MIDNIGHT_GRACE_SECONDS};
use crate::prayer::calculator::PrayerKind;
use crate::prayer::payload::MethodResult;

/// One resolved event of a day.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub kind: PrayerKind,
    pub label: &'static str,
    pub time: String,
    pub instant: DateTime<Utc>,
}

/// The resolved events of one calendar day, in display order.
///
/// Display order is chronological except that midnight and qiyam may fall
/// after local midnight; they still belong to the day they were computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub events: Vec<ScheduledEvent>,
}

impl DaySchedule {
    /// Build from a computed result using the adjusted instants. Unresolved
    /// events are left out.
    pub fn from_result(date: NaiveDate, result: &MethodResult) -> Self {
        let is_friday = date.weekday() == Weekday::Fri;
        let events = result
            .rows(is_friday)
            .into_iter()
            .filter_map(|row| {
                row.instant.map(|instant| ScheduledEvent {
                    kind: row.kind,
                    label: row.label,
                    time: row.time,
                    instant,
                })
            })
            .collect();
        Self { date, events }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// First event in list order strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<&ScheduledEvent> {
        self.events.iter().find(|event| event.instant > now)
    }

    /// Latest event at or before `now`.
    pub fn previous(&self, now: DateTime<Utc>) -> Option<&ScheduledEvent> {
        self.events
            .iter()
            .filter(|event| event.instant <= now)
            .max_by_key(|event| event.instant)
    }

    /// Soonest event of the day.
    pub fn earliest(&self) -> Option<&ScheduledEvent> {
        self.events.iter().min_by_key(|event| event.instant)
    }
}

/// Where the next event came from.
#[derive(Debug, Clone, PartialEq)]
pub enum UpcomingEvent {
    Today(ScheduledEvent),
    /// Nothing left today; the soonest event of the following day.
    Tomorrow(ScheduledEvent),
    /// Nothing left today and no schedule for tomorrow.
    TomorrowMorning(DateTime<Utc>),
}

impl UpcomingEvent {
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            UpcomingEvent::Today(event) | UpcomingEvent::Tomorrow(event) => event.instant,
            UpcomingEvent::TomorrowMorning(instant) => *instant,
        }
    }

    pub fn event(&self) -> Option<&ScheduledEvent> {
        match self {
            UpcomingEvent::Today(event) | UpcomingEvent::Tomorrow(event) => Some(event),
            UpcomingEvent::TomorrowMorning(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.event().map(|event| event.label).unwrap_or("Morning")
    }
}

/// Snapshot of the countdown towards the next event.
#[derive(Debug, Clone, PartialEq)]
pub struct NextEventStatus {
    pub next: UpcomingEvent,
    pub previous: Option<ScheduledEvent>,
    pub remaining: StdDuration,
    /// Fraction of the interval between `previous` and `next` already elapsed.
    pub progress: f64,
}

/// Work out the next event for `now`.
///
/// `tomorrow` is the recomputed schedule for the following day; when it is
/// missing the fallback is 06:00 local tomorrow.
pub fn next_event(
    today: &DaySchedule,
    tomorrow: Option<&DaySchedule>,
    now: DateTime<Utc>,
    tz: &Tz,
) -> NextEventStatus {
    let next = if let Some(event) = today.next_after(now) {
        UpcomingEvent::Today(event.clone())
    } else if let Some(event) = tomorrow.and_then(|schedule| schedule.earliest()) {
        UpcomingEvent::Tomorrow(event.clone())
    } else {
        UpcomingEvent::TomorrowMorning(tomorrow_morning(now, tz))
    };

    let previous = today.previous(now).cloned();
    let progress = progress(previous.as_ref().map(|event| event.instant), Some(next.instant()), now);
    let remaining = (next.instant() - now).to_std().unwrap_or(StdDuration::ZERO);

    NextEventStatus {
        next,
        previous,
        remaining,
        progress,
    }
}

/// `clamp01((now − previous) / (next − previous))`, or 0 when either end is
/// missing or the interval is empty.
pub fn progress(
    previous: Option<DateTime<Utc>>,
    next: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let (Some(previous), Some(next)) = (previous, next) else {
        return 0.0;
    };
    let total = (next - previous).num_milliseconds();
    if total <= 0 {
        return 0.0;
    }
    let done = (now - previous).num_milliseconds();
    (done as f64 / total as f64).clamp(0.0, 1.0)
}

/// 06:00 local on the day after `now`.
pub fn tomorrow_morning(now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let tomorrow = now.with_timezone(tz).date_naive() + Duration::days(1);
    let morning = NaiveTime::from_hms_opt(DEFAULT_MORNING_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    local_to_utc(tz, tomorrow.and_time(morning))
}

/// When the daily recompute fires: the next local midnight plus a short grace.
pub fn next_midnight_rollover(now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let tomorrow = now.with_timezone(tz).date_naive() + Duration::days(1);
    local_to_utc(tz, tomorrow.and_time(NaiveTime::MIN)) + Duration::seconds(MIDNIGHT_GRACE_SECONDS)
}

/// Resolve a local wall-clock time to an instant.
///
/// Ambiguous times (clocks going back) take the earlier instant. Times inside
/// a gap (clocks going forward) move to the first valid instant after it.
pub fn local_to_utc(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    let mut candidate = local;
    for _ in 0..4 {
        if let Some(resolved) = tz.from_local_datetime(&candidate).earliest() {
            return resolved.with_timezone(&Utc);
        }
        candidate += Duration::minutes(30);
    }
    Utc.from_utc_datetime(&local)
}
