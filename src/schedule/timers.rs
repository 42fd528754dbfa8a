//! One-shot wake-ups keyed by purpose.
//!
//! At most one timer per purpose is pending. Scheduling a purpose again
//! replaces the earlier deadline, so a refresh can never be queued twice.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration as StdDuration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerPurpose {
    /// The next prayer boundary was reached; recompute next/previous.
    PrayerRefresh,
    /// Local midnight passed; recompute the whole day.
    MidnightRollover,
    /// Sunrise or sunset passed, or a failed day/night check is retried.
    ThemeSwitch,
}

impl fmt::Display for TimerPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerPurpose::PrayerRefresh => write!(f, "prayer refresh"),
            TimerPurpose::MidnightRollover => write!(f, "midnight rollover"),
            TimerPurpose::ThemeSwitch => write!(f, "theme switch"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    pending: BTreeMap<TimerPurpose, DateTime<Utc>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `purpose` for `at`. Returns the deadline it replaced, if any.
    pub fn schedule(&mut self, purpose: TimerPurpose, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.pending.insert(purpose, at)
    }

    pub fn cancel(&mut self, purpose: TimerPurpose) -> Option<DateTime<Utc>> {
        self.pending.remove(&purpose)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn deadline(&self, purpose: TimerPurpose) -> Option<DateTime<Utc>> {
        self.pending.get(&purpose).copied()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The earliest pending timer. Ties go to the purpose declared first.
    pub fn next_due(&self) -> Option<(TimerPurpose, DateTime<Utc>)> {
        self.pending
            .iter()
            .min_by_key(|(purpose, at)| (**at, **purpose))
            .map(|(purpose, at)| (*purpose, *at))
    }

    /// How long to wait before the earliest timer fires. Zero when it is
    /// already due; `None` when nothing is pending.
    pub fn time_until_next(&self, now: DateTime<Utc>) -> Option<StdDuration> {
        self.next_due()
            .map(|(_, at)| (at - now).to_std().unwrap_or(StdDuration::ZERO))
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Vec<TimerPurpose> {
        let mut due: Vec<(DateTime<Utc>, TimerPurpose)> = self
            .pending
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(purpose, at)| (*at, *purpose))
            .collect();
        due.sort();
        for (_, purpose) in &due {
            self.pending.remove(purpose);
        }
        due.into_iter().map(|(_, purpose)| purpose).collect()
    }
}
