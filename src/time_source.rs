//! Time source abstraction for supporting both real and pinned time.
//!
//! The engine itself is pure: every computation takes `now` as an argument.
//! Only the CLI and the watch loop ask "what time is it", and they do it through
//! this module so a run can be pinned to a given instant (`--at`) and every log
//! line can show the pinned time.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

/// Global time source instance, defaults to RealTimeSource
static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current instant
    fn now(&self) -> DateTime<Utc>;

    /// Sleep for the specified duration (or pretend to)
    fn sleep(&self, duration: StdDuration);

    /// Check if this is a pinned/simulated time source
    fn is_simulated(&self) -> bool;
}

/// Real-time implementation that uses actual system time
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Pinned time source. `sleep` advances the pinned instant instead of blocking,
/// which lets the watch loop fast-forward through a day.
pub struct FixedTimeSource {
    current: Mutex<DateTime<Utc>>,
}

impl FixedTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Move the pinned instant forward.
    pub fn advance(&self, duration: StdDuration) {
        let step = ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::zero());
        if let Ok(mut guard) = self.current.lock() {
            *guard += step;
        }
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        self.current.lock().map(|guard| *guard).unwrap_or_else(|e| *e.into_inner())
    }

    fn sleep(&self, duration: StdDuration) {
        self.advance(duration);
        // Yield so log output keeps up with the fast-forward
        std::thread::sleep(StdDuration::from_millis(1));
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Initialize the global time source (call once at startup)
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

/// Check if the time source has been initialized
pub fn is_initialized() -> bool {
    TIME_SOURCE.get().is_some()
}

/// Get the current instant from the global time source
pub fn now() -> DateTime<Utc> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource)).now()
}

/// Sleep for the specified duration using the global time source
pub fn sleep(duration: StdDuration) {
    TIME_SOURCE
        .get_or_init(|| Arc::new(RealTimeSource))
        .sleep(duration)
}

/// Check if we're running with a pinned clock
pub fn is_simulated() -> bool {
    TIME_SOURCE
        .get_or_init(|| Arc::new(RealTimeSource))
        .is_simulated()
}

/// Parse a datetime string in the format "YYYY-MM-DD HH:MM:SS" in a specific timezone
pub fn parse_datetime_in_tz(s: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))
        .and_then(|naive| {
            tz.from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| format!("Invalid time in timezone {tz}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_source_advances_on_sleep() {
        let start = Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();
        let source = FixedTimeSource::new(start);
        source.sleep(StdDuration::from_secs(90));
        assert_eq!(source.now(), start + ChronoDuration::seconds(90));
        assert!(source.is_simulated());
    }

    #[test]
    fn test_parse_datetime_in_tz() {
        let parsed =
            parse_datetime_in_tz("2024-06-21 13:00:00", chrono_tz::Europe::London).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap());

        assert!(parse_datetime_in_tz("21/06/2024", chrono_tz::UTC).is_err());
    }
}
