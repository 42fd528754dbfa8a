//! Time-driven behaviour: the next prayer, the midnight rollover and the
//! day/night switch.
//!
//! ## Module Structure
//!
//! - [`next_event`]: next/previous event, progress and day boundaries
//! - [`day_night`]: light/dark decision from sunrise and sunset
//! - [`timers`]: one pending wake-up per purpose

pub mod day_night;
pub mod next_event;
pub mod timers;

pub use day_night::{ThemeBasis, ThemeDecision, ThemeVariant, decide_theme, decide_theme_or_retry};
pub use next_event::{
    DaySchedule, NextEventStatus, ScheduledEvent, UpcomingEvent, next_event,
    next_midnight_rollover, progress, tomorrow_morning,
};
pub use timers::{TimerPurpose, TimerQueue};
