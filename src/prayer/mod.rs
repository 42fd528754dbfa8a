//! Prayer time engine.
//!
//! ## Module Structure
//!
//! - [`astronomy`]: solar coordinates, transit and hour angles
//! - [`method`]: madhab, high-latitude rules and the named presets
//! - [`registry`]: constructible presets and fallback selection
//! - [`times`]: raw daily instants for one parameter set
//! - [`calculator`]: derived times, user adjustments and the daily payload
//! - [`payload`]: serialized shapes and display formatting

pub mod astronomy;
pub mod calculator;
pub mod method;
pub mod payload;
pub mod registry;
pub mod times;

pub use calculator::{AdjustmentSet, PrayerCalculator, PrayerKind, PrayerRequest, adjust};
pub use method::{CalculationParameters, HighLatitudeRule, Madhab};
pub use payload::{DailyPrayerPayload, ErrorPayload, MethodResult, PrayerResponse};
pub use registry::{MethodRegistry, MethodSelection};
pub use times::PrayerTimes;
