//! Qibla direction and compass heading fusion.
//!
//! ## Module Structure
//!
//! - [`bearing`]: great-circle bearing/distance and circular angle helpers
//! - [`heading`]: heading formulas for each sensor source and the smoother
//! - [`session`]: source acquisition state machine and subscription teardown

pub mod bearing;
pub mod heading;
pub mod session;

pub use bearing::{
    BearingDistance, QIBLA_TARGET, bearing_and_distance, circular_difference, is_aligned,
    normalize_degrees, qibla_from,
};
pub use heading::{HeadingSample, HeadingSource, SmoothedHeading, Vector3};
pub use session::{
    FixedHeadingHub, HeadingSession, QiblaReading, SensorEvent, SensorHub, SessionState,
    Subscription,
};
