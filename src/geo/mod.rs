//! Geographic primitives: coordinates, the standalone solar model, time zone
//! lookup and location acquisition.
//!
//! ## Module Structure
//!
//! - [`coordinate`]: validated latitude/longitude value type
//! - [`solar`]: low-order sunrise/sunset model used by the day/night switch
//! - [`timezone`]: IANA zone lookup for a coordinate
//! - [`location`]: device location collaborator with a bounded wait and fallback

pub mod coordinate;
pub mod location;
pub mod solar;
pub mod timezone;

pub use coordinate::GeoCoordinate;
pub use location::{LocationFix, LocationProvider, LocationResolver, LocationSource};
pub use solar::{SunTimes, sun_times, sun_times_local};
pub use timezone::{resolve_timezone, timezone_for_coordinate};

#[cfg(test)]
mod tests;
